use crate::constants;
use crate::defaults::*;
use crate::dynamics::LangevinIntegrator;
use crate::error::{Error, Result};
use crate::initialization::geometry::CellDimensions;
use crate::initialization::system::{Constraints, NonbondedMethod, SystemOptions};
use crate::interface::{Platform, PlatformSpec, Precision};
use crate::output::UnitSystem;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_structure_format() -> StructureFormat {
    match STRUCTURE_FORMAT {
        "tinker" => StructureFormat::Tinker,
        _ => StructureFormat::Chemfiles,
    }
}
fn default_topology() -> PathBuf {
    PathBuf::from(TOPOLOGY_FILE)
}
fn default_coordinates() -> PathBuf {
    PathBuf::from(COORDINATE_FILE)
}
fn default_parameters() -> Vec<PathBuf> {
    PARAMETER_FILES.iter().map(PathBuf::from).collect()
}
fn default_nonbonded_method() -> NonbondedMethod {
    NonbondedMethod::PME
}
fn default_cutoff() -> f64 {
    CUTOFF
}
fn default_constraints() -> Constraints {
    Constraints::HBonds
}
fn default_temperature() -> f64 {
    TEMPERATURE
}
fn default_friction() -> f64 {
    FRICTION
}
fn default_stepsize() -> f64 {
    STEPSIZE
}
fn default_platform() -> Platform {
    PLATFORM.parse().unwrap_or(Platform::Reference)
}
fn default_precision() -> Precision {
    PRECISION.parse().unwrap_or(Precision::Double)
}
fn default_minimization_steps() -> usize {
    MINIMIZATION_STEPS
}
fn default_minimization_tolerance() -> f64 {
    MINIMIZATION_TOLERANCE
}
fn default_nstep() -> u64 {
    NSTEP
}
fn default_report_interval() -> u64 {
    REPORT_INTERVAL
}
fn default_true() -> bool {
    true
}
fn default_print_restart() -> bool {
    PRINT_RESTART
}
fn default_state_data_destination() -> String {
    String::from(STATE_DATA_DESTINATION)
}
fn default_units() -> UnitSystem {
    UnitSystem::Akma
}
fn default_trajectory_file() -> PathBuf {
    PathBuf::from(TRAJECTORY_FILE)
}
fn default_restart_file() -> PathBuf {
    PathBuf::from(RESTART_FILE_NAME)
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StructureFormat {
    Chemfiles,
    Tinker,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StructureConfig {
    #[serde(default = "default_structure_format")]
    pub format: StructureFormat,
    #[serde(default = "default_topology")]
    pub topology: PathBuf,
    #[serde(default = "default_coordinates")]
    pub coordinates: PathBuf,
    #[serde(default = "default_parameters")]
    pub parameters: Vec<PathBuf>,
}

impl Default for StructureConfig {
    fn default() -> Self {
        StructureConfig {
            format: default_structure_format(),
            topology: default_topology(),
            coordinates: default_coordinates(),
            parameters: default_parameters(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SystemConfig {
    #[serde(default = "default_nonbonded_method")]
    pub nonbonded_method: NonbondedMethod,
    // angstrom
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,
    #[serde(default = "default_constraints")]
    pub constraints: Constraints,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            nonbonded_method: default_nonbonded_method(),
            cutoff: default_cutoff(),
            constraints: default_constraints(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IntegratorConfig {
    // kelvin
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    // 1/ps
    #[serde(default = "default_friction")]
    pub friction: f64,
    // fs
    #[serde(default = "default_stepsize")]
    pub stepsize: f64,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        IntegratorConfig {
            temperature: default_temperature(),
            friction: default_friction(),
            stepsize: default_stepsize(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlatformConfig {
    #[serde(default = "default_platform")]
    pub name: Platform,
    #[serde(default = "default_precision")]
    pub precision: Precision,
    #[serde(default)]
    pub device_index: Option<usize>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        PlatformConfig {
            name: default_platform(),
            precision: default_precision(),
            device_index: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RunConfig {
    #[serde(default = "default_minimization_steps")]
    pub minimization_steps: usize,
    #[serde(default = "default_minimization_tolerance")]
    pub minimization_tolerance: f64,
    #[serde(default = "default_nstep")]
    pub nstep: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            minimization_steps: default_minimization_steps(),
            minimization_tolerance: default_minimization_tolerance(),
            nstep: default_nstep(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub print_state_data: bool,
    #[serde(default = "default_report_interval")]
    pub state_data_interval: u64,
    #[serde(default = "default_state_data_destination")]
    pub state_data_destination: String,
    #[serde(default = "default_units")]
    pub units: UnitSystem,
    #[serde(default = "default_true")]
    pub print_trajectory: bool,
    #[serde(default = "default_report_interval")]
    pub trajectory_interval: u64,
    #[serde(default = "default_trajectory_file")]
    pub trajectory_file: PathBuf,
    #[serde(default = "default_print_restart")]
    pub print_restart: bool,
    #[serde(default = "default_report_interval")]
    pub restart_interval: u64,
    #[serde(default = "default_restart_file")]
    pub restart_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            print_state_data: true,
            state_data_interval: default_report_interval(),
            state_data_destination: default_state_data_destination(),
            units: default_units(),
            print_trajectory: true,
            trajectory_interval: default_report_interval(),
            trajectory_file: default_trajectory_file(),
            print_restart: default_print_restart(),
            restart_interval: default_report_interval(),
            restart_file: default_restart_file(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SimulationConfig {
    #[serde(default)]
    pub structure: StructureConfig,
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub integrator: IntegratorConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl SimulationConfig {
    pub fn from_str(config_string: &str) -> Result<Self> {
        toml::from_str(config_string).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let config_string: String = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_str(&config_string)
    }

    /// Read the configuration file. If it does not exist, the defaults are
    /// used and written to `path` so that the user can see every option.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::from_path(path);
        }
        let config: Self = Self::default();
        fs::write(path, config.to_toml()?)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!("wrote default configuration to {}", path.display());
        Ok(config)
    }

    pub fn system_options(&self, cell: CellDimensions) -> SystemOptions {
        SystemOptions {
            nonbonded_method: self.system.nonbonded_method,
            cutoff: self.system.cutoff * constants::ANGSTROM_TO_NM,
            constraints: self.system.constraints,
            cell,
        }
    }

    pub fn integrator(&self) -> LangevinIntegrator {
        LangevinIntegrator::new(
            self.integrator.temperature,
            self.integrator.friction,
            self.integrator.stepsize * constants::FS_TO_PS,
        )
    }

    pub fn platform_spec(&self) -> PlatformSpec {
        PlatformSpec {
            platform: self.platform.name,
            precision: self.platform.precision,
            device_index: self.platform.device_index,
        }
    }
}
