use crate::constants;
use crate::error::{Error, Result};
use crate::initialization::{OutputConfig, SystemSummary, Topology};
use crate::interface::State;
use crate::output::write_data::{state_to_frame, write_restart, RestartOutput};
use crate::output::Reporter;
use chemfiles::Trajectory;
use itertools::Itertools;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Units of the state data records. `Md` is kJ/mol and nm, `Akma` is
/// kcal/mol and angstrom.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Md,
    Akma,
}

impl UnitSystem {
    fn energy(&self, kj_per_mol: f64) -> f64 {
        match self {
            UnitSystem::Md => kj_per_mol,
            UnitSystem::Akma => kj_per_mol * constants::KJ_TO_KCAL,
        }
    }

    fn volume(&self, nm3: f64) -> f64 {
        match self {
            UnitSystem::Md => nm3,
            UnitSystem::Akma => nm3 * constants::NM_TO_ANGSTROM.powi(3),
        }
    }

    fn energy_unit(&self) -> &'static str {
        match self {
            UnitSystem::Md => "kJ/mole",
            UnitSystem::Akma => "kcal/mole",
        }
    }

    fn volume_unit(&self) -> &'static str {
        match self {
            UnitSystem::Md => "nm^3",
            UnitSystem::Akma => "A^3",
        }
    }
}

/// Which columns a state data reporter writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateDataFields {
    pub step: bool,
    pub time: bool,
    pub potential_energy: bool,
    pub kinetic_energy: bool,
    pub total_energy: bool,
    pub temperature: bool,
    pub volume: bool,
    pub density: bool,
}

impl Default for StateDataFields {
    fn default() -> Self {
        StateDataFields {
            step: true,
            time: false,
            potential_energy: true,
            kinetic_energy: true,
            total_energy: false,
            temperature: true,
            volume: true,
            density: true,
        }
    }
}

/// Instantaneous temperature in K from the kinetic energy in kJ/mol.
pub fn temperature(kinetic_energy: f64, degrees_of_freedom: usize) -> f64 {
    if degrees_of_freedom == 0 {
        return 0.0;
    }
    2.0 * kinetic_energy / (degrees_of_freedom as f64 * constants::MOLAR_GAS_CONSTANT)
}

/// Density in g/mL from a mass in g/mol and a volume in nm^3.
pub fn density(total_mass: f64, volume: f64) -> f64 {
    total_mass / (constants::AVOGADRO * volume * constants::NM3_TO_ML)
}

/// Writes scalar observables as separated text records, one line per report,
/// preceded by a header line.
pub struct StateDataReporter<W: Write> {
    out: W,
    destination: String,
    interval: u64,
    units: UnitSystem,
    fields: StateDataFields,
    separator: String,
    wrote_header: bool,
}

impl<W: Write> StateDataReporter<W> {
    pub fn new(out: W, destination: impl Into<String>, interval: u64) -> Self {
        StateDataReporter {
            out,
            destination: destination.into(),
            interval,
            units: UnitSystem::Md,
            fields: StateDataFields::default(),
            separator: String::from(","),
            wrote_header: false,
        }
    }

    pub fn with_units(mut self, units: UnitSystem) -> Self {
        self.units = units;
        self
    }

    pub fn with_fields(mut self, fields: StateDataFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn header(&self) -> String {
        let energy: &str = self.units.energy_unit();
        let mut names: Vec<String> = Vec::new();
        if self.fields.step {
            names.push("\"Step\"".to_string());
        }
        if self.fields.time {
            names.push("\"Time (ps)\"".to_string());
        }
        if self.fields.potential_energy {
            names.push(format!("\"Potential Energy ({})\"", energy));
        }
        if self.fields.kinetic_energy {
            names.push(format!("\"Kinetic Energy ({})\"", energy));
        }
        if self.fields.total_energy {
            names.push(format!("\"Total Energy ({})\"", energy));
        }
        if self.fields.temperature {
            names.push("\"Temperature (K)\"".to_string());
        }
        if self.fields.volume {
            names.push(format!("\"Box Volume ({})\"", self.units.volume_unit()));
        }
        if self.fields.density {
            names.push("\"Density (g/mL)\"".to_string());
        }
        format!("#{}", names.iter().join(&self.separator))
    }

    fn record(&self, state: &State, system: &SystemSummary) -> String {
        let volume: f64 = state.cell.volume();
        let mut values: Vec<String> = Vec::new();
        if self.fields.step {
            values.push(state.step.to_string());
        }
        if self.fields.time {
            values.push(state.time.to_string());
        }
        if self.fields.potential_energy {
            values.push(self.units.energy(state.potential_energy).to_string());
        }
        if self.fields.kinetic_energy {
            values.push(self.units.energy(state.kinetic_energy).to_string());
        }
        if self.fields.total_energy {
            values.push(self.units.energy(state.total_energy()).to_string());
        }
        if self.fields.temperature {
            values.push(temperature(state.kinetic_energy, system.degrees_of_freedom).to_string());
        }
        if self.fields.volume {
            values.push(self.units.volume(volume).to_string());
        }
        if self.fields.density {
            values.push(density(system.total_mass, volume).to_string());
        }
        values.iter().join(&self.separator)
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{}", line).map_err(|e| Error::reporter(self.destination.as_str(), e))
    }
}

impl StateDataReporter<Box<dyn Write>> {
    pub fn stdout(interval: u64) -> Self {
        Self::new(Box::new(io::stdout()), "stdout", interval)
    }

    pub fn to_file(path: &Path, interval: u64) -> Result<Self> {
        let file: File =
            File::create(path).map_err(|e| Error::reporter(path.display().to_string(), e))?;
        Ok(Self::new(
            Box::new(BufWriter::new(file)),
            path.display().to_string(),
            interval,
        ))
    }
}

impl<W: Write> Reporter for StateDataReporter<W> {
    fn interval(&self) -> u64 {
        self.interval
    }

    fn destination(&self) -> String {
        self.destination.clone()
    }

    fn report(&mut self, state: &State, system: &SystemSummary) -> Result<()> {
        if !self.wrote_header {
            let header: String = self.header();
            self.write_line(&header)?;
            self.wrote_header = true;
        }
        let record: String = self.record(state, system);
        self.write_line(&record)
    }

    fn finalize(&mut self) -> Result<()> {
        self.out
            .flush()
            .map_err(|e| Error::reporter(self.destination.as_str(), e))
    }
}

/// Writes trajectory frames with chemfiles; the format follows the file
/// extension (.dcd, .xyz, .pdb, ...).
pub struct TrajectoryReporter {
    trajectory: Trajectory,
    path: PathBuf,
    interval: u64,
    names: Vec<String>,
}

impl TrajectoryReporter {
    pub fn new(path: &Path, interval: u64, topology: &Topology) -> Result<Self> {
        let trajectory: Trajectory = Trajectory::open(path, 'w')
            .map_err(|e| Error::reporter(path.display().to_string(), e))?;
        Ok(TrajectoryReporter {
            trajectory,
            path: path.to_path_buf(),
            interval,
            names: topology.atoms.iter().map(|atom| atom.name.clone()).collect(),
        })
    }
}

impl Reporter for TrajectoryReporter {
    fn interval(&self) -> u64 {
        self.interval
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }

    fn report(&mut self, state: &State, _system: &SystemSummary) -> Result<()> {
        let frame = state_to_frame(state, &self.names);
        self.trajectory
            .write(&frame)
            .map_err(|e| Error::reporter(self.path.display().to_string(), e))
    }
}

/// Keeps a YAML snapshot of the latest qualifying step.
pub struct RestartReporter {
    path: PathBuf,
    interval: u64,
}

impl RestartReporter {
    pub fn new(path: &Path, interval: u64) -> Self {
        RestartReporter {
            path: path.to_path_buf(),
            interval,
        }
    }
}

impl Reporter for RestartReporter {
    fn interval(&self) -> u64 {
        self.interval
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }

    fn report(&mut self, state: &State, _system: &SystemSummary) -> Result<()> {
        write_restart(&self.path, &RestartOutput::new(state))
    }
}

/// Create the reporters enabled in the output configuration.
pub fn build_reporters(config: &OutputConfig, topology: &Topology) -> Result<Vec<Box<dyn Reporter>>> {
    let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();
    if config.print_state_data {
        let reporter = if config.state_data_destination == "stdout" {
            StateDataReporter::stdout(config.state_data_interval)
        } else {
            StateDataReporter::to_file(
                Path::new(&config.state_data_destination),
                config.state_data_interval,
            )?
        };
        reporters.push(Box::new(reporter.with_units(config.units)));
    }
    if config.print_trajectory {
        reporters.push(Box::new(TrajectoryReporter::new(
            &config.trajectory_file,
            config.trajectory_interval,
            topology,
        )?));
    }
    if config.print_restart {
        reporters.push(Box::new(RestartReporter::new(
            &config.restart_file,
            config.restart_interval,
        )));
    }
    info!("{} reporters configured", reporters.len());
    Ok(reporters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initialization::{AtomRecord, CellDimensions, CoordinateSet};
    use approx::assert_relative_eq;

    fn state(step: u64) -> State {
        State {
            step,
            time: step as f64 * 0.002,
            positions: CoordinateSet::from(vec![[0.0, 0.0, 0.0], [0.1, 0.0, 0.0]]),
            potential_energy: -41.84,
            kinetic_energy: 4.184,
            cell: CellDimensions([2.0, 2.0, 2.0]),
        }
    }

    fn system() -> SystemSummary {
        SystemSummary {
            particle_count: 2,
            degrees_of_freedom: 3,
            total_mass: 36.0,
        }
    }

    #[test]
    fn akma_records() {
        let mut reporter = StateDataReporter::new(Vec::new(), "buffer", 100)
            .with_units(UnitSystem::Akma)
            .with_fields(StateDataFields {
                step: true,
                time: false,
                potential_energy: true,
                kinetic_energy: true,
                total_energy: false,
                temperature: false,
                volume: true,
                density: false,
            });
        reporter.report(&state(100), &system()).unwrap();
        reporter.report(&state(200), &system()).unwrap();
        reporter.finalize().unwrap();
        let text: String = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "#\"Step\",\"Potential Energy (kcal/mole)\",\"Kinetic Energy (kcal/mole)\",\"Box Volume (A^3)\""
        );
        let values: Vec<f64> = lines[2].split(',').map(|v| v.parse().unwrap()).collect();
        assert_relative_eq!(values[0], 200.0);
        assert_relative_eq!(values[1], -10.0, epsilon = 1e-9);
        assert_relative_eq!(values[2], 1.0, epsilon = 1e-9);
        assert_relative_eq!(values[3], 8000.0, epsilon = 1e-6);
    }

    #[test]
    fn temperature_and_density() {
        // 2 KE / (N_dof R)
        assert_relative_eq!(
            temperature(4.184, 3),
            2.0 * 4.184 / (3.0 * 0.008_314_462_618),
            epsilon = 1e-9
        );
        assert_eq!(temperature(1.0, 0), 0.0);
        // 18 g/mol of water in 0.0299 nm^3 is about 1 g/mL
        assert_relative_eq!(density(18.015, 0.029_915), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn tab_separated_md_units() {
        let mut reporter = StateDataReporter::new(Vec::new(), "buffer", 10)
            .with_separator("\t")
            .with_fields(StateDataFields {
                step: true,
                time: true,
                potential_energy: false,
                kinetic_energy: false,
                total_energy: true,
                temperature: false,
                volume: false,
                density: false,
            });
        reporter.report(&state(10), &system()).unwrap();
        let text: String = String::from_utf8(reporter.into_inner()).unwrap();
        let record: Vec<&str> = text.lines().nth(1).unwrap().split('\t').collect();
        assert_eq!(record[0], "10");
        assert_relative_eq!(record[1].parse::<f64>().unwrap(), 0.02, epsilon = 1e-12);
        assert_relative_eq!(record[2].parse::<f64>().unwrap(), -37.656, epsilon = 1e-9);
    }

    #[test]
    fn restart_reporter_keeps_latest_step() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("dynamics_restart.yaml");
        let mut reporter = RestartReporter::new(&path, 50);
        reporter.report(&state(50), &system()).unwrap();
        reporter.report(&state(100), &system()).unwrap();
        let restart = crate::output::read_restart(&path).unwrap();
        assert_eq!(restart.step, 100);
    }

    #[test]
    fn unwritable_state_data_file() {
        let result = StateDataReporter::to_file(Path::new("/nonexistent/dir/state.csv"), 10);
        assert!(matches!(result, Err(Error::Reporter { .. })));
    }

    #[test]
    fn configured_reporters() {
        let dir = tempfile::tempdir().unwrap();
        let config: OutputConfig = OutputConfig {
            state_data_destination: dir.path().join("state.csv").display().to_string(),
            trajectory_file: dir.path().join("traj.xyz"),
            print_restart: true,
            restart_file: dir.path().join("restart.yaml"),
            ..OutputConfig::default()
        };
        let topology: Topology = Topology {
            atoms: vec![AtomRecord::new("O", Some(8)), AtomRecord::new("H", Some(1))],
            bonds: vec![[0, 1]],
        };
        let reporters = build_reporters(&config, &topology).unwrap();
        assert_eq!(reporters.len(), 3);
        assert!(reporters.iter().all(|r| r.interval() == 100));
        assert!(reporters[1].destination().ends_with("traj.xyz"));
    }
}
