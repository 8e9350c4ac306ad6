use crate::dynamics::LangevinIntegrator;
use crate::error::{EngineError, LoadError};
use crate::initialization::{
    CellDimensions, CoordinateSet, ParameterSet, SimulatedSystem, SystemOptions, Topology,
};
use std::path::Path;

pub use platform::*;

pub mod platform;

/// Reads the inputs of a run: topology, starting coordinates and force-field
/// parameters.
pub trait StructureLoader {
    fn load_topology(&self, path: &Path) -> Result<Topology, LoadError>;

    /// Positions in nm, ordered like the particles of the topology.
    fn load_coordinates(&self, path: &Path) -> Result<CoordinateSet, LoadError>;

    fn load_parameters(&self, paths: &[&Path]) -> Result<ParameterSet, LoadError>;
}

/// Snapshot of a simulation context, in nm, ps and kJ/mol.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub step: u64,
    pub time: f64,
    pub positions: CoordinateSet,
    pub potential_energy: f64,
    pub kinetic_energy: f64,
    pub cell: CellDimensions,
}

impl State {
    pub fn total_energy(&self) -> f64 {
        self.potential_energy + self.kinetic_energy
    }
}

/// The physics engine that owns force evaluation and time integration.
pub trait Engine {
    type System: SimulatedSystem;
    type Context: Context;

    fn build_system(
        &self,
        topology: &Topology,
        parameters: &ParameterSet,
        options: &SystemOptions,
    ) -> Result<Self::System, EngineError>;

    fn create_context(
        &self,
        system: Self::System,
        integrator: &LangevinIntegrator,
        platform: &PlatformSpec,
    ) -> Result<Self::Context, EngineError>;
}

/// An executable simulation bound to one system and integrator.
pub trait Context {
    fn particle_count(&self) -> usize;

    fn set_positions(&mut self, positions: &CoordinateSet) -> Result<(), EngineError>;

    /// Local energy minimization. `max_iterations == 0` means no cap.
    fn minimize(&mut self, tolerance: f64, max_iterations: usize) -> Result<(), EngineError>;

    fn step(&mut self, steps: u64) -> Result<(), EngineError>;

    fn state(&self) -> Result<State, EngineError>;
}
