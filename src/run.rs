use crate::dynamics::{LangevinIntegrator, Simulation};
use crate::error::{Error, Result};
use crate::initialization::{
    bounding_box, BoundingBox, CellDimensions, CoordinateSet, ParameterSet, SimulationConfig,
    SystemOptions, Topology,
};
use crate::interface::{Engine, State, StructureLoader};
use crate::output::Reporter;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// What a completed run hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub particle_count: usize,
    pub cell: CellDimensions,
    pub steps: u64,
    /// Simulated time in ps.
    pub time: f64,
    pub final_state: State,
}

/// Load the structure, derive the cell from the coordinates and run
/// minimization followed by dynamics on `engine`.
pub fn run_simulation<L, E>(
    loader: &L,
    engine: &E,
    config: &SimulationConfig,
    reporters: Vec<Box<dyn Reporter>>,
) -> Result<RunSummary>
where
    L: StructureLoader,
    E: Engine,
{
    info!("Loading files...");
    let parameter_paths: Vec<&Path> = config
        .structure
        .parameters
        .iter()
        .map(PathBuf::as_path)
        .collect();
    let parameters: ParameterSet = loader.load_parameters(&parameter_paths)?;
    let topology: Topology = loader.load_topology(&config.structure.topology)?;
    let coordinates: CoordinateSet = loader.load_coordinates(&config.structure.coordinates)?;

    // the cell is needed before the system can be created
    let bounds: BoundingBox = bounding_box(&coordinates)?;
    let cell: CellDimensions = bounds.cell_dimensions();
    info!(
        "Cell dimensions: {:.4} x {:.4} x {:.4} nm",
        cell.0[0], cell.0[1], cell.0[2]
    );
    if cell.is_degenerate() {
        warn!("the cell has a zero length along at least one axis");
    }
    if coordinates.len() != topology.n_atoms() {
        return Err(Error::ConfigurationMismatch(format!(
            "{} coordinates given for {} atoms in the topology",
            coordinates.len(),
            topology.n_atoms()
        )));
    }

    info!("Creating System");
    let options: SystemOptions = config.system_options(cell);
    let system: E::System = engine.build_system(&topology, &parameters, &options)?;
    let integrator: LangevinIntegrator = config.integrator();

    let mut simulation: Simulation<E> = Simulation::new(engine);
    simulation.bind(system, &integrator, &config.platform_spec())?;
    simulation.set_positions(&coordinates)?;
    simulation.minimize(
        config.run.minimization_tolerance,
        config.run.minimization_steps,
    )?;
    simulation.attach_reporters(reporters)?;
    simulation.step(config.run.nstep)?;

    let final_state: State = simulation.current_state()?;
    Ok(RunSummary {
        particle_count: simulation.summary().particle_count,
        cell,
        steps: simulation.current_step(),
        time: simulation.time(),
        final_state,
    })
}
