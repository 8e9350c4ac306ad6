pub use integrator::*;
pub use simulation::*;

pub mod integrator;
pub mod simulation;
