use crate::error::Result;
use crate::initialization::SystemSummary;
use crate::interface::State;

pub use reporters::*;
pub use write_data::*;

pub mod reporters;
pub mod write_data;

/// Periodic observer of a running simulation.
pub trait Reporter {
    /// Report every `interval` steps.
    fn interval(&self) -> u64;

    /// Where the records go, for log and error messages.
    fn destination(&self) -> String;

    fn report(&mut self, state: &State, system: &SystemSummary) -> Result<()>;

    /// Called once after the last step.
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}
