pub mod constants;
pub mod defaults;
pub mod dynamics;
pub mod error;
pub mod initialization;
pub mod interface;
pub mod output;
pub mod run;

pub use error::{EngineError, Error, LoadError, Result};
pub use run::{run_simulation, RunSummary};
