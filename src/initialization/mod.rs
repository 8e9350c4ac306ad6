pub use geometry::*;
pub use io::*;
pub use structure::*;
pub use system::*;
pub use tinker::{DynFile, KeywordControlFile, TinkerLoader, XyzFile};

pub mod geometry;
pub mod io;
pub mod structure;
pub mod system;
pub mod tinker;
