use crate::constants;
use crate::error::{Error, Result};
use crate::initialization::CellDimensions;
use crate::interface::State;
use chemfiles::{Atom, Frame, UnitCell};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Snapshot written by the restart reporter, positions in nm.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RestartOutput {
    pub step: u64,
    pub time: f64,
    pub cell: CellDimensions,
    pub positions: Array2<f64>,
}

impl RestartOutput {
    pub fn new(state: &State) -> RestartOutput {
        RestartOutput {
            step: state.step,
            time: state.time,
            cell: state.cell,
            positions: state.positions.view().to_owned(),
        }
    }
}

/// Overwrite the restart file with the given snapshot.
pub fn write_restart(path: &Path, restart: &RestartOutput) -> Result<()> {
    let destination = || path.display().to_string();
    let restart: String =
        serde_yaml::to_string(restart).map_err(|e| Error::reporter(destination(), e))?;
    fs::write(path, restart).map_err(|e| Error::reporter(destination(), e))
}

pub fn read_restart(path: &Path) -> Result<RestartOutput> {
    let destination = || path.display().to_string();
    let restart_string: String =
        fs::read_to_string(path).map_err(|e| Error::reporter(destination(), e))?;
    serde_yaml::from_str(&restart_string).map_err(|e| Error::reporter(destination(), e))
}

/// Build a chemfiles [Frame](chemfiles::Frame) in angstrom from a state.
/// Atoms without a name in `names` are called "X".
pub fn state_to_frame(state: &State, names: &[String]) -> Frame {
    let mut frame: Frame = Frame::new();
    for (index, position) in state.positions.iter().enumerate() {
        let name: &str = names.get(index).map_or("X", |name| name.as_str());
        frame.add_atom(
            &Atom::new(name),
            [
                position[0] * constants::NM_TO_ANGSTROM,
                position[1] * constants::NM_TO_ANGSTROM,
                position[2] * constants::NM_TO_ANGSTROM,
            ],
            None,
        );
    }
    let cell: CellDimensions = state.cell.scaled(constants::NM_TO_ANGSTROM);
    frame.set_cell(&UnitCell::new(cell.lengths()));
    frame.set_step(state.step as usize);
    frame
}
