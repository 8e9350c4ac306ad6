use crate::constants;
use crate::initialization::geometry::CellDimensions;
use hashbrown::HashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub name: String,
    pub atomic_number: Option<u8>,
    // mass in g/mol
    pub mass: f64,
}

impl AtomRecord {
    pub fn new(name: &str, atomic_number: Option<u8>) -> Self {
        let mass: f64 = atomic_number
            .and_then(|num| constants::ATOMIC_MASSES.get(&num).copied())
            .unwrap_or(0.0);
        AtomRecord {
            name: name.to_string(),
            atomic_number,
            mass,
        }
    }

    pub fn is_hydrogen(&self) -> bool {
        self.atomic_number == Some(1)
    }

    pub fn is_oxygen(&self) -> bool {
        self.atomic_number == Some(8)
    }
}

/// Particles and their bonded connectivity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    pub atoms: Vec<AtomRecord>,
    pub bonds: Vec<[usize; 2]>,
}

impl Topology {
    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn total_mass(&self) -> f64 {
        self.atoms.iter().map(|atom| atom.mass).sum()
    }

    fn neighbours(&self) -> Vec<Vec<usize>> {
        let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); self.n_atoms()];
        for &[i, j] in self.bonds.iter() {
            neighbours[i].push(j);
            neighbours[j].push(i);
        }
        neighbours
    }

    /// Number of distance constraints the given policy places on this topology.
    pub fn constraint_count(&self, constraints: Constraints) -> usize {
        let h_bonds: usize = self
            .bonds
            .iter()
            .filter(|[i, j]| self.atoms[*i].is_hydrogen() || self.atoms[*j].is_hydrogen())
            .count();
        match constraints {
            Constraints::None => 0,
            Constraints::HBonds => h_bonds,
            Constraints::AllBonds => self.bonds.len(),
            Constraints::HAngles => {
                // all bonds plus H-X-H and H-O-X angles
                let angles: usize = self
                    .neighbours()
                    .iter()
                    .enumerate()
                    .map(|(center, bonded)| {
                        bonded
                            .iter()
                            .tuple_combinations()
                            .filter(|(a, b)| {
                                let (a, b) = (&self.atoms[**a], &self.atoms[**b]);
                                (a.is_hydrogen() && b.is_hydrogen())
                                    || (self.atoms[center].is_oxygen()
                                        && (a.is_hydrogen() || b.is_hydrogen()))
                            })
                            .count()
                    })
                    .sum();
                self.bonds.len() + angles
            }
        }
    }

    /// Degrees of freedom left after constraints and centre-of-mass motion removal.
    pub fn degrees_of_freedom(&self, constraints: Constraints) -> usize {
        (3 * self.n_atoms()).saturating_sub(self.constraint_count(constraints) + 3)
    }
}

/// One parameter file split into its keyword sections (BONDS, ANGLES, ...).
#[derive(Debug, Clone, Default)]
pub struct ParameterFile {
    pub path: PathBuf,
    pub sections: HashMap<String, Vec<String>>,
}

impl ParameterFile {
    pub fn entry_count(&self) -> usize {
        self.sections.values().map(|lines| lines.len()).sum()
    }
}

/// Force-field parameter sources handed to the engine's system builder.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    pub files: Vec<ParameterFile>,
    pub keywords: HashMap<String, String>,
}

impl ParameterSet {
    pub fn section(&self, name: &str) -> impl Iterator<Item = &String> + '_ {
        let name: String = name.to_uppercase();
        self.files
            .iter()
            .filter_map(move |file| file.sections.get(&name))
            .flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonbondedMethod {
    NoCutoff,
    CutoffNonPeriodic,
    CutoffPeriodic,
    Ewald,
    PME,
}

impl NonbondedMethod {
    pub fn is_periodic(&self) -> bool {
        !matches!(
            self,
            NonbondedMethod::NoCutoff | NonbondedMethod::CutoffNonPeriodic
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraints {
    None,
    HBonds,
    AllBonds,
    HAngles,
}

impl fmt::Display for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Numerical options for building a system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemOptions {
    pub nonbonded_method: NonbondedMethod,
    // cutoff in nm
    pub cutoff: f64,
    pub constraints: Constraints,
    // orthorhombic cell edges in nm
    pub cell: CellDimensions,
}

/// What the runner and reporters need to know about a built system.
pub trait SimulatedSystem {
    fn particle_count(&self) -> usize;
    fn degrees_of_freedom(&self) -> usize;
    // total mass in g/mol
    fn total_mass(&self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SystemSummary {
    pub particle_count: usize,
    pub degrees_of_freedom: usize,
    pub total_mass: f64,
}

impl SystemSummary {
    pub fn of<S: SimulatedSystem>(system: &S) -> Self {
        SystemSummary {
            particle_count: system.particle_count(),
            degrees_of_freedom: system.degrees_of_freedom(),
            total_mass: system.total_mass(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // O-H-H water plus a bonded C-H pair
    fn water_and_ch() -> Topology {
        Topology {
            atoms: vec![
                AtomRecord::new("OW", Some(8)),
                AtomRecord::new("HW1", Some(1)),
                AtomRecord::new("HW2", Some(1)),
                AtomRecord::new("C", Some(6)),
                AtomRecord::new("H", Some(1)),
                AtomRecord::new("C2", Some(6)),
            ],
            bonds: vec![[0, 1], [0, 2], [3, 4], [3, 5]],
        }
    }

    #[test]
    fn constraint_counts() {
        let topology: Topology = water_and_ch();
        assert_eq!(topology.constraint_count(Constraints::None), 0);
        assert_eq!(topology.constraint_count(Constraints::HBonds), 3);
        assert_eq!(topology.constraint_count(Constraints::AllBonds), 4);
        // H-O-H on the water, nothing on the carbon (H-C-C is not constrained)
        assert_eq!(topology.constraint_count(Constraints::HAngles), 5);
    }

    #[test]
    fn degrees_of_freedom_and_mass() {
        let topology: Topology = water_and_ch();
        assert_eq!(topology.degrees_of_freedom(Constraints::HBonds), 18 - 3 - 3);
        assert_relative_eq!(
            topology.total_mass(),
            15.999 + 3.0 * 1.008 + 2.0 * 12.011,
            epsilon = 1e-9
        );
    }

    #[test]
    fn unknown_element_has_no_mass() {
        let atom: AtomRecord = AtomRecord::new("DUM", None);
        assert_eq!(atom.mass, 0.0);
        assert!(!atom.is_hydrogen());
    }

    #[test]
    fn periodic_methods() {
        assert!(NonbondedMethod::PME.is_periodic());
        assert!(NonbondedMethod::CutoffPeriodic.is_periodic());
        assert!(!NonbondedMethod::NoCutoff.is_periodic());
    }
}
