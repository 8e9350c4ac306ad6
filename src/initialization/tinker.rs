//! Readers for TINKER keyword control (.key), coordinate (.xyz) and
//! restart (.dyn) files.

use crate::constants;
use crate::error::LoadError;
use crate::initialization::geometry::CoordinateSet;
use crate::initialization::structure::angstrom_rows_to_coordinates;
use crate::initialization::system::{AtomRecord, ParameterFile, ParameterSet, Topology};
use crate::interface::StructureLoader;
use hashbrown::HashMap;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

fn read_to_string(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a Fortran-style real, accepting `D` as the exponent marker.
fn parse_real(word: &str) -> Option<f64> {
    word.to_uppercase().replace('D', "E").parse::<f64>().ok()
}

/// The keywords of a TINKER control file that matter for setting up a run.
/// Every other line is treated as a comment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordControlFile {
    pub parameters: Option<String>,
    pub a_axis: Option<f64>,
    pub b_axis: Option<f64>,
    pub c_axis: Option<f64>,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
}

impl KeywordControlFile {
    pub fn parse(content: &str) -> Result<Self, LoadError> {
        let mut keys: KeywordControlFile = KeywordControlFile::default();
        for line in content.lines() {
            let line: &str = line.trim();
            let word: &str = match line.split_whitespace().next() {
                Some(word) => word,
                None => continue,
            };
            let key: String = word.to_uppercase();
            let value: &str = line[word.len()..].trim();
            let real = |value: &str| {
                value.parse::<f64>().map_err(|_| {
                    LoadError::TinkerKeyFile(format!(
                        "could not convert the value of {} ('{}') into a real number",
                        key, value
                    ))
                })
            };
            match key.as_str() {
                "PARAMETERS" => keys.parameters = Some(value.to_string()),
                "A-AXIS" => keys.a_axis = Some(real(value)?),
                "B-AXIS" => keys.b_axis = Some(real(value)?),
                "C-AXIS" => keys.c_axis = Some(real(value)?),
                "ALPHA" => keys.alpha = Some(real(value)?),
                "BETA" => keys.beta = Some(real(value)?),
                "GAMMA" => keys.gamma = Some(real(value)?),
                _ => {}
            }
        }
        Ok(keys)
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        Self::parse(&read_to_string(path)?)
    }

    /// Keywords that were set, rendered as strings.
    pub fn keywords(&self) -> HashMap<String, String> {
        let mut keywords: HashMap<String, String> = HashMap::new();
        if let Some(parameters) = &self.parameters {
            keywords.insert("PARAMETERS".to_string(), parameters.clone());
        }
        let reals = [
            ("A-AXIS", self.a_axis),
            ("B-AXIS", self.b_axis),
            ("C-AXIS", self.c_axis),
            ("ALPHA", self.alpha),
            ("BETA", self.beta),
            ("GAMMA", self.gamma),
        ];
        for (key, value) in reals.iter() {
            if let Some(value) = value {
                keywords.insert(key.to_string(), value.to_string());
            }
        }
        keywords
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct XyzAtom {
    pub name: String,
    // angstrom
    pub position: [f64; 3],
    pub atom_type: i64,
    // 1-based indices
    pub bonded_partners: Vec<usize>,
}

/// A TINKER XYZ file: an atom count line followed by one line per atom,
/// `index name x y z type partner...`.
#[derive(Debug, Clone, PartialEq)]
pub struct XyzFile {
    pub natom: usize,
    pub atoms: Vec<XyzAtom>,
}

impl XyzFile {
    pub fn parse(path: &Path, content: &str) -> Result<Self, LoadError> {
        let mut lines = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());
        let natom: usize = match lines.next() {
            Some((index, line)) => line
                .split_whitespace()
                .next()
                .and_then(|word| word.parse::<usize>().ok())
                .ok_or_else(|| LoadError::parse(path, index + 1, "expected the number of atoms"))?,
            None => return Err(LoadError::parse(path, 1, "empty file")),
        };

        let mut atoms: Vec<XyzAtom> = Vec::with_capacity(natom);
        for (index, line) in lines.take(natom) {
            let words: Vec<&str> = line.split_whitespace().collect();
            if words.len() < 6 {
                return Err(LoadError::parse(path, index + 1, "too few columns in atom line"));
            }
            let malformed = || LoadError::parse(path, index + 1, "malformed atom line");
            let mut position: [f64; 3] = [0.0; 3];
            for axis in 0..3 {
                position[axis] = parse_real(words[2 + axis]).ok_or_else(malformed)?;
            }
            let atom_type: i64 = words[5].parse().map_err(|_| malformed())?;
            let bonded_partners: Vec<usize> = words[6..]
                .iter()
                .map(|word| word.parse::<usize>().map_err(|_| malformed()))
                .collect::<Result<_, _>>()?;
            atoms.push(XyzAtom {
                name: words[1].to_string(),
                position,
                atom_type,
                bonded_partners,
            });
        }
        if atoms.len() != natom {
            return Err(LoadError::parse(
                path,
                0,
                format!("expected {} atoms, found {}", natom, atoms.len()),
            ));
        }
        Ok(XyzFile { natom, atoms })
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        Self::parse(path, &read_to_string(path)?)
    }

    pub fn to_topology(&self, path: &Path) -> Result<Topology, LoadError> {
        let atoms: Vec<AtomRecord> = self
            .atoms
            .iter()
            .map(|atom| AtomRecord::new(&atom.name, element_from_name(&atom.name)))
            .collect();
        let mut bonds: Vec<[usize; 2]> = Vec::new();
        for (i, atom) in self.atoms.iter().enumerate() {
            for &partner in atom.bonded_partners.iter() {
                if partner == 0 || partner > self.natom {
                    return Err(LoadError::parse(
                        path,
                        i + 2,
                        format!("bonded partner {} is out of range", partner),
                    ));
                }
                // every bond is listed on both atoms
                if i < partner - 1 {
                    bonds.push([i, partner - 1]);
                }
            }
        }
        Ok(Topology { atoms, bonds })
    }

    pub fn positions(&self) -> Vec<[f64; 3]> {
        self.atoms.iter().map(|atom| atom.position).collect()
    }
}

/// Guess the element from a TINKER atom name: a two-letter symbol when the
/// second letter is lower case (`Cl`, `Na`), the first letter otherwise.
pub fn element_from_name(name: &str) -> Option<u8> {
    let letters: Vec<char> = name.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    if letters.len() >= 2 && letters[1].is_ascii_lowercase() {
        let symbol: String = letters[..2].iter().collect();
        if let Some(number) = constants::atomic_number_from_symbol(&symbol) {
            return Some(number);
        }
    }
    letters
        .first()
        .and_then(|c| constants::atomic_number_from_symbol(&c.to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum DynVelocities {
    Atomic {
        velocities: Vec<[f64; 3]>,
        accelerations: Vec<[f64; 3]>,
        old_accelerations: Vec<[f64; 3]>,
    },
    RigidBody {
        translational_velocities: Vec<[f64; 3]>,
        angular_velocities: Vec<[f64; 3]>,
        angular_momenta: Vec<[f64; 3]>,
    },
}

/// A TINKER .dyn restart file.
#[derive(Debug, Clone, PartialEq)]
pub struct DynFile {
    pub natom: usize,
    pub title: String,
    // a, b, c, alpha, beta, gamma
    pub cell: [f64; 6],
    // angstrom
    pub positions: Vec<[f64; 3]>,
    pub velocities: DynVelocities,
}

struct DynReader<'a> {
    lines: std::str::Lines<'a>,
}

impl<'a> DynReader<'a> {
    fn next_line(&mut self) -> Result<&'a str, LoadError> {
        self.lines
            .next()
            .ok_or_else(|| LoadError::TinkerDynFile("unexpected end of file".to_string()))
    }

    fn expect_header(&mut self, header: &str, missing: &str) -> Result<(), LoadError> {
        if self.next_line()?.trim() != header {
            return Err(LoadError::TinkerDynFile(missing.to_string()));
        }
        Ok(())
    }

    fn triple(&mut self) -> Result<[f64; 3], LoadError> {
        let words: Vec<String> = self
            .next_line()?
            .split_whitespace()
            .map(|word| word.to_string())
            .collect();
        let value = |i: usize| {
            words.get(i).and_then(|word| parse_real(word)).ok_or_else(|| {
                LoadError::TinkerDynFile("could not parse values from dyn file".to_string())
            })
        };
        Ok([value(0)?, value(1)?, value(2)?])
    }

    fn section(&mut self, natom: usize) -> Result<Vec<[f64; 3]>, LoadError> {
        (0..natom).map(|_| self.triple()).collect()
    }
}

impl DynFile {
    pub fn parse(content: &str) -> Result<Self, LoadError> {
        let mut reader: DynReader = DynReader {
            lines: content.lines(),
        };
        reader.expect_header(
            "Number of Atoms and Title :",
            "not a recognized TINKER .dyn file",
        )?;
        let line: &str = reader.next_line()?;
        // atom count in the first 8 columns, title after it
        let split: usize = line.char_indices().nth(8).map_or(line.len(), |(i, _)| i);
        let natom: usize = line[..split].trim().parse().map_err(|_| {
            LoadError::TinkerDynFile("could not read the number of atoms".to_string())
        })?;
        let title: String = line[split..].trim().to_string();

        reader.expect_header("Periodic Box Dimensions :", "no periodic box dimension line")?;
        let lengths: [f64; 3] = reader.triple()?;
        let angles: [f64; 3] = reader.triple()?;
        let cell: [f64; 6] = [
            lengths[0], lengths[1], lengths[2], angles[0], angles[1], angles[2],
        ];

        reader.expect_header("Current Atomic Positions :", "no atomic positions in dyn file")?;
        let positions: Vec<[f64; 3]> = reader.section(natom)?;

        let velocities: DynVelocities = match reader.next_line()?.trim() {
            "Current Translational Velocities :" => {
                let translational_velocities = reader.section(natom)?;
                reader.expect_header(
                    "Current Angular Velocities :",
                    "could not find angular velocity section in dyn file",
                )?;
                let angular_velocities = reader.section(natom)?;
                reader.expect_header(
                    "Current Angular Momenta :",
                    "could not find angular momenta section in dyn file",
                )?;
                let angular_momenta = reader.section(natom)?;
                DynVelocities::RigidBody {
                    translational_velocities,
                    angular_velocities,
                    angular_momenta,
                }
            }
            "Current Atomic Velocities :" => {
                let velocities = reader.section(natom)?;
                reader.expect_header(
                    "Current Atomic Accelerations :",
                    "could not find accelerations in dyn file",
                )?;
                let accelerations = reader.section(natom)?;
                reader.expect_header(
                    "Alternate Atomic Accelerations :",
                    "could not find old accelerations in dyn file",
                )?;
                let old_accelerations = reader.section(natom)?;
                DynVelocities::Atomic {
                    velocities,
                    accelerations,
                    old_accelerations,
                }
            }
            _ => return Err(LoadError::TinkerDynFile("no velocities in dyn file".to_string())),
        };

        Ok(DynFile {
            natom,
            title,
            cell,
            positions,
            velocities,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        Self::parse(&read_to_string(path)?)
    }

    pub fn is_rigid_body(&self) -> bool {
        matches!(self.velocities, DynVelocities::RigidBody { .. })
    }
}

/// Group the lines of a TINKER parameter file by their leading keyword.
pub fn parse_tinker_parameters(path: &Path, content: &str) -> Result<ParameterFile, LoadError> {
    let mut sections: HashMap<String, Vec<String>> = HashMap::new();
    for line in content.lines() {
        let line: &str = line.trim();
        let keyword: &str = match line.split_whitespace().next() {
            Some(word) if word.chars().all(|c| c.is_ascii_alphabetic() || c == '-') => word,
            _ => continue,
        };
        sections
            .entry(keyword.to_uppercase())
            .or_insert_with(Vec::new)
            .push(line[keyword.len()..].trim().to_string());
    }
    if sections.is_empty() {
        return Err(LoadError::parse(path, 0, "no parameter keywords found"));
    }
    Ok(ParameterFile {
        path: path.to_path_buf(),
        sections,
    })
}

/// Loads TINKER inputs: topology from an .xyz file, coordinates from an .xyz
/// or .dyn file and parameters through a keyword control file.
#[derive(Debug, Clone, Copy, Default)]
pub struct TinkerLoader;

impl StructureLoader for TinkerLoader {
    fn load_topology(&self, path: &Path) -> Result<Topology, LoadError> {
        let topology: Topology = XyzFile::from_path(path)?.to_topology(path)?;
        info!(
            "topology {}: {} atoms, {} bonds",
            path.display(),
            topology.n_atoms(),
            topology.bonds.len()
        );
        Ok(topology)
    }

    fn load_coordinates(&self, path: &Path) -> Result<CoordinateSet, LoadError> {
        let is_dyn: bool = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("dyn"));
        let positions: Vec<[f64; 3]> = if is_dyn {
            DynFile::from_path(path)?.positions
        } else {
            XyzFile::from_path(path)?.positions()
        };
        Ok(angstrom_rows_to_coordinates(&positions))
    }

    /// The first path is the keyword control file, its PARAMETERS entry is
    /// resolved relative to the key file. Further paths are extra parameter files.
    fn load_parameters(&self, paths: &[&Path]) -> Result<ParameterSet, LoadError> {
        let (key_path, extra) = paths.split_first().ok_or(LoadError::NoParameterFiles)?;
        let keys: KeywordControlFile = KeywordControlFile::from_path(key_path)?;
        let parameters: &str = keys.parameters.as_deref().ok_or_else(|| {
            LoadError::TinkerKeyFile(format!("{} has no PARAMETERS keyword", key_path.display()))
        })?;
        let mut parameter_path: PathBuf = key_path
            .parent()
            .map(|dir| dir.join(parameters))
            .unwrap_or_else(|| PathBuf::from(parameters));
        if parameter_path.extension().is_none() {
            parameter_path.set_extension("prm");
        }

        let mut files: Vec<ParameterFile> = Vec::new();
        for path in std::iter::once(parameter_path.as_path()).chain(extra.iter().copied()) {
            files.push(parse_tinker_parameters(path, &read_to_string(path)?)?);
        }
        Ok(ParameterSet {
            files,
            keywords: keys.keywords(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const XYZ: &str = "\
     3  TIP3P water
     1  O     -0.000000    0.000000    0.065163    34     2     3
     2  H      0.756950    0.000000   -0.520519    35     1
     3  H     -0.756950    0.000000   -0.520519    35     1
";

    const DYN: &str = "\
 Number of Atoms and Title :
     2  dimer
 Periodic Box Dimensions :
   0.1800000000000D+02   0.1800000000000D+02   0.1800000000000D+02
   0.9000000000000D+02   0.9000000000000D+02   0.9000000000000D+02
 Current Atomic Positions :
   0.1000000000000D+01   0.2000000000000D+01   0.3000000000000D+01
  -0.1000000000000D+01  -0.2000000000000D+01  -0.3000000000000D+01
 Current Atomic Velocities :
   0.0 0.0 0.0
   0.0 0.0 0.0
 Current Atomic Accelerations :
   0.0 0.0 0.0
   0.0 0.0 0.0
 Alternate Atomic Accelerations :
   0.0 0.0 0.0
   0.0 0.0 0.0
";

    #[test]
    fn keyword_file() {
        let keys: KeywordControlFile = KeywordControlFile::parse(
            "parameters amoebabio09\n\na-axis 18.643\nGAMMA 90.0\nopenmp-threads 4\n",
        )
        .unwrap();
        assert_eq!(keys.parameters.as_deref(), Some("amoebabio09"));
        assert_eq!(keys.a_axis, Some(18.643));
        assert_eq!(keys.gamma, Some(90.0));
        assert_eq!(keys.b_axis, None);
        assert_eq!(keys.keywords().len(), 3);
    }

    #[test]
    fn malformed_keyword_value() {
        let result = KeywordControlFile::parse("a-axis eighteen\n");
        assert!(matches!(result, Err(LoadError::TinkerKeyFile(_))));
    }

    #[test]
    fn xyz_topology() {
        let path: &Path = Path::new("water.xyz");
        let xyz: XyzFile = XyzFile::parse(path, XYZ).unwrap();
        assert_eq!(xyz.natom, 3);
        assert_eq!(xyz.atoms[1].atom_type, 35);
        let topology: Topology = xyz.to_topology(path).unwrap();
        assert_eq!(topology.bonds, vec![[0, 1], [0, 2]]);
        assert_eq!(topology.atoms[0].atomic_number, Some(8));
        assert_eq!(topology.atoms[2].atomic_number, Some(1));
    }

    #[test]
    fn xyz_with_missing_atoms() {
        let truncated: String = XYZ.lines().take(3).collect::<Vec<_>>().join("\n");
        let result = XyzFile::parse(Path::new("water.xyz"), &truncated);
        assert!(matches!(result, Err(LoadError::Parse { .. })));
    }

    #[test]
    fn dyn_file_with_fortran_exponents() {
        let dyn_file: DynFile = DynFile::parse(DYN).unwrap();
        assert_eq!(dyn_file.natom, 2);
        assert_eq!(dyn_file.title, "dimer");
        assert_relative_eq!(dyn_file.cell[0], 18.0);
        assert_relative_eq!(dyn_file.cell[5], 90.0);
        assert_relative_eq!(dyn_file.positions[1][2], -3.0);
        assert!(!dyn_file.is_rigid_body());
    }

    #[test]
    fn dyn_file_without_velocities() {
        let truncated: String = DYN.lines().take(8).collect::<Vec<_>>().join("\n") + "\nnothing\n";
        match DynFile::parse(&truncated) {
            Err(LoadError::TinkerDynFile(message)) => assert!(message.contains("velocities")),
            other => panic!("expected a dyn file error, got {:?}", other),
        }
    }

    #[test]
    fn not_a_dyn_file() {
        assert!(matches!(
            DynFile::parse("hello\n"),
            Err(LoadError::TinkerDynFile(_))
        ));
    }

    #[test]
    fn element_names() {
        assert_eq!(element_from_name("CA"), Some(6));
        assert_eq!(element_from_name("Cl-"), Some(17));
        assert_eq!(element_from_name("Na+"), Some(11));
        assert_eq!(element_from_name("HW"), Some(1));
        assert_eq!(element_from_name("123"), None);
    }

    #[test]
    fn tinker_parameter_keywords() {
        let content: &str = "\
      ##############################
forcefield              AMOEBA-BIO-2009
atom          1    1    N     \"Glycine N\"     7    14.003    3
bond          1    2          374.00     1.4370
";
        let file: ParameterFile =
            parse_tinker_parameters(Path::new("amoeba.prm"), content).unwrap();
        assert_eq!(file.sections["ATOM"].len(), 1);
        assert_eq!(file.sections["BOND"], vec!["1    2          374.00     1.4370"]);
        assert_eq!(file.entry_count(), 3);
    }
}
