use crate::constants;
use crate::error::LoadError;
use crate::initialization::geometry::CoordinateSet;
use crate::initialization::system::{AtomRecord, ParameterFile, ParameterSet, Topology};
use crate::interface::StructureLoader;
use chemfiles::{Frame, Trajectory};
use hashbrown::HashMap;
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Read a geometry file like .xyz or .pdb and return its first [Frame](chemfiles::Frame)
pub fn read_file_to_frame(path: &Path) -> Result<Frame, LoadError> {
    let chemfiles_error = |e: chemfiles::Error| LoadError::Chemfiles {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    if !path.exists() {
        return Err(LoadError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }
    let mut trajectory: Trajectory = Trajectory::open(path, 'r').map_err(chemfiles_error)?;
    let mut frame: Frame = Frame::new();
    // if multiple geometries are contained in the file, we will only use the first one
    trajectory.read(&mut frame).map_err(chemfiles_error)?;
    Ok(frame)
}

/// Extract the positions (in nm) from a [Frame](chemfiles::Frame)
pub fn frame_to_coordinates(frame: &Frame) -> CoordinateSet {
    angstrom_rows_to_coordinates(frame.positions())
}

/// Extract atom names, elements and bonds from a [Frame](chemfiles::Frame)
pub fn frame_to_topology(frame: &Frame) -> Topology {
    let atoms: Vec<AtomRecord> = (0..frame.size() as usize)
        .map(|i| {
            let atom = frame.atom(i);
            let number: u64 = atom.atomic_number();
            let atomic_number: Option<u8> = if number > 0 && number <= u8::MAX as u64 {
                Some(number as u8)
            } else {
                None
            };
            AtomRecord::new(&atom.name(), atomic_number)
        })
        .collect();
    let bonds: Vec<[usize; 2]> = frame.topology().bonds();
    Topology { atoms, bonds }
}

fn section_name(keyword: &str) -> Option<&'static str> {
    let keyword: String = keyword.to_uppercase();
    if keyword == "PHI" {
        return Some("DIHEDRALS");
    }
    match keyword.get(..4) {
        Some("ATOM") => Some("ATOMS"),
        Some("BOND") => Some("BONDS"),
        Some("ANGL") | Some("THET") => Some("ANGLES"),
        Some("DIHE") => Some("DIHEDRALS"),
        Some("IMPR") | Some("IMPH") => Some("IMPROPER"),
        Some("CMAP") => Some("CMAP"),
        Some("NONB") | Some("NBON") => Some("NONBONDED"),
        Some("NBFI") => Some("NBFIX"),
        Some("HBON") => Some("HBOND"),
        _ => None,
    }
}

/// Split a CHARMM-style parameter or stream file into keyword sections.
/// Title lines (`*`), `!` comments, section option continuations and embedded
/// topology (`read rtf`) blocks are skipped.
pub fn parse_parameter_file(path: &Path, content: &str) -> Result<ParameterFile, LoadError> {
    let mut sections: HashMap<String, Vec<String>> = HashMap::new();
    let mut current: Option<&'static str> = None;
    let mut in_rtf: bool = false;
    let mut continuation: bool = false;

    for line in content.lines() {
        let line: &str = line.split('!').next().unwrap_or("").trim();
        if line.is_empty() || line.starts_with('*') {
            continue;
        }
        if continuation {
            continuation = line.ends_with('-');
            continue;
        }
        let first: String = line
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_uppercase();
        if first == "END" {
            current = None;
            in_rtf = false;
            continue;
        }
        if first == "READ" {
            current = None;
            in_rtf = line.to_uppercase().contains("RTF");
            continue;
        }
        if in_rtf {
            continue;
        }
        if let Some(name) = section_name(&first) {
            current = Some(name);
            sections.entry(name.to_string()).or_insert_with(Vec::new);
            continuation = line.ends_with('-');
            continue;
        }
        if let Some(name) = current {
            sections
                .entry(name.to_string())
                .or_insert_with(Vec::new)
                .push(line.to_string());
        }
    }

    if sections.is_empty() {
        return Err(LoadError::parse(path, 0, "no parameter sections found"));
    }
    Ok(ParameterFile {
        path: path.to_path_buf(),
        sections,
    })
}

pub fn read_parameter_file(path: &Path) -> Result<ParameterFile, LoadError> {
    let content: String = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ParameterFile = parse_parameter_file(path, &content)?;
    debug!(
        "read {} parameter entries from {}",
        file.entry_count(),
        path.display()
    );
    Ok(file)
}

/// Loads structures with chemfiles and CHARMM-style parameter files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChemfilesLoader;

impl StructureLoader for ChemfilesLoader {
    fn load_topology(&self, path: &Path) -> Result<Topology, LoadError> {
        let frame: Frame = read_file_to_frame(path)?;
        let topology: Topology = frame_to_topology(&frame);
        info!(
            "topology {}: {} atoms, {} bonds",
            path.display(),
            topology.n_atoms(),
            topology.bonds.len()
        );
        Ok(topology)
    }

    fn load_coordinates(&self, path: &Path) -> Result<CoordinateSet, LoadError> {
        let frame: Frame = read_file_to_frame(path)?;
        Ok(frame_to_coordinates(&frame))
    }

    fn load_parameters(&self, paths: &[&Path]) -> Result<ParameterSet, LoadError> {
        if paths.is_empty() {
            return Err(LoadError::NoParameterFiles);
        }
        let files: Vec<ParameterFile> = paths
            .iter()
            .map(|path| read_parameter_file(path))
            .collect::<Result<_, _>>()?;
        Ok(ParameterSet {
            files,
            keywords: HashMap::new(),
        })
    }
}

/// Turn raw `[x, y, z]` rows in angstrom into a coordinate set in nm.
pub fn angstrom_rows_to_coordinates(rows: &[[f64; 3]]) -> CoordinateSet {
    CoordinateSet::from(
        rows.iter()
            .map(|p| {
                [
                    p[0] * constants::ANGSTROM_TO_NM,
                    p[1] * constants::ANGSTROM_TO_NM,
                    p[2] * constants::ANGSTROM_TO_NM,
                ]
            })
            .collect::<Vec<[f64; 3]>>(),
    )
}
