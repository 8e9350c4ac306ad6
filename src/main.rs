use anyhow::{Context, Result};
use clap::{crate_name, crate_version, Arg, ArgMatches, Command};
use env_logger::Builder;
use log::{info, LevelFilter};
use rusty_cell::defaults::CONFIG_FILE_NAME;
use rusty_cell::initialization::{
    bounding_box, BoundingBox, CellDimensions, ChemfilesLoader, CoordinateSet, ParameterSet,
    SimulationConfig, StructureFormat, TinkerLoader, Topology,
};
use rusty_cell::interface::StructureLoader;
use std::io::Write;
use std::path::{Path, PathBuf};

fn loader_for(format: StructureFormat) -> Box<dyn StructureLoader> {
    match format {
        StructureFormat::Chemfiles => Box::new(ChemfilesLoader),
        StructureFormat::Tinker => Box::new(TinkerLoader),
    }
}

fn print_cell(path: &Path, format: StructureFormat) -> Result<()> {
    let coordinates: CoordinateSet = loader_for(format)
        .load_coordinates(path)
        .with_context(|| format!("could not load coordinates from {}", path.display()))?;
    let bounds: BoundingBox = bounding_box(&coordinates)?;
    let cell: CellDimensions = bounds.cell_dimensions();
    println!("atoms:  {}", coordinates.len());
    println!("min:    {:12.6} {:12.6} {:12.6}", bounds.min[0], bounds.min[1], bounds.min[2]);
    println!("max:    {:12.6} {:12.6} {:12.6}", bounds.max[0], bounds.max[1], bounds.max[2]);
    println!("cell:   {:12.6} {:12.6} {:12.6} nm", cell.0[0], cell.0[1], cell.0[2]);
    println!("volume: {:12.6} nm^3", cell.volume());
    Ok(())
}

fn inspect(config_path: &Path) -> Result<()> {
    // write the defaults if the file is missing so that the user can see all options
    let config: SimulationConfig = SimulationConfig::load_or_create(config_path)
        .with_context(|| format!("could not read {}", config_path.display()))?;
    let loader: Box<dyn StructureLoader> = loader_for(config.structure.format);

    let parameter_paths: Vec<&Path> = config
        .structure
        .parameters
        .iter()
        .map(PathBuf::as_path)
        .collect();
    let parameters: ParameterSet = loader.load_parameters(&parameter_paths)?;
    let topology: Topology = loader.load_topology(&config.structure.topology)?;
    let coordinates: CoordinateSet = loader.load_coordinates(&config.structure.coordinates)?;
    let cell: CellDimensions = bounding_box(&coordinates)?.cell_dimensions();
    let constraints = config.system.constraints;

    println!("particles:          {}", topology.n_atoms());
    println!("coordinates:        {}", coordinates.len());
    println!("bonds:              {}", topology.bonds.len());
    println!(
        "constraints ({}): {}",
        constraints,
        topology.constraint_count(constraints)
    );
    println!("degrees of freedom: {}", topology.degrees_of_freedom(constraints));
    println!("total mass:         {:.4} g/mol", topology.total_mass());
    println!("parameter files:    {}", parameters.files.len());
    println!(
        "cell:               {:.4} x {:.4} x {:.4} nm",
        cell.0[0], cell.0[1], cell.0[2]
    );
    println!("platform:           {:?}", config.platform_spec().properties());
    Ok(())
}

fn main() -> Result<()> {
    let matches: ArgMatches = Command::new(crate_name!())
        .version(crate_version!())
        .about("builds and inspects classical molecular dynamics runs")
        .arg(
            Arg::new("verbose")
                .short('v')
                .multiple_occurrences(true)
                .help("More output, may be given twice"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .multiple_occurrences(true)
                .help("Less output, may be given twice"),
        )
        .subcommand(
            Command::new("box")
                .about("Prints the bounding box and cell of a coordinate file")
                .arg(
                    Arg::new("file")
                        .help("Coordinate file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("tinker")
                        .long("tinker")
                        .help("Read the file as TINKER .xyz or .dyn"),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Loads the configured inputs and prints a summary of the system")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .takes_value(true)
                        .value_name("FILE")
                        .help("Configuration file"),
                ),
        )
        .subcommand_required(true)
        .get_matches();

    let level: i64 = matches.occurrences_of("verbose") as i64 - matches.occurrences_of("quiet") as i64;
    let log_level: LevelFilter = match level {
        2 => LevelFilter::Trace,
        1 => LevelFilter::Debug,
        0 => LevelFilter::Info,
        -1 => LevelFilter::Warn,
        -2 => LevelFilter::Error,
        l if l > 2 => LevelFilter::Trace,
        _ => LevelFilter::Off,
    };

    Builder::new()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .filter(None, log_level)
        .init();

    match matches.subcommand() {
        Some(("box", sub)) => {
            let format: StructureFormat = if sub.is_present("tinker") {
                StructureFormat::Tinker
            } else {
                StructureFormat::Chemfiles
            };
            let file: &str = sub.value_of("file").context("no coordinate file given")?;
            print_cell(Path::new(file), format)
        }
        Some(("inspect", sub)) => {
            let config_path: &str = sub.value_of("config").unwrap_or(CONFIG_FILE_NAME);
            info!("using configuration {}", config_path);
            inspect(Path::new(config_path))
        }
        _ => Ok(()),
    }
}
