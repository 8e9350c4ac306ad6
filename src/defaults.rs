// config file
pub const CONFIG_FILE_NAME: &str = "cell.toml";
// structure input
pub const STRUCTURE_FORMAT: &str = "chemfiles";
pub const TOPOLOGY_FILE: &str = "ala2_solv.pdb";
pub const COORDINATE_FILE: &str = "ala2_solv.pdb";
pub const PARAMETER_FILES: [&str; 2] = ["toppar/par_all36_prot.prm", "toppar/toppar_water_ions.str"];
// nonbonded cutoff in angstrom
pub const CUTOFF: f64 = 6.0;
// heat bath temperature (K)
pub const TEMPERATURE: f64 = 300.0;
// friction coefficient (1/ps)
pub const FRICTION: f64 = 1.0;
// time step in fs
pub const STEPSIZE: f64 = 2.0;
// platform: "Reference", "CPU", "OpenCL" or "CUDA"
pub const PLATFORM: &str = "CUDA";
// mixed single/double precision
pub const PRECISION: &str = "mixed";
// maximum number of minimization iterations, 0 runs until converged
pub const MINIMIZATION_STEPS: usize = 500;
// minimization energy tolerance in kJ/mol
pub const MINIMIZATION_TOLERANCE: f64 = 10.0;
// number of dynamics steps
pub const NSTEP: u64 = 10000;
// report energies and coordinates every REPORT_INTERVAL steps
pub const REPORT_INTERVAL: u64 = 100;
// "stdout" or a file path
pub const STATE_DATA_DESTINATION: &str = "stdout";
pub const TRAJECTORY_FILE: &str = "ala2_solv.dcd";
pub const RESTART_FILE_NAME: &str = "dynamics_restart.yaml";
pub const PRINT_RESTART: bool = false;
