use phf::phf_map;

// length conversions
pub const ANGSTROM_TO_NM: f64 = 0.1;
pub const NM_TO_ANGSTROM: f64 = 10.0;
// time conversions
pub const FS_TO_PS: f64 = 0.001;
// energy conversions
pub const KJ_TO_KCAL: f64 = 1.0 / 4.184;
// molar gas constant in kJ/(mol K)
pub const MOLAR_GAS_CONSTANT: f64 = 0.008_314_462_618;
pub const AVOGADRO: f64 = 6.022_140_76e23;
// 1 nm^3 in cm^3 (= mL)
pub const NM3_TO_ML: f64 = 1.0e-21;

pub const ATOM_NAMES: [&str; 37] = [
    "X", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr",
];

// atomic masses in g/mol
pub static ATOMIC_MASSES: phf::Map<u8, f64> = phf_map! {
    1u8 => 1.008,
    2u8 => 4.0026,
    3u8 => 6.94,
    4u8 => 9.0122,
    5u8 => 10.81,
    6u8 => 12.011,
    7u8 => 14.007,
    8u8 => 15.999,
    9u8 => 18.998,
    10u8 => 20.180,
    11u8 => 22.990,
    12u8 => 24.305,
    13u8 => 26.982,
    14u8 => 28.085,
    15u8 => 30.974,
    16u8 => 32.06,
    17u8 => 35.45,
    18u8 => 39.948,
    19u8 => 39.098,
    20u8 => 40.078,
    21u8 => 44.956,
    22u8 => 47.867,
    23u8 => 50.942,
    24u8 => 51.996,
    25u8 => 54.938,
    26u8 => 55.845,
    27u8 => 58.933,
    28u8 => 58.693,
    29u8 => 63.546,
    30u8 => 65.38,
    31u8 => 69.723,
    32u8 => 72.630,
    33u8 => 74.922,
    34u8 => 78.971,
    35u8 => 79.904,
    36u8 => 83.798,
};

/// Look up the atomic number of an element symbol, ignoring case.
pub fn atomic_number_from_symbol(symbol: &str) -> Option<u8> {
    ATOM_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(symbol))
        .filter(|&number| number > 0)
        .map(|number| number as u8)
}
