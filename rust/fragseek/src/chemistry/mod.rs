pub mod masses;
pub mod modifications;
pub mod residues;

pub use masses::{
    ammonia_mass,
    carbon_monoxide_mass,
    hydrogen_mass,
    water_mass,
};
pub use modifications::{
    Modification,
    ModificationId,
    ModificationSet,
    ModificationTarget,
};
pub use residues::{
    STANDARD_RESIDUES,
    residue_mass,
};

/// Mass of a proton (Da).
pub const PROTON: f64 = 1.007276466621;
/// Mass difference between 13C and 12C (Da), the spacing of isotope peaks.
pub const C13_C12_DIFF: f64 = 1.0033548378;

/// Neutral mass from an observed m/z at a given charge.
///
/// ```
/// use fragseek::chemistry::{mz_to_neutral_mass, PROTON};
///
/// let mass = mz_to_neutral_mass(500.0 + PROTON, 1);
/// assert!((mass - 500.0).abs() < 1e-9);
/// ```
pub fn mz_to_neutral_mass(mz: f64, charge: u8) -> f64 {
    (mz - PROTON) * charge as f64
}

pub fn neutral_mass_to_mz(mass: f64, charge: u8) -> f64 {
    mass / charge as f64 + PROTON
}
