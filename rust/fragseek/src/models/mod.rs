pub mod decoy;
pub mod digest;
pub mod peptide;
pub mod protein;
pub mod spectrum;
pub mod tolerance;

pub use decoy::DecoyMarking;
pub use digest::{
    DigestSlice,
    DigestionConfig,
    Enzyme,
};
pub use peptide::{
    ModSite,
    Peptide,
    Peptidoform,
    Residue,
};
pub use protein::Protein;
pub use spectrum::{
    Peak,
    Spectrum,
};
pub use tolerance::MassTolerance;
