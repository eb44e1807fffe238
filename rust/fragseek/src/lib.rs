//! Fragment index based peptide identification.
//!
//! Proteins are digested into a mass sorted [`PeptideCatalog`], every
//! peptide is fragmented into a [`FragmentIndex`], and each spectrum is
//! reduced to short sequence tags ([`MultiPeak`]) by a [`TagGenerator`].
//! Tags are looked up in the index and the resulting hits are ranked by a
//! [`FragmentIndexScorer`]. [`SearchEngine`] ties the steps together.

pub mod catalog;
pub mod chemistry;
pub mod data_sources;
pub mod errors;
pub mod fragment_mass;
pub mod index;
pub mod models;
pub mod preprocessing;
pub mod scoring;
pub mod search;
pub mod tags;
pub mod utils;

pub use catalog::PeptideCatalog;
pub use errors::{
    FragSeekError,
    Result,
};
pub use index::{
    FragmentIndex,
    FragmentIndexConfig,
    Hit,
};
pub use models::{
    MassTolerance,
    Peak,
    Peptide,
    Protein,
    Spectrum,
};
pub use scoring::{
    FragmentIndexScorer,
    PeptideSpectrumMatch,
};
pub use search::{
    SearchConfig,
    SearchEngine,
    SearchOutcome,
};
pub use tags::{
    MultiPeak,
    TagConfig,
    TagGenerator,
};
