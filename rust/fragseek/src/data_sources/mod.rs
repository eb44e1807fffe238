pub mod fasta;
pub mod spectra;

pub use fasta::{
    parse_fasta,
    read_fasta,
};
pub use spectra::{
    SpectraFormat,
    SpectrumRecord,
    parse_spectra,
    read_spectra,
};
