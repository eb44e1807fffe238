use serde::Serialize;

/// One reported peptide-spectrum match. Serialises to one row of the
/// results table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeptideSpectrumMatch {
    pub spectrum_id: String,
    /// 1 for the best match of the spectrum.
    pub rank: u32,
    pub peptide: String,
    pub stripped_sequence: String,
    pub protein: String,
    pub is_decoy: bool,
    pub charge: u8,
    pub isotope_offset: i8,
    pub rt: Option<f64>,
    pub precursor_mz: f64,
    /// Neutral mass of the candidate peptide.
    pub calculated_mass: f64,
    pub precursor_error_ppm: f64,
    pub hyperscore: f64,
    pub tag_score: f64,
    pub matched_tag_peaks: u32,
    pub matched_nterm: u16,
    pub matched_cterm: u16,
    pub prefix_fraction: f64,
    pub suffix_fraction: f64,
    pub median_fragment_error_ppm: f64,
    pub peptide_idx: u32,
}
