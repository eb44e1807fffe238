use crate::errors::{
    FragSeekError,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::ops::Range;
use std::sync::Arc;

/// Cleavage rules of the supported proteases.
///
/// Names follow the usual conventions, e.g. `"Trypsin"` cleaves after K/R
/// unless followed by P while `"Trypsin/P"` ignores the proline rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Enzyme {
    #[default]
    #[serde(rename = "Trypsin")]
    Trypsin,
    #[serde(rename = "Trypsin/P")]
    TrypsinP,
    #[serde(rename = "Lys-C")]
    LysC,
    #[serde(rename = "Lys-C/P")]
    LysCP,
    #[serde(rename = "Arg-C")]
    ArgC,
    #[serde(rename = "Asp-N")]
    AspN,
    #[serde(rename = "Glu-C")]
    GluC,
    #[serde(rename = "Chymotrypsin")]
    Chymotrypsin,
    #[serde(rename = "no cleavage")]
    NoCleavage,
}

impl Enzyme {
    fn cleaves_between(&self, left: u8, right: u8) -> bool {
        match self {
            Enzyme::Trypsin => matches!(left, b'K' | b'R') && right != b'P',
            Enzyme::TrypsinP => matches!(left, b'K' | b'R'),
            Enzyme::LysC => left == b'K' && right != b'P',
            Enzyme::LysCP => left == b'K',
            Enzyme::ArgC => left == b'R' && right != b'P',
            Enzyme::AspN => right == b'D',
            Enzyme::GluC => left == b'E' && right != b'P',
            Enzyme::Chymotrypsin => matches!(left, b'F' | b'W' | b'Y' | b'L') && right != b'P',
            Enzyme::NoCleavage => false,
        }
    }

    /// Positions `i` such that the bond between residues `i - 1` and `i`
    /// is cleaved.
    pub fn cleavage_sites(&self, sequence: &[u8]) -> Vec<usize> {
        (1..sequence.len())
            .filter(|&i| self.cleaves_between(sequence[i - 1], sequence[i]))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DigestionConfig {
    pub enzyme: Enzyme,
    pub max_missed_cleavages: usize,
    pub min_length: usize,
    pub max_length: usize,
    /// Neutral peptide mass window, inclusive.
    pub min_peptide_mass: f64,
    pub max_peptide_mass: f64,
    pub build_decoys: bool,
    /// Upper bound on the number of catalog entries.
    pub max_peptides: usize,
}

impl Default for DigestionConfig {
    fn default() -> Self {
        Self {
            enzyme: Enzyme::Trypsin,
            max_missed_cleavages: 1,
            min_length: 7,
            max_length: 40,
            min_peptide_mass: 100.0,
            max_peptide_mass: 9000.0,
            build_decoys: false,
            max_peptides: 50_000_000,
        }
    }
}

impl DigestionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_length == 0 || self.max_length == 0 {
            return Err(FragSeekError::config(
                "digestion.min_length",
                "peptide lengths must be positive",
            ));
        }
        if self.max_length < self.min_length {
            return Err(FragSeekError::config(
                "digestion.max_length",
                format!(
                    "max_length ({}) is smaller than min_length ({})",
                    self.max_length, self.min_length
                ),
            ));
        }
        if !(self.min_peptide_mass.is_finite() && self.max_peptide_mass.is_finite())
            || self.max_peptide_mass <= 0.0
            || self.min_peptide_mass > self.max_peptide_mass
        {
            return Err(FragSeekError::config(
                "digestion.peptide_mass",
                format!(
                    "invalid peptide mass window [{}, {}]",
                    self.min_peptide_mass, self.max_peptide_mass
                ),
            ));
        }
        if self.max_peptides == 0 {
            return Err(FragSeekError::config(
                "digestion.max_peptides",
                "budget must be positive",
            ));
        }
        Ok(())
    }

    /// Cuts a protein into the peptides allowed by the enzyme, the number of
    /// missed cleavages and the length bounds.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use fragseek::models::digest::{DigestionConfig, Enzyme};
    ///
    /// let config = DigestionConfig {
    ///     enzyme: Enzyme::Trypsin,
    ///     max_missed_cleavages: 0,
    ///     min_length: 1,
    ///     max_length: 50,
    ///     ..Default::default()
    /// };
    /// let seq: Arc<str> = "PEPTIDEKPEPRTIDEK".into();
    /// let digests: Vec<String> = config
    ///     .digest(0, &seq)
    ///     .into_iter()
    ///     .map(String::from)
    ///     .collect();
    /// assert_eq!(digests, vec!["PEPTIDEKPEPR", "TIDEK"]);
    /// ```
    pub fn digest(&self, protein_idx: u32, sequence: &Arc<str>) -> Vec<DigestSlice> {
        let bytes = sequence.as_bytes();
        if bytes.is_empty() {
            return Vec::new();
        }
        let mut boundaries = Vec::with_capacity(bytes.len() / 8 + 2);
        boundaries.push(0);
        boundaries.extend(self.enzyme.cleavage_sites(bytes));
        boundaries.push(bytes.len());

        let mut out = Vec::new();
        for (i, start) in boundaries.iter().enumerate() {
            let last = (i + 1 + self.max_missed_cleavages).min(boundaries.len() - 1);
            for end in boundaries[(i + 1).min(boundaries.len())..=last].iter() {
                let len = end - start;
                if len > self.max_length {
                    break;
                }
                if len >= self.min_length {
                    out.push(DigestSlice::new(
                        sequence.clone(),
                        *start..*end,
                        protein_idx,
                    ));
                }
            }
        }
        out
    }
}

/// A view into a protein sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestSlice {
    ref_seq: Arc<str>,
    range: Range<usize>,
    pub protein_idx: u32,
}

impl Serialize for DigestSlice {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl DigestSlice {
    pub fn new(ref_seq: Arc<str>, range: Range<usize>, protein_idx: u32) -> Self {
        Self {
            ref_seq,
            range,
            protein_idx,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.ref_seq.as_ref()[self.range.clone()]
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }

    pub fn start(&self) -> usize {
        self.range.start
    }

    pub fn is_protein_nterm(&self) -> bool {
        self.range.start == 0
    }

    pub fn is_protein_cterm(&self) -> bool {
        self.range.end == self.ref_seq.len()
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

impl From<DigestSlice> for String {
    fn from(x: DigestSlice) -> Self {
        x.as_str().to_string()
    }
}
