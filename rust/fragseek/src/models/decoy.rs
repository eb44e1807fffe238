use serde::Serialize;

/// Prefix given to the protein accession of decoy matches.
pub const DECOY_PREFIX: &str = "DECOY_";

/// Whether a catalog entry comes from the input proteins or was generated.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, std::hash::Hash, PartialOrd, Ord)]
pub enum DecoyMarking {
    Target,
    Decoy,
}

impl DecoyMarking {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecoyMarking::Target => "Target",
            DecoyMarking::Decoy => "Decoy",
        }
    }

    pub fn is_decoy(&self) -> bool {
        matches!(self, DecoyMarking::Decoy)
    }

    pub fn is_target(&self) -> bool {
        !self.is_decoy()
    }
}

/// Reverses everything but the first and last element.
///
/// Sequences shorter than three elements are returned unchanged.
pub(crate) fn reverse_inner<T: Clone>(sequence: &[T]) -> Vec<T> {
    let mut out = sequence.to_vec();
    if out.len() > 2 {
        let last = out.len() - 1;
        out[1..last].reverse();
    }
    out
}

/// Decoy form of a plain sequence string.
///
/// ```
/// use fragseek::models::decoy::as_decoy_string;
///
/// assert_eq!(as_decoy_string("PEPTIDEPINK"), "PNIPEDITPEK");
/// ```
pub fn as_decoy_string(sequence: &str) -> String {
    let bytes = reverse_inner(sequence.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}
