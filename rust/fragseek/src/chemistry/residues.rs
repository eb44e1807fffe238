/// One-letter codes of the residues that have a defined mass.
/// `U` (selenocysteine) and `O` (pyrrolysine) are included so proteins
/// carrying them still digest; ambiguous codes (B, J, X, Z) are not.
pub const STANDARD_RESIDUES: &[u8] = b"ACDEFGHIKLMNOPQRSTUVWY";

/// Monoisotopic residue mass (amino acid minus water) for a one-letter code.
///
/// Lowercase codes are accepted. Returns `None` for ambiguous or unknown
/// residues.
///
/// ```
/// use fragseek::chemistry::residue_mass;
///
/// assert!((residue_mass(b'G').unwrap() - 57.02146372).abs() < 1e-6);
/// assert_eq!(residue_mass(b'I'), residue_mass(b'L'));
/// assert!(residue_mass(b'X').is_none());
/// ```
pub fn residue_mass(aa: u8) -> Option<f64> {
    super::masses::residue(aa)
}

/// True when every residue of the sequence has a known mass.
pub fn all_residues_known(sequence: &[u8]) -> bool {
    sequence.iter().all(|aa| residue_mass(*aa).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_residues_have_masses() {
        for aa in STANDARD_RESIDUES {
            assert!(residue_mass(*aa).is_some(), "missing mass for {}", *aa as char);
        }
    }

    #[test]
    fn test_unknown_residues() {
        assert!(!all_residues_known(b"PEPTIDEX"));
        assert!(all_residues_known(b"peptide"));
    }
}
