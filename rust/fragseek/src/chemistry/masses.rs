//! Monoisotopic masses resolved through `rustyms`.
//!
//! Every mass is the difference of small ProForma peptides, so residues,
//! UniMod entries and the small neutral molecules of the ion series all
//! follow the element and ontology tables rustyms ships with.

use super::modifications::ModificationTarget;
use super::residues::STANDARD_RESIDUES;
use crate::errors::{
    FragSeekError,
    Result,
};
use rustyms::prelude::Peptidoform as ProFormaPeptide;
use std::sync::LazyLock;
use tracing::warn;

#[derive(Debug)]
struct MassTable {
    residues: [Option<f64>; 26],
    water: f64,
    ammonia: f64,
    carbon_monoxide: f64,
    hydrogen: f64,
}

static MASSES: LazyLock<MassTable> = LazyLock::new(|| {
    let mut residues = [None; 26];
    for aa in STANDARD_RESIDUES.iter() {
        match single_residue_mass(*aa) {
            Ok(mass) => residues[(aa - b'A') as usize] = Some(mass),
            Err(e) => warn!("No mass for residue {}: {}", *aa as char, e),
        }
    }
    let r = |aa: u8| residues[(aa - b'A') as usize].unwrap_or(f64::NAN);

    // H2 = V - P, NH3 = K - L + H2, CO = S - G - H2
    let h2 = r(b'V') - r(b'P');
    let ammonia = r(b'K') - r(b'L') + h2;
    let carbon_monoxide = r(b'S') - r(b'G') - h2;
    let water = match (proforma_mass("G"), proforma_mass("GG")) {
        (Ok(one), Ok(two)) => 2.0 * one - two,
        _ => f64::NAN,
    };
    MassTable {
        residues,
        water,
        ammonia,
        carbon_monoxide,
        hydrogen: h2 / 2.0,
    }
});

/// Neutral monoisotopic mass of a linear ProForma peptide.
///
/// ```
/// use fragseek::chemistry::masses::proforma_mass;
///
/// let glycine = proforma_mass("G").unwrap();
/// assert!((glycine - 75.032028).abs() < 1e-5);
/// assert!(proforma_mass("PEPT[NotAModification]IDE").is_err());
/// ```
pub fn proforma_mass(sequence: &str) -> Result<f64> {
    let peptide =
        ProFormaPeptide::pro_forma(sequence, None).map_err(|e| FragSeekError::Chemistry {
            msg: format!("Error parsing peptide sequence {sequence}: {e:?}"),
        })?;
    let peptide = peptide.as_linear().ok_or_else(|| FragSeekError::Chemistry {
        msg: format!("{sequence} is not a linear peptide"),
    })?;
    let formulas = peptide.formulas();
    if formulas.len() != 1 {
        return Err(FragSeekError::Chemistry {
            msg: format!("{sequence} has {} possible formulas, expected one", formulas.len()),
        });
    }
    Ok(formulas[0].monoisotopic_mass().value)
}

fn single_residue_mass(aa: u8) -> Result<f64> {
    let one = (aa as char).to_string();
    let two = one.repeat(2);
    Ok(proforma_mass(&two)? - proforma_mass(&one)?)
}

/// Mass shift of a named modification at `target`, looked up in the
/// ontologies known to rustyms (UniMod and PSI-MOD).
pub fn named_modification_delta(name: &str, target: ModificationTarget) -> Result<f64> {
    let (modified, plain) = match target {
        ModificationTarget::Residue(aa) => {
            let aa = aa as char;
            (format!("{aa}[{name}]"), aa.to_string())
        }
        ModificationTarget::PeptideNTerm | ModificationTarget::ProteinNTerm => {
            (format!("[{name}]-G"), "G".to_string())
        }
        ModificationTarget::PeptideCTerm | ModificationTarget::ProteinCTerm => {
            (format!("G-[{name}]"), "G".to_string())
        }
    };
    Ok(proforma_mass(&modified)? - proforma_mass(&plain)?)
}

pub(crate) fn residue(aa: u8) -> Option<f64> {
    let aa = aa.to_ascii_uppercase();
    if !aa.is_ascii_uppercase() {
        return None;
    }
    MASSES.residues[(aa - b'A') as usize]
}

pub fn water_mass() -> f64 {
    MASSES.water
}

pub fn ammonia_mass() -> f64 {
    MASSES.ammonia
}

pub fn carbon_monoxide_mass() -> f64 {
    MASSES.carbon_monoxide
}

/// Mass of a hydrogen atom.
pub fn hydrogen_mass() -> f64 {
    MASSES.hydrogen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_molecules() {
        assert!((water_mass() - 18.0105646837).abs() < 1e-6);
        assert!((ammonia_mass() - 17.0265491015).abs() < 1e-6);
        assert!((carbon_monoxide_mass() - 27.9949146221).abs() < 1e-6);
        assert!((hydrogen_mass() - 1.00782503207).abs() < 1e-6);
    }

    #[test]
    fn test_residues_from_proforma() {
        assert!((residue(b'W').unwrap() - 186.07931298).abs() < 1e-6);
        assert_eq!(residue(b'I'), residue(b'L'));
        assert_eq!(residue(b'k'), residue(b'K'));
        assert!(residue(b'X').is_none());
        assert!(residue(b'*').is_none());
    }

    #[test]
    fn test_named_modifications() {
        let ox = named_modification_delta("Oxidation", ModificationTarget::Residue(b'M')).unwrap();
        assert!((ox - 15.994915).abs() < 1e-5);
        let acetyl = named_modification_delta("Acetyl", ModificationTarget::ProteinNTerm).unwrap();
        assert!((acetyl - 42.010565).abs() < 1e-5);
        let unknown = named_modification_delta("NotAModification", ModificationTarget::Residue(b'K'));
        assert!(matches!(unknown, Err(FragSeekError::Chemistry { .. })));
    }
}
