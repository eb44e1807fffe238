use crate::chemistry::{
    ammonia_mass,
    carbon_monoxide_mass,
    hydrogen_mass,
    water_mass,
};
use crate::errors::FragSeekError;
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Display;
use std::str::FromStr;

/// Refers to what terminus of the original peptide retains the
/// charge after a fragmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IonSeriesTerminality {
    NTerm,
    CTerm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IonKind {
    A,
    B,
    C,
    X,
    Y,
    Z,
}

impl IonKind {
    pub fn terminality(&self) -> IonSeriesTerminality {
        match self {
            IonKind::A | IonKind::B | IonKind::C => IonSeriesTerminality::NTerm,
            IonKind::X | IonKind::Y | IonKind::Z => IonSeriesTerminality::CTerm,
        }
    }

    /// Mass added to the summed residue masses of the fragment to obtain
    /// its neutral mass.
    pub fn offset(&self) -> f64 {
        match self {
            IonKind::A => -carbon_monoxide_mass(),
            IonKind::B => 0.0,
            IonKind::C => ammonia_mass(),
            // y + CO - H2
            IonKind::X => water_mass() + carbon_monoxide_mass() - 2.0 * hydrogen_mass(),
            IonKind::Y => water_mass(),
            // y - NH2
            IonKind::Z => water_mass() - ammonia_mass() + hydrogen_mass(),
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            IonKind::A => 'a',
            IonKind::B => 'b',
            IonKind::C => 'c',
            IonKind::X => 'x',
            IonKind::Y => 'y',
            IonKind::Z => 'z',
        }
    }
}

impl Display for IonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for IonKind {
    type Err = FragSeekError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(IonKind::A),
            "b" => Ok(IonKind::B),
            "c" => Ok(IonKind::C),
            "x" => Ok(IonKind::X),
            "y" => Ok(IonKind::Y),
            "z" => Ok(IonKind::Z),
            other => Err(FragSeekError::config(
                "ion_series",
                format!("unsupported ion type '{other}'"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for kind in [IonKind::A, IonKind::B, IonKind::C, IonKind::X, IonKind::Y, IonKind::Z] {
            assert_eq!(kind.to_string().parse::<IonKind>().unwrap(), kind);
        }
        assert!("w".parse::<IonKind>().is_err());
    }

    #[test]
    fn test_complementary_offsets() {
        // b + y of complementary fragments equals the precursor (residues + water)
        assert_eq!(IonKind::B.offset() + IonKind::Y.offset(), water_mass());
        // c + z and a + x pair up the same way, up to the transferred hydrogens
        let h2 = 2.0 * hydrogen_mass();
        assert!((IonKind::A.offset() + IonKind::X.offset() - (water_mass() - h2)).abs() < 1e-9);
        assert!((IonKind::Y.offset() - IonKind::Z.offset() - 16.01872406).abs() < 1e-6);
    }
}
