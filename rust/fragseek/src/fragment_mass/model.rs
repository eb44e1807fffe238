use super::ion_series::{
    IonKind,
    IonSeriesTerminality,
};
use serde::Serialize;

/// A theoretical fragment of a peptide.
///
/// `ordinal` is the number of residues the fragment contains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TheoreticalFragment {
    pub mass: f64,
    pub kind: IonKind,
    pub ordinal: u8,
}

/// Produces the theoretical fragments of a peptide from its residue masses.
///
/// Implementations receive the per-residue masses with modification and
/// terminal modification shifts already folded in and append neutral
/// (uncharged) fragment masses to `out`.
pub trait FragmentationModel: Send + Sync {
    fn fragments(&self, residue_masses: &[f64], out: &mut Vec<TheoreticalFragment>);

    /// Ion series this model emits.
    fn series(&self) -> &[IonKind];
}

/// Prefix/suffix cumulative-sum fragmentation for a fixed set of ion
/// series. Fragments of every length from 1 to `n - 1` are emitted.
///
/// ```
/// use fragseek::fragment_mass::{FragmentationModel, IonKind, StandardIonSeries};
///
/// let model = StandardIonSeries::new(vec![IonKind::B, IonKind::Y]);
/// let mut out = Vec::new();
/// model.fragments(&[100.0, 200.0, 300.0], &mut out);
/// // b1, b2, y1, y2
/// assert_eq!(out.len(), 4);
/// assert_eq!(out[1].mass, 300.0);
/// assert_eq!(out[1].ordinal, 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StandardIonSeries {
    series: Vec<IonKind>,
}

impl Default for StandardIonSeries {
    fn default() -> Self {
        Self::new(vec![IonKind::B, IonKind::Y])
    }
}

impl StandardIonSeries {
    pub fn new(mut series: Vec<IonKind>) -> Self {
        series.sort();
        series.dedup();
        Self { series }
    }
}

impl FragmentationModel for StandardIonSeries {
    fn fragments(&self, residue_masses: &[f64], out: &mut Vec<TheoreticalFragment>) {
        let n = residue_masses.len();
        if n < 2 {
            return;
        }
        // Ordinals are stored as u8, longer peptides only fragment up to 255.
        let max_ordinal = (n - 1).min(u8::MAX as usize);

        for kind in self.series.iter() {
            let offset = kind.offset();
            let mut cumulative = 0.0;
            match kind.terminality() {
                IonSeriesTerminality::NTerm => {
                    for (i, mass) in residue_masses.iter().take(max_ordinal).enumerate() {
                        cumulative += mass;
                        out.push(TheoreticalFragment {
                            mass: cumulative + offset,
                            kind: *kind,
                            ordinal: (i + 1) as u8,
                        });
                    }
                }
                IonSeriesTerminality::CTerm => {
                    for (i, mass) in residue_masses.iter().rev().take(max_ordinal).enumerate() {
                        cumulative += mass;
                        out.push(TheoreticalFragment {
                            mass: cumulative + offset,
                            kind: *kind,
                            ordinal: (i + 1) as u8,
                        });
                    }
                }
            }
        }
    }

    fn series(&self) -> &[IonKind] {
        &self.series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::water_mass;

    #[test]
    fn test_suffix_ions() {
        let model = StandardIonSeries::new(vec![IonKind::Y]);
        let mut out = Vec::new();
        model.fragments(&[100.0, 200.0, 300.0], &mut out);
        let masses: Vec<f64> = out.iter().map(|x| x.mass).collect();
        assert_eq!(masses, vec![300.0 + water_mass(), 500.0 + water_mass()]);
        assert_eq!(out[0].ordinal, 1);
    }

    #[test]
    fn test_single_residue_has_no_fragments() {
        let model = StandardIonSeries::default();
        let mut out = Vec::new();
        model.fragments(&[100.0], &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_series_deduplicated() {
        let model = StandardIonSeries::new(vec![IonKind::Y, IonKind::B, IonKind::Y]);
        assert_eq!(model.series(), &[IonKind::B, IonKind::Y]);
    }
}
