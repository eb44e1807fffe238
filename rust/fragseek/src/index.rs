//! Mass-sorted fragment index over a peptide catalog.
//!
//! Every fragment of every catalog peptide becomes a [`FragmentRecord`]. The
//! records are sorted by neutral mass so the fragments compatible with an
//! observed peak are a contiguous slice found by binary search. Records point
//! back into the catalog by position, which is why the index owns the catalog.

use crate::catalog::PeptideCatalog;
use crate::chemistry::PROTON;
use crate::errors::{
    FragSeekError,
    Result,
};
use crate::fragment_mass::{
    FragmentationModel,
    IonKind,
};
use crate::models::MassTolerance;
use crate::tags::MultiPeak;
use crate::utils::ranges::search_range_by_key;
use crate::utils::PeptideRange;
use rayon::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;
use std::ops::Range;
use std::time::Instant;
use tracing::{
    info,
    instrument,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FragmentRecord {
    /// Neutral fragment mass.
    pub mass: f64,
    pub peptide_idx: u32,
    /// Number of residues in the fragment.
    pub position: u8,
    pub kind: IonKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FragmentIndexConfig {
    /// Singly charged m/z window of the indexed fragments, inclusive.
    pub min_fragment_mz: f64,
    pub max_fragment_mz: f64,
    /// Fragments with fewer residues than this are not indexed.
    pub min_ion_ordinal: u8,
    pub max_fragments: usize,
}

impl Default for FragmentIndexConfig {
    fn default() -> Self {
        Self {
            min_fragment_mz: 150.0,
            max_fragment_mz: 2000.0,
            min_ion_ordinal: 1,
            max_fragments: 500_000_000,
        }
    }
}

impl FragmentIndexConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.min_fragment_mz.is_finite() && self.min_fragment_mz > 0.0) {
            return Err(FragSeekError::config(
                "fragment_index.min_fragment_mz",
                format!("must be positive, got {}", self.min_fragment_mz),
            ));
        }
        if !(self.max_fragment_mz.is_finite() && self.max_fragment_mz > self.min_fragment_mz) {
            return Err(FragSeekError::config(
                "fragment_index.max_fragment_mz",
                format!(
                    "must be larger than min_fragment_mz ({}), got {}",
                    self.min_fragment_mz, self.max_fragment_mz
                ),
            ));
        }
        if self.max_fragments == 0 {
            return Err(FragSeekError::config(
                "fragment_index.max_fragments",
                "budget must be positive",
            ));
        }
        Ok(())
    }
}

/// Evidence from one query for a single peptide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hit {
    pub peptide_idx: u32,
    pub score: f64,
    pub matched: u32,
}

#[derive(Debug, Clone)]
pub struct FragmentIndex {
    catalog: PeptideCatalog,
    records: Vec<FragmentRecord>,
    series: Vec<IonKind>,
}

impl FragmentIndex {
    #[instrument(skip_all, fields(n_peptides = catalog.len()))]
    pub fn build(
        catalog: PeptideCatalog,
        config: &FragmentIndexConfig,
        model: &dyn FragmentationModel,
    ) -> Result<Self> {
        config.validate()?;
        if model.series().is_empty() {
            return Err(FragSeekError::config(
                "ion_series",
                "at least one ion series is required",
            ));
        }
        if catalog.len() > u32::MAX as usize {
            return Err(FragSeekError::ResourceExhaustion {
                resource: "peptides",
                required: catalog.len(),
                budget: u32::MAX as usize,
            });
        }

        let start = Instant::now();
        let min_mass = config.min_fragment_mz - PROTON;
        let max_mass = config.max_fragment_mz - PROTON;
        let mut records: Vec<FragmentRecord> = catalog
            .peptides()
            .par_iter()
            .enumerate()
            .map_init(
                || (Vec::new(), Vec::new()),
                |(residue_masses, fragments), (idx, peptide)| {
                    catalog.residue_masses(peptide, residue_masses);
                    fragments.clear();
                    model.fragments(residue_masses, fragments);
                    fragments
                        .iter()
                        .filter(|f| {
                            f.ordinal >= config.min_ion_ordinal
                                && f.mass >= min_mass
                                && f.mass <= max_mass
                        })
                        .map(|f| FragmentRecord {
                            mass: f.mass,
                            peptide_idx: idx as u32,
                            position: f.ordinal,
                            kind: f.kind,
                        })
                        .collect::<Vec<_>>()
                },
            )
            .flatten()
            .collect();

        if records.len() > config.max_fragments {
            return Err(FragSeekError::ResourceExhaustion {
                resource: "fragments",
                required: records.len(),
                budget: config.max_fragments,
            });
        }

        records.par_sort_unstable_by(|a, b| {
            a.mass
                .total_cmp(&b.mass)
                .then_with(|| a.peptide_idx.cmp(&b.peptide_idx))
                .then_with(|| a.kind.cmp(&b.kind))
                .then_with(|| a.position.cmp(&b.position))
        });
        info!(
            "Indexed {} fragments for {} peptides in {:?}",
            records.len(),
            catalog.len(),
            start.elapsed()
        );

        Ok(Self {
            catalog,
            records,
            series: model.series().to_vec(),
        })
    }

    pub fn catalog(&self) -> &PeptideCatalog {
        &self.catalog
    }

    pub fn records(&self) -> &[FragmentRecord] {
        &self.records
    }

    pub fn series(&self) -> &[IonKind] {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get_peptide_range(&self, mass: f64, tolerance: &MassTolerance) -> PeptideRange {
        self.catalog.get_peptide_range(mass, tolerance)
    }

    /// Positions of the records within tolerance of `mass`.
    pub fn fragment_range(&self, mass: f64, tolerance: &MassTolerance) -> Range<usize> {
        let (lo, hi) = tolerance.range(mass);
        search_range_by_key(&self.records, lo, hi, |r| r.mass)
    }

    /// Records within tolerance of `mass` belonging to a peptide in `range`,
    /// with their mass-accuracy weight.
    fn matching_records<'a>(
        &'a self,
        mass: f64,
        range: PeptideRange,
        tolerance: &'a MassTolerance,
    ) -> impl Iterator<Item = (&'a FragmentRecord, f64)> + 'a {
        let width = tolerance.width_at(mass);
        self.records[self.fragment_range(mass, tolerance)]
            .iter()
            .filter(move |r| range.contains(r.peptide_idx as usize))
            .map(move |r| (r, accuracy_weight(r.mass - mass, width)))
    }

    /// Appends one [`Hit`] per peptide in `peptide_range` that explains the
    /// tag.
    ///
    /// A peptide explains a consecutive pair of tag peaks when it has
    /// fragments of the same ion series within tolerance of both peaks whose
    /// residue counts differ by exactly the residue count of the connecting
    /// edge. The hit counts the tag peaks taking part in at least one such
    /// pair and sums, over those peaks, `1 - |error| / tolerance` of the
    /// best matching fragment. Hits are appended in ascending peptide order.
    pub fn query(
        &self,
        out: &mut Vec<Hit>,
        tag: &MultiPeak,
        peptide_range: PeptideRange,
        fragment_tolerance: &MassTolerance,
    ) {
        if peptide_range.is_empty() || tag.len() < 2 {
            return;
        }

        // (peptide, series, position) -> weight, sorted for lookups
        let per_peak: Vec<Vec<(u32, IonKind, u8, f64)>> = tag
            .masses()
            .iter()
            .map(|mass| {
                let mut matches: Vec<(u32, IonKind, u8, f64)> = self
                    .matching_records(*mass, peptide_range, fragment_tolerance)
                    .map(|(r, w)| (r.peptide_idx, r.kind, r.position, w))
                    .collect();
                matches.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));
                matches
            })
            .collect();

        let mut evidence: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        for (j, step) in tag.steps().iter().enumerate() {
            let (left, right) = (&per_peak[j], &per_peak[j + 1]);
            for &(peptide_idx, kind, position, left_weight) in left.iter() {
                let Some(target) = position.checked_add(*step) else {
                    continue;
                };
                let Ok(found) = right.binary_search_by(|(p, k, pos, _)| {
                    (*p, *k, *pos).cmp(&(peptide_idx, kind, target))
                }) else {
                    continue;
                };
                let right_weight = right[found].3;
                let weights = evidence
                    .entry(peptide_idx)
                    .or_insert_with(|| vec![f64::NEG_INFINITY; tag.len()]);
                weights[j] = weights[j].max(left_weight);
                weights[j + 1] = weights[j + 1].max(right_weight);
            }
        }

        out.extend(evidence.into_iter().map(|(peptide_idx, weights)| {
            let (matched, score) = weights
                .iter()
                .filter(|w| w.is_finite())
                .fold((0u32, 0.0), |(n, s), w| (n + 1, s + w));
            Hit {
                peptide_idx,
                score,
                matched,
            }
        }));
    }

    /// Appends one [`Hit`] per peptide in `peptide_range` with at least one
    /// fragment matching one of `masses`.
    ///
    /// Every observed mass counts once per peptide, weighted by its best
    /// matching fragment. Used for spectra that yield no tags.
    pub fn query_peaks(
        &self,
        out: &mut Vec<Hit>,
        masses: &[f64],
        peptide_range: PeptideRange,
        fragment_tolerance: &MassTolerance,
    ) {
        if peptide_range.is_empty() {
            return;
        }
        let mut evidence: BTreeMap<u32, (u32, f64)> = BTreeMap::new();
        let mut local: Vec<(u32, f64)> = Vec::new();
        for mass in masses.iter() {
            local.clear();
            local.extend(
                self.matching_records(*mass, peptide_range, fragment_tolerance)
                    .map(|(r, w)| (r.peptide_idx, w)),
            );
            local.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.total_cmp(&a.1)));
            local.dedup_by_key(|x| x.0);
            for (peptide_idx, weight) in local.iter() {
                let entry = evidence.entry(*peptide_idx).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += weight;
            }
        }
        out.extend(
            evidence
                .into_iter()
                .map(|(peptide_idx, (matched, score))| Hit {
                    peptide_idx,
                    score,
                    matched,
                }),
        );
    }
}

fn accuracy_weight(error: f64, width: f64) -> f64 {
    if width > 0.0 {
        (1.0 - error.abs() / width).max(0.0)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::ModificationSet;
    use crate::fragment_mass::StandardIonSeries;
    use crate::models::{
        DigestionConfig,
        Enzyme,
        Protein,
    };

    fn build_index(proteins: Vec<Protein>) -> FragmentIndex {
        let digestion = DigestionConfig {
            enzyme: Enzyme::Trypsin,
            max_missed_cleavages: 0,
            min_length: 4,
            max_length: 30,
            ..Default::default()
        };
        let mods = ModificationSet::new(vec![], vec![], 0).unwrap();
        let catalog = PeptideCatalog::build(proteins, &digestion, mods).unwrap();
        FragmentIndex::build(
            catalog,
            &FragmentIndexConfig::default(),
            &StandardIonSeries::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_records_sorted_and_valid() {
        let index = build_index(vec![Protein::new("P1", "PEPTIDEKAAGGLLRCCDDWWK")]);
        assert!(!index.is_empty());
        assert!(index.records().windows(2).all(|w| w[0].mass <= w[1].mass));
        assert!(index
            .records()
            .iter()
            .all(|r| (r.peptide_idx as usize) < index.catalog().len()));
        assert!(index.records().iter().all(|r| {
            let mz = r.mass + PROTON;
            (150.0..=2000.0).contains(&mz)
        }));
    }

    #[test]
    fn test_invalid_config() {
        let mods = ModificationSet::new(vec![], vec![], 0).unwrap();
        let catalog = PeptideCatalog::build(vec![], &DigestionConfig::default(), mods).unwrap();
        let config = FragmentIndexConfig {
            min_fragment_mz: 2000.0,
            max_fragment_mz: 150.0,
            ..Default::default()
        };
        assert!(matches!(
            FragmentIndex::build(catalog.clone(), &config, &StandardIonSeries::default()),
            Err(FragSeekError::Configuration { .. })
        ));
        assert!(FragmentIndex::build(
            catalog,
            &FragmentIndexConfig::default(),
            &StandardIonSeries::new(vec![])
        )
        .is_err());
    }

    #[test]
    fn test_fragment_budget() {
        let mods = ModificationSet::new(vec![], vec![], 0).unwrap();
        let catalog = PeptideCatalog::build(
            vec![Protein::new("P1", "PEPTIDEK")],
            &DigestionConfig::default(),
            mods,
        )
        .unwrap();
        let config = FragmentIndexConfig {
            max_fragments: 1,
            ..Default::default()
        };
        assert!(matches!(
            FragmentIndex::build(catalog, &config, &StandardIonSeries::default()),
            Err(FragSeekError::ResourceExhaustion { .. })
        ));
    }

    #[test]
    fn test_query_peaks_counts_each_mass_once() {
        let index = build_index(vec![Protein::new("P1", "PEPTIDEK")]);
        let all = PeptideRange::new(0, index.catalog().len());
        let masses: Vec<f64> = index.records().iter().map(|r| r.mass).collect();
        let mut hits = Vec::new();
        index.query_peaks(&mut hits, &masses, all, &MassTolerance::Ppm(5.0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].matched as usize, masses.len());
        assert!((hits[0].score - masses.len() as f64).abs() < 1e-9);

        hits.clear();
        index.query_peaks(&mut hits, &masses, PeptideRange::new(0, 0), &MassTolerance::Ppm(5.0));
        assert!(hits.is_empty());
    }

    #[test]
    fn test_accuracy_weight() {
        assert_eq!(accuracy_weight(0.0, 0.1), 1.0);
        assert!((accuracy_weight(0.05, 0.1) - 0.5).abs() < 1e-12);
        assert_eq!(accuracy_weight(0.0, 0.0), 1.0);
    }
}
