//! End to end search of spectra against a protein database.
//!
//! A [`SearchEngine`] starts unbuilt. [`SearchEngine::build`] digests the
//! proteins and freezes the resulting [`FragmentIndex`] behind an [`Arc`];
//! from then on any number of threads can search against it.

use crate::catalog::{
    MAX_VARIABLE_MODS,
    PeptideCatalog,
};
use crate::chemistry::{
    C13_C12_DIFF,
    ModificationSet,
    PROTON,
    neutral_mass_to_mz,
};
use crate::errors::{
    FragSeekError,
    Result,
};
use crate::fragment_mass::{
    FragmentationModel,
    IonKind,
    StandardIonSeries,
    TheoreticalFragment,
};
use crate::index::{
    FragmentIndex,
    FragmentIndexConfig,
    Hit,
};
use crate::models::tolerance::ppm_error;
use crate::models::{
    DigestionConfig,
    MassTolerance,
    Protein,
    Spectrum,
};
use crate::preprocessing::{
    PreprocessingConfig,
    preprocess,
};
use crate::scoring::accumulator::SearchAccumulator;
use crate::scoring::hyperscore::{
    PsmDetail,
    TheoreticalPeak,
    hyperscore,
};
use crate::scoring::{
    FragmentIndexScorer,
    PeptideSpectrumMatch,
    RankedHit,
    ScoringFunction,
    SearchTimings,
    TagHyperscore,
};
use crate::tags::{
    MultiPeak,
    ResidueAlphabet,
    TagConfig,
    TagGenerator,
};
use crate::utils::PeptideRange;
use rayon::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{
    debug,
    info,
    instrument,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub digestion: DigestionConfig,
    pub fixed_modifications: Vec<String>,
    pub variable_modifications: Vec<String>,
    pub max_variable_mods: usize,
    pub fragment_index: FragmentIndexConfig,
    pub ion_series: Vec<IonKind>,
    pub preprocessing: PreprocessingConfig,
    pub tags: TagConfig,
    pub precursor_tolerance: MassTolerance,
    pub fragment_tolerance: MassTolerance,
    /// Charges tried when a spectrum has no precursor charge.
    pub min_charge: u8,
    pub max_charge: u8,
    /// Precursor isotope errors to correct for, in units of 13C spacing.
    pub isotope_offsets: Vec<i8>,
    /// Highest fragment charge used for rescoring.
    pub max_fragment_charge: u8,
    /// Ranked candidates rescored with the hyperscore.
    pub max_candidates: usize,
    /// Matches reported per spectrum.
    pub report_top_hits: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            digestion: DigestionConfig::default(),
            fixed_modifications: vec!["Carbamidomethyl (C)".to_string()],
            variable_modifications: vec!["Oxidation (M)".to_string()],
            max_variable_mods: 2,
            fragment_index: FragmentIndexConfig::default(),
            ion_series: vec![IonKind::B, IonKind::Y],
            preprocessing: PreprocessingConfig::default(),
            tags: TagConfig::default(),
            precursor_tolerance: MassTolerance::Ppm(10.0),
            fragment_tolerance: MassTolerance::Ppm(10.0),
            min_charge: 2,
            max_charge: 5,
            isotope_offsets: vec![0, 1],
            max_fragment_charge: 2,
            max_candidates: 50,
            report_top_hits: 1,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        self.digestion.validate()?;
        self.fragment_index.validate()?;
        self.preprocessing.validate()?;
        self.tags.validate()?;
        self.precursor_tolerance.validate("precursor_tolerance")?;
        self.fragment_tolerance.validate("fragment_tolerance")?;
        if self.max_variable_mods > MAX_VARIABLE_MODS {
            return Err(FragSeekError::config(
                "max_variable_mods",
                format!("at most {MAX_VARIABLE_MODS} are supported"),
            ));
        }
        if self.ion_series.is_empty() {
            return Err(FragSeekError::config(
                "ion_series",
                "at least one ion series is required",
            ));
        }
        if self.min_charge == 0 || self.max_charge < self.min_charge {
            return Err(FragSeekError::config(
                "charge",
                format!(
                    "expected 1 <= min_charge <= max_charge, got {}..={}",
                    self.min_charge, self.max_charge
                ),
            ));
        }
        if self.isotope_offsets.is_empty() {
            return Err(FragSeekError::config(
                "isotope_offsets",
                "at least one offset (usually 0) is required",
            ));
        }
        if self.max_fragment_charge == 0 {
            return Err(FragSeekError::config(
                "max_fragment_charge",
                "must be at least 1",
            ));
        }
        if self.max_candidates == 0 || self.report_top_hits == 0 {
            return Err(FragSeekError::config(
                "report_top_hits",
                "candidate and report limits must be positive",
            ));
        }
        Ok(())
    }
}

/// Everything a parallel search over many spectra produced.
#[derive(Debug, Default, Serialize)]
pub struct SearchOutcome {
    /// Matches in input spectrum order, best rank first within a spectrum.
    pub matches: Vec<PeptideSpectrumMatch>,
    pub timings: SearchTimings,
    pub n_searched: usize,
    pub n_failed: usize,
}

#[derive(Debug)]
enum EngineState {
    Unbuilt,
    Built(Arc<FragmentIndex>),
}

/// Precursor hypothesis a peptide range was opened for.
#[derive(Debug, Clone, Copy)]
struct PrecursorWindow {
    range: PeptideRange,
    charge: u8,
    isotope_offset: i8,
    /// Observed neutral mass corrected for the isotope offset.
    mass: f64,
}

pub struct SearchEngine<S: ScoringFunction = TagHyperscore> {
    config: SearchConfig,
    modifications: ModificationSet,
    alphabet: ResidueAlphabet,
    model: StandardIonSeries,
    scorer: FragmentIndexScorer<S>,
    state: EngineState,
}

impl SearchEngine<TagHyperscore> {
    pub fn new(config: SearchConfig) -> Result<Self> {
        Self::with_scoring(config, TagHyperscore)
    }
}

impl<S: ScoringFunction> SearchEngine<S> {
    pub fn with_scoring(config: SearchConfig, scoring: S) -> Result<Self> {
        config.validate()?;
        let modifications = ModificationSet::from_identifiers(
            &config.fixed_modifications,
            &config.variable_modifications,
            config.max_variable_mods,
        )?;
        let alphabet = ResidueAlphabet::new(&modifications, config.tags.max_edge_residues);
        let model = StandardIonSeries::new(config.ion_series.clone());
        Ok(Self {
            config,
            modifications,
            alphabet,
            model,
            scorer: FragmentIndexScorer::new(scoring),
            state: EngineState::Unbuilt,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn is_built(&self) -> bool {
        matches!(self.state, EngineState::Built(_))
    }

    /// Builds the catalog and fragment index. Can only be called once.
    #[instrument(skip_all, fields(n_proteins = proteins.len()))]
    pub fn build(&mut self, proteins: Vec<Protein>) -> Result<()> {
        if self.is_built() {
            return Err(FragSeekError::InvalidState {
                operation: "build",
                expected: "an engine that has not been built yet",
            });
        }
        let catalog = PeptideCatalog::build(
            proteins,
            &self.config.digestion,
            self.modifications.clone(),
        )?;
        let index = FragmentIndex::build(catalog, &self.config.fragment_index, &self.model)?;
        self.state = EngineState::Built(Arc::new(index));
        Ok(())
    }

    pub fn index(&self) -> Result<&Arc<FragmentIndex>> {
        match &self.state {
            EngineState::Built(index) => Ok(index),
            EngineState::Unbuilt => Err(FragSeekError::InvalidState {
                operation: "index",
                expected: "a built engine",
            }),
        }
    }

    pub fn search_spectrum(&self, spectrum: &Spectrum) -> Result<Vec<PeptideSpectrumMatch>> {
        let mut timings = SearchTimings::default();
        self.search_spectrum_timed(spectrum, &mut timings)
    }

    /// Searches every spectrum in parallel. Spectra that fail are logged
    /// and counted in [`SearchOutcome::n_failed`].
    #[instrument(skip_all, fields(n_spectra = spectra.len()))]
    pub fn search(&self, spectra: &[Spectrum]) -> Result<SearchOutcome> {
        self.index().map_err(|_| FragSeekError::InvalidState {
            operation: "search",
            expected: "a built engine",
        })?;
        let start = Instant::now();
        let acc: SearchAccumulator = spectra
            .par_iter()
            .enumerate()
            .map(|(position, spectrum)| {
                let mut timings = SearchTimings::default();
                let result = self.search_spectrum_timed(spectrum, &mut timings);
                (position, spectrum.id.clone(), result, timings)
            })
            .collect();

        let mut per_spectrum = acc.matches;
        per_spectrum.sort_by_key(|(position, _)| *position);
        let matches: Vec<PeptideSpectrumMatch> =
            per_spectrum.into_iter().flat_map(|(_, m)| m).collect();
        info!(
            "Searched {} spectra ({} failed) in {:?}, {} matches",
            acc.n_searched,
            acc.n_failed,
            start.elapsed(),
            matches.len()
        );
        Ok(SearchOutcome {
            matches,
            timings: acc.timings,
            n_searched: acc.n_searched,
            n_failed: acc.n_failed,
        })
    }

    fn search_spectrum_timed(
        &self,
        spectrum: &Spectrum,
        timings: &mut SearchTimings,
    ) -> Result<Vec<PeptideSpectrumMatch>> {
        let index = self.index().map_err(|_| FragSeekError::InvalidState {
            operation: "search_spectrum",
            expected: "a built engine",
        })?;

        let start = Instant::now();
        let processed = preprocess(spectrum, &self.config.preprocessing);
        let windows = self.precursor_windows(index, &processed);
        timings.preprocess += start.elapsed();
        if windows.is_empty() || processed.peaks.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let tags = self.generate_tags(&processed)?;
        timings.tagging += start.elapsed();

        let start = Instant::now();
        // Windows of different charge or isotope hypotheses may overlap; each
        // peptide is queried once.
        let ranges = PeptideRange::merge_all(windows.iter().map(|w| w.range));
        let mut hits: Vec<Hit> = Vec::new();
        for range in ranges.iter() {
            for tag in tags.iter() {
                index.query(&mut hits, tag, *range, &self.config.fragment_tolerance);
            }
        }
        if hits.is_empty() {
            let masses: Vec<f64> = processed.peaks.iter().map(|p| p.mz - PROTON).collect();
            for range in ranges.iter() {
                index.query_peaks(&mut hits, &masses, *range, &self.config.fragment_tolerance);
            }
        }
        let mut ranked = self.scorer.score(&hits);
        ranked.truncate(self.config.max_candidates);
        timings.query += start.elapsed();
        debug!(
            "Spectrum {}: {} tags, {} hits, {} candidates",
            spectrum.id,
            tags.len(),
            hits.len(),
            ranked.len()
        );

        let start = Instant::now();
        let matches = self.rescore(index, &processed, &windows, &ranked)?;
        timings.rescore += start.elapsed();
        Ok(matches)
    }

    fn precursor_windows(&self, index: &FragmentIndex, spectrum: &Spectrum) -> Vec<PrecursorWindow> {
        let charges: Vec<u8> = if spectrum.has_known_charge() {
            vec![spectrum.precursor_charge]
        } else {
            (self.config.min_charge..=self.config.max_charge).collect()
        };

        let mut windows: Vec<PrecursorWindow> = Vec::new();
        for charge in charges {
            for offset in self.config.isotope_offsets.iter() {
                let mass = spectrum.precursor_mass(charge) - *offset as f64 * C13_C12_DIFF;
                let range = index.get_peptide_range(mass, &self.config.precursor_tolerance);
                if range.is_empty() || windows.iter().any(|w| w.range == range) {
                    continue;
                }
                windows.push(PrecursorWindow {
                    range,
                    charge,
                    isotope_offset: *offset,
                    mass,
                });
            }
        }
        windows
    }

    fn generate_tags(&self, spectrum: &Spectrum) -> Result<Vec<MultiPeak>> {
        let highest_mz = spectrum.peaks.last().map_or(0.0, |p| p.mz);
        // Both peaks of an edge carry a mass error.
        let tolerance_da = 2.0 * self.config.fragment_tolerance.width_at(highest_mz);

        let mut generator = TagGenerator::new(spectrum, &self.config.tags, &self.alphabet)?;
        generator.global_selection()?;
        generator.local_selection()?;
        generator.generate_directed_acyclic_graph(tolerance_da)?;
        let mut tags = Vec::new();
        generator.generate_all_multi_peaks(&mut tags)?;
        Ok(tags)
    }

    fn theoretical_spectrum(
        &self,
        residue_masses: &[f64],
        charge: u8,
        fragments: &mut Vec<TheoreticalFragment>,
    ) -> Vec<TheoreticalPeak> {
        fragments.clear();
        self.model.fragments(residue_masses, fragments);
        let fragments: &[TheoreticalFragment] = fragments;
        let max_fragment_charge = charge.saturating_sub(1).clamp(1, self.config.max_fragment_charge);
        let mut peaks: Vec<TheoreticalPeak> = (1..=max_fragment_charge)
            .flat_map(|z| {
                fragments.iter().map(move |f| TheoreticalPeak {
                    mz: neutral_mass_to_mz(f.mass, z),
                    terminality: f.kind.terminality(),
                })
            })
            .collect();
        peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));
        peaks
    }

    fn rescore(
        &self,
        index: &FragmentIndex,
        spectrum: &Spectrum,
        windows: &[PrecursorWindow],
        ranked: &[RankedHit],
    ) -> Result<Vec<PeptideSpectrumMatch>> {
        let catalog = index.catalog();
        let mut residue_masses = Vec::new();
        let mut fragments = Vec::new();

        let mut scored: Vec<(&RankedHit, &PrecursorWindow, PsmDetail)> = Vec::new();
        for candidate in ranked.iter() {
            let peptide_idx = candidate.peptide_idx as usize;
            let Some(window) = windows.iter().find(|w| w.range.contains(peptide_idx)) else {
                continue;
            };
            let peptide = catalog.at(peptide_idx)?;
            catalog.residue_masses(peptide, &mut residue_masses);
            let theoretical = self.theoretical_spectrum(&residue_masses, window.charge, &mut fragments);
            let detail = hyperscore(&spectrum.peaks, &theoretical, &self.config.fragment_tolerance);
            if detail.hyperscore > 0.0 {
                scored.push((candidate, window, detail));
            }
        }

        scored.sort_by(|a, b| {
            b.2.hyperscore
                .total_cmp(&a.2.hyperscore)
                .then_with(|| b.0.score.total_cmp(&a.0.score))
                .then_with(|| a.0.peptide_idx.cmp(&b.0.peptide_idx))
        });
        scored.truncate(self.config.report_top_hits);

        scored
            .into_iter()
            .enumerate()
            .map(|(rank, (candidate, window, detail))| {
                let peptide_idx = candidate.peptide_idx as usize;
                let peptide = catalog.at(peptide_idx)?;
                let len = peptide.len().max(1) as f64;
                Ok(PeptideSpectrumMatch {
                    spectrum_id: spectrum.id.clone(),
                    rank: rank as u32 + 1,
                    peptide: catalog.sequence_string(peptide_idx)?,
                    stripped_sequence: peptide.form.stripped_sequence(),
                    protein: catalog.accession(peptide)?,
                    is_decoy: peptide.decoy.is_decoy(),
                    charge: window.charge,
                    isotope_offset: window.isotope_offset,
                    rt: spectrum.rt,
                    precursor_mz: spectrum.precursor_mz,
                    calculated_mass: peptide.monoisotopic,
                    precursor_error_ppm: ppm_error(peptide.monoisotopic, window.mass),
                    hyperscore: detail.hyperscore,
                    tag_score: candidate.score,
                    matched_tag_peaks: candidate.matched,
                    matched_nterm: detail.matched_nterm,
                    matched_cterm: detail.matched_cterm,
                    prefix_fraction: (detail.matched_nterm as f64 / len).min(1.0),
                    suffix_fraction: (detail.matched_cterm as f64 / len).min(1.0),
                    median_fragment_error_ppm: detail.median_abs_error_ppm,
                    peptide_idx: candidate.peptide_idx,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Peak;

    fn small_config() -> SearchConfig {
        SearchConfig {
            digestion: DigestionConfig {
                min_length: 5,
                ..Default::default()
            },
            fixed_modifications: vec![],
            variable_modifications: vec![],
            max_variable_mods: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_search_before_build_is_invalid_state() {
        let engine = SearchEngine::new(small_config()).unwrap();
        let spectrum = Spectrum::new("s", 500.0, 2, None, vec![]);
        assert!(matches!(
            engine.search_spectrum(&spectrum),
            Err(FragSeekError::InvalidState { .. })
        ));
        assert!(matches!(
            engine.search(&[spectrum]),
            Err(FragSeekError::InvalidState { .. })
        ));
        assert!(engine.index().is_err());
    }

    #[test]
    fn test_build_once() {
        let mut engine = SearchEngine::new(small_config()).unwrap();
        engine.build(vec![Protein::new("P1", "PEPTIDEKAAGGLLR")]).unwrap();
        assert!(engine.is_built());
        assert!(matches!(
            engine.build(vec![]),
            Err(FragSeekError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_invalid_configs() {
        let bad = SearchConfig {
            min_charge: 3,
            max_charge: 2,
            ..Default::default()
        };
        assert!(SearchEngine::new(bad).is_err());
        let bad = SearchConfig {
            fragment_tolerance: MassTolerance::Ppm(-1.0),
            ..Default::default()
        };
        assert!(SearchEngine::new(bad).is_err());
        let bad = SearchConfig {
            fixed_modifications: vec!["NotAMod (C)".to_string()],
            ..Default::default()
        };
        assert!(SearchEngine::new(bad).is_err());
    }

    #[test]
    fn test_spectrum_without_candidates() {
        let mut engine = SearchEngine::new(small_config()).unwrap();
        engine.build(vec![Protein::new("P1", "PEPTIDEKAAGGLLR")]).unwrap();
        let spectrum = Spectrum::new(
            "far",
            5000.0,
            2,
            None,
            vec![Peak {
                mz: 300.0,
                intensity: 1.0,
            }],
        );
        assert!(engine.search_spectrum(&spectrum).unwrap().is_empty());
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = SearchConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: SearchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
        let partial: SearchConfig =
            serde_json::from_str(r#"{"precursor_tolerance": {"da": 0.5}}"#).unwrap();
        assert_eq!(partial.precursor_tolerance, MassTolerance::Absolute(0.5));
        assert_eq!(partial.max_charge, 5);
    }
}
