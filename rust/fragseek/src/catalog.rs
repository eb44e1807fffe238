//! Candidate peptide enumeration.
//!
//! The catalog digests the input proteins, places modifications, adds decoys
//! and stores the resulting peptides sorted by neutral monoisotopic mass so
//! precursor windows resolve with a binary search.

use crate::chemistry::residues::all_residues_known;
use crate::chemistry::ModificationSet;
use crate::errors::{
    FragSeekError,
    Result,
};
use crate::models::decoy::DECOY_PREFIX;
use crate::models::{
    DecoyMarking,
    DigestionConfig,
    MassTolerance,
    Peptide,
    Peptidoform,
    Protein,
};
use crate::utils::ranges::search_range_by_key;
use crate::utils::PeptideRange;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{
    debug,
    info,
    instrument,
};

/// Largest number of simultaneous variable modifications accepted.
pub const MAX_VARIABLE_MODS: usize = 5;

#[derive(Debug, Clone)]
pub struct PeptideCatalog {
    proteins: Vec<Protein>,
    peptides: Vec<Peptide>,
    modifications: ModificationSet,
}

impl PeptideCatalog {
    /// Digests, modifies and mass-sorts every peptide of `proteins`.
    ///
    /// Identical peptidoforms coming from several proteins are stored once,
    /// attributed to the lowest protein index. Equal masses are ordered by
    /// decoy marking, then by sequence and modifications, so two builds over
    /// the same input produce the same catalog.
    #[instrument(skip_all, fields(n_proteins = proteins.len()))]
    pub fn build(
        proteins: Vec<Protein>,
        config: &DigestionConfig,
        modifications: ModificationSet,
    ) -> Result<Self> {
        config.validate()?;
        if modifications.max_variable_mods() > MAX_VARIABLE_MODS {
            return Err(FragSeekError::config(
                "max_variable_mods",
                format!(
                    "{} simultaneous variable modifications requested, at most {} are supported",
                    modifications.max_variable_mods(),
                    MAX_VARIABLE_MODS
                ),
            ));
        }
        if proteins.len() > u32::MAX as usize {
            return Err(FragSeekError::ResourceExhaustion {
                resource: "proteins",
                required: proteins.len(),
                budget: u32::MAX as usize,
            });
        }

        let start = Instant::now();
        let per_protein: Vec<Vec<Peptide>> = proteins
            .par_iter()
            .enumerate()
            .map(|(i, protein)| digest_protein(i as u32, protein, config, &modifications))
            .collect();
        let n_digested: usize = per_protein.iter().map(|x| x.len()).sum();
        debug!("Digested {} peptidoforms in {:?}", n_digested, start.elapsed());

        let mut seen: HashSet<Peptidoform> = HashSet::new();
        let mut peptides: Vec<Peptide> = Vec::new();
        for peptide in per_protein.into_iter().flatten() {
            if seen.insert(peptide.form.clone()) {
                peptides.push(peptide);
                check_budget(peptides.len(), config.max_peptides)?;
            }
        }
        let n_targets = peptides.len();

        if config.build_decoys {
            let mut decoys = Vec::new();
            let mut seen_decoys: HashSet<Peptidoform> = HashSet::new();
            for target in peptides.iter() {
                let form = target.form.as_decoy();
                if seen.contains(&form) || !seen_decoys.insert(form.clone()) {
                    continue;
                }
                decoys.push(Peptide {
                    form,
                    decoy: DecoyMarking::Decoy,
                    ..target.clone()
                });
                check_budget(n_targets + decoys.len(), config.max_peptides)?;
            }
            peptides.extend(decoys);
        }

        peptides.par_sort_unstable_by(catalog_order);
        info!(
            "Built peptide catalog with {} targets and {} decoys from {} proteins in {:?}",
            n_targets,
            peptides.len() - n_targets,
            proteins.len(),
            start.elapsed()
        );

        Ok(Self {
            proteins,
            peptides,
            modifications,
        })
    }

    /// Peptides whose mass lies in the closed window `[mass - tol, mass + tol]`.
    ///
    /// Never fails; a window matching nothing gives an empty range.
    pub fn get_peptide_range(&self, mass: f64, tolerance: &MassTolerance) -> PeptideRange {
        let (lo, hi) = tolerance.range(mass);
        let range = search_range_by_key(&self.peptides, lo, hi, |p| p.monoisotopic);
        PeptideRange::new(range.start, range.end)
    }

    pub fn at(&self, idx: usize) -> Result<&Peptide> {
        self.peptides
            .get(idx)
            .ok_or(FragSeekError::IndexOutOfRange {
                index: idx,
                len: self.peptides.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.peptides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peptides.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Peptide> {
        self.peptides.iter()
    }

    pub fn peptides(&self) -> &[Peptide] {
        &self.peptides
    }

    pub fn proteins(&self) -> &[Protein] {
        &self.proteins
    }

    pub fn modifications(&self) -> &ModificationSet {
        &self.modifications
    }

    pub fn protein(&self, protein_idx: u32) -> Result<&Protein> {
        self.proteins
            .get(protein_idx as usize)
            .ok_or(FragSeekError::IndexOutOfRange {
                index: protein_idx as usize,
                len: self.proteins.len(),
            })
    }

    /// Accession of the protein a peptide came from, prefixed for decoys.
    pub fn accession(&self, peptide: &Peptide) -> Result<String> {
        let protein = self.protein(peptide.protein_idx)?;
        Ok(match peptide.decoy {
            DecoyMarking::Target => protein.accession.clone(),
            DecoyMarking::Decoy => format!("{}{}", DECOY_PREFIX, protein.accession),
        })
    }

    pub fn sequence_string(&self, idx: usize) -> Result<String> {
        Ok(self.at(idx)?.form.to_annotated_string(&self.modifications))
    }

    /// Per-residue masses with the terminal modifications folded into the
    /// first and last residue.
    pub fn residue_masses(&self, peptide: &Peptide, out: &mut Vec<f64>) {
        out.clear();
        out.extend(
            peptide
                .residues()
                .iter()
                .map(|r| self.modifications.residue_mass(r)),
        );
        if let Some(first) = out.first_mut() {
            *first += self.modifications.terminal_mass(peptide.form.nterm);
        }
        if let Some(last) = out.last_mut() {
            *last += self.modifications.terminal_mass(peptide.form.cterm);
        }
    }
}

fn check_budget(required: usize, budget: usize) -> Result<()> {
    if required > budget {
        Err(FragSeekError::ResourceExhaustion {
            resource: "peptides",
            required,
            budget,
        })
    } else {
        Ok(())
    }
}

fn catalog_order(a: &Peptide, b: &Peptide) -> Ordering {
    a.monoisotopic
        .total_cmp(&b.monoisotopic)
        .then_with(|| a.decoy.cmp(&b.decoy))
        .then_with(|| a.form.cmp(&b.form))
        .then_with(|| a.protein_idx.cmp(&b.protein_idx))
}

fn digest_protein(
    protein_idx: u32,
    protein: &Protein,
    config: &DigestionConfig,
    modifications: &ModificationSet,
) -> Vec<Peptide> {
    let mut out = Vec::new();
    for slice in config.digest(protein_idx, &protein.sequence) {
        if !all_residues_known(slice.as_bytes()) {
            continue;
        }
        let forms = modifications.apply(
            slice.as_bytes(),
            slice.is_protein_nterm(),
            slice.is_protein_cterm(),
        );
        for form in forms {
            let mass = form.monoisotopic_mass(modifications);
            if mass < config.min_peptide_mass || mass > config.max_peptide_mass {
                continue;
            }
            out.push(Peptide {
                form,
                protein_idx,
                start: slice.start() as u32,
                monoisotopic: mass,
                decoy: DecoyMarking::Target,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Enzyme;

    fn config() -> DigestionConfig {
        DigestionConfig {
            enzyme: Enzyme::Trypsin,
            max_missed_cleavages: 0,
            min_length: 2,
            max_length: 30,
            ..Default::default()
        }
    }

    fn no_mods() -> ModificationSet {
        ModificationSet::new(vec![], vec![], 0).unwrap()
    }

    #[test]
    fn test_sorted_and_deduplicated() {
        let proteins = vec![
            Protein::new("P1", "PEPTIDEKAAGGRCCDDK"),
            Protein::new("P2", "PEPTIDEKMMMK"),
        ];
        let catalog = PeptideCatalog::build(proteins, &config(), no_mods()).unwrap();
        assert!(catalog
            .peptides()
            .windows(2)
            .all(|w| w[0].monoisotopic <= w[1].monoisotopic));

        let peptide_entries: Vec<&Peptide> = catalog
            .iter()
            .filter(|p| p.form.stripped_sequence() == "PEPTIDEK")
            .collect();
        assert_eq!(peptide_entries.len(), 1);
        assert_eq!(peptide_entries[0].protein_idx, 0);
    }

    #[test]
    fn test_empty_input() {
        let catalog = PeptideCatalog::build(vec![], &config(), no_mods()).unwrap();
        assert!(catalog.is_empty());
        let range = catalog.get_peptide_range(1000.0, &MassTolerance::Absolute(10.0));
        assert_eq!(range, PeptideRange::new(0, 0));
    }

    #[test]
    fn test_at_out_of_range() {
        let catalog =
            PeptideCatalog::build(vec![Protein::new("P1", "PEPTIDEK")], &config(), no_mods())
                .unwrap();
        assert!(catalog.at(0).is_ok());
        assert!(matches!(
            catalog.at(1),
            Err(FragSeekError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_decoys() {
        let mut config = config();
        config.build_decoys = true;
        // ACDK reverses to ADCK; AAAK is its own decoy and is skipped
        let proteins = vec![Protein::new("P1", "ACDKAAAK")];
        let catalog = PeptideCatalog::build(proteins, &config, no_mods()).unwrap();
        let decoys: Vec<&Peptide> = catalog.iter().filter(|p| p.decoy.is_decoy()).collect();
        assert_eq!(decoys.len(), 1);
        assert_eq!(decoys[0].form.stripped_sequence(), "ADCK");
        assert_eq!(catalog.accession(decoys[0]).unwrap(), "DECOY_P1");
    }

    #[test]
    fn test_budget() {
        let mut config = config();
        config.max_peptides = 1;
        let proteins = vec![Protein::new("P1", "ACDKAAAK")];
        let err = PeptideCatalog::build(proteins, &config, no_mods()).unwrap_err();
        assert!(matches!(err, FragSeekError::ResourceExhaustion { .. }));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = config();
        config.min_length = 0;
        assert!(matches!(
            PeptideCatalog::build(vec![], &config, no_mods()),
            Err(FragSeekError::Configuration { .. })
        ));
        let mods = ModificationSet::new(vec![], vec![], MAX_VARIABLE_MODS + 1).unwrap();
        assert!(PeptideCatalog::build(vec![], &DigestionConfig::default(), mods).is_err());
    }

    #[test]
    fn test_unknown_residues_dropped() {
        let proteins = vec![Protein::new("P1", "PEPXIDEKAAGGR")];
        let catalog = PeptideCatalog::build(proteins, &config(), no_mods()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.sequence_string(0).unwrap(), "AAGGR");
    }

    #[test]
    fn test_residue_masses_fold_terminal_mods() {
        let mods = ModificationSet::from_identifiers(&["Acetyl (N-term)".to_string()], &[], 0)
            .unwrap();
        let catalog =
            PeptideCatalog::build(vec![Protein::new("P1", "GGGK")], &config(), mods).unwrap();
        let peptide = catalog.at(0).unwrap();
        let mut masses = Vec::new();
        catalog.residue_masses(peptide, &mut masses);
        assert_eq!(masses.len(), 4);
        assert!((masses[0] - (57.02146372 + 42.010565)).abs() < 1e-9);
        let total: f64 = masses.iter().sum::<f64>() + crate::chemistry::water_mass();
        assert!((total - peptide.monoisotopic).abs() < 1e-9);
    }
}
