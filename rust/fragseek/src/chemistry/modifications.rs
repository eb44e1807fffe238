//! Modification definitions and the placement of fixed and variable
//! modifications on digested sequences.
//!
//! Modifications are named the UniMod way, `Name (Site)`, e.g.
//! `Carbamidomethyl (C)`, `Oxidation (M)`, `Acetyl (Protein N-term)`.
//! Names are resolved by rustyms; anything else has to carry an explicit
//! mass shift: `Custom (K) +12.5`.

use super::masses::named_modification_delta;
use super::residues::residue_mass;
use crate::errors::{
    FragSeekError,
    Result,
};
use crate::models::peptide::{
    ModSite,
    Peptidoform,
    Residue,
};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::warn;

static MODIFICATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<name>.+?)\s*\((?P<site>[^()]+)\)\s*(?P<mass>[+-][0-9]*\.?[0-9]+)?\s*$")
        .expect("modification pattern is a valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModificationId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModificationTarget {
    Residue(u8),
    PeptideNTerm,
    PeptideCTerm,
    ProteinNTerm,
    ProteinCTerm,
}

impl ModificationTarget {
    fn parse(site: &str) -> Option<Self> {
        match site.trim() {
            "N-term" => Some(Self::PeptideNTerm),
            "C-term" => Some(Self::PeptideCTerm),
            "Protein N-term" => Some(Self::ProteinNTerm),
            "Protein C-term" => Some(Self::ProteinCTerm),
            x if x.len() == 1 => {
                let aa = x.as_bytes()[0].to_ascii_uppercase();
                residue_mass(aa).map(|_| Self::Residue(aa))
            }
            _ => None,
        }
    }

    fn as_site_string(&self) -> String {
        match self {
            Self::Residue(aa) => (*aa as char).to_string(),
            Self::PeptideNTerm => "N-term".into(),
            Self::PeptideCTerm => "C-term".into(),
            Self::ProteinNTerm => "Protein N-term".into(),
            Self::ProteinCTerm => "Protein C-term".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Modification {
    pub name: String,
    pub mass_delta: f64,
    pub target: ModificationTarget,
}

impl Modification {
    /// Parses a `Name (Site)` identifier, optionally followed by a mass shift.
    ///
    /// ```
    /// use fragseek::chemistry::{Modification, ModificationTarget};
    ///
    /// let ox = Modification::parse("Oxidation (M)").unwrap();
    /// assert_eq!(ox.target, ModificationTarget::Residue(b'M'));
    /// assert!((ox.mass_delta - 15.994915).abs() < 1e-6);
    ///
    /// let custom = Modification::parse("Custom (K) +12.5").unwrap();
    /// assert_eq!(custom.mass_delta, 12.5);
    /// ```
    pub fn parse(identifier: &str) -> Result<Self> {
        let caps = MODIFICATION_RE.captures(identifier).ok_or_else(|| {
            FragSeekError::config(
                "modifications",
                format!("'{identifier}' is not of the form 'Name (Site)'"),
            )
        })?;
        let name = caps["name"].to_string();
        let target = ModificationTarget::parse(&caps["site"]).ok_or_else(|| {
            FragSeekError::config(
                "modifications",
                format!("unsupported modification site in '{identifier}'"),
            )
        })?;

        let mass_delta = match caps.name("mass") {
            Some(m) => m.as_str().parse::<f64>().map_err(|e| {
                FragSeekError::config("modifications", format!("{identifier}: {e}"))
            })?,
            None => named_modification_delta(&name, target).map_err(|e| {
                FragSeekError::config(
                    "modifications",
                    format!("unknown modification '{name}', provide an explicit mass shift ({e})"),
                )
            })?,
        };

        Ok(Self {
            name,
            mass_delta,
            target,
        })
    }

    pub fn identifier(&self) -> String {
        format!("{} ({})", self.name, self.target.as_site_string())
    }
}

/// The modification table used for one catalog: fixed modifications are
/// applied to every matching site, variable ones are enumerated.
#[derive(Debug, Clone, Default)]
pub struct ModificationSet {
    modifications: Vec<Modification>,
    fixed: Vec<ModificationId>,
    variable: Vec<ModificationId>,
    max_variable_mods: usize,
}

impl ModificationSet {
    pub fn new(
        fixed: Vec<Modification>,
        variable: Vec<Modification>,
        max_variable_mods: usize,
    ) -> Result<Self> {
        if let Some(both) = variable.iter().find(|m| fixed.contains(m)) {
            return Err(FragSeekError::config(
                "modifications",
                format!(
                    "'{}' is listed as both fixed and variable",
                    both.identifier()
                ),
            ));
        }
        let mut out = Self {
            max_variable_mods,
            ..Default::default()
        };
        for (kind, mods) in [("fixed", fixed), ("variable", variable)] {
            for m in mods {
                if out.modifications.iter().any(|x| x == &m) {
                    warn!(
                        "Duplicate {} modification provided: {}. Making them unique.",
                        kind,
                        m.identifier()
                    );
                    continue;
                }
                if out.modifications.len() >= u16::MAX as usize {
                    return Err(FragSeekError::config(
                        "modifications",
                        "too many modifications",
                    ));
                }
                let id = ModificationId(out.modifications.len() as u16);
                out.modifications.push(m);
                match kind {
                    "fixed" => out.fixed.push(id),
                    _ => out.variable.push(id),
                }
            }
        }
        Ok(out)
    }

    pub fn from_identifiers(
        fixed: &[String],
        variable: &[String],
        max_variable_mods: usize,
    ) -> Result<Self> {
        let fixed = fixed
            .iter()
            .map(|x| Modification::parse(x))
            .collect::<Result<Vec<_>>>()?;
        let variable = variable
            .iter()
            .map(|x| Modification::parse(x))
            .collect::<Result<Vec<_>>>()?;
        Self::new(fixed, variable, max_variable_mods)
    }

    /// Ids are only handed out by this set, so lookups are infallible.
    pub fn get(&self, id: ModificationId) -> &Modification {
        &self.modifications[id.0 as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.modifications.is_empty()
    }

    pub fn is_variable(&self, id: ModificationId) -> bool {
        self.variable.contains(&id)
    }

    pub fn max_variable_mods(&self) -> usize {
        self.max_variable_mods
    }

    pub fn fixed(&self) -> impl Iterator<Item = &Modification> + '_ {
        self.fixed.iter().map(|id| self.get(*id))
    }

    pub fn variable(&self) -> impl Iterator<Item = &Modification> + '_ {
        self.variable.iter().map(|id| self.get(*id))
    }

    pub fn residue_mass(&self, residue: &Residue) -> f64 {
        // Peptides are only built from residues with known masses.
        let base = residue_mass(residue.aa).unwrap_or_default();
        match residue.modification {
            Some(id) => base + self.get(id).mass_delta,
            None => base,
        }
    }

    pub fn terminal_mass(&self, modification: Option<ModificationId>) -> f64 {
        modification.map_or(0.0, |id| self.get(id).mass_delta)
    }

    /// Applies the fixed modifications and enumerates every placement of
    /// up to `max_variable_mods` variable modifications.
    ///
    /// The first element is always the peptidoform carrying only the fixed
    /// modifications. A site carries at most one modification.
    pub fn apply(
        &self,
        sequence: &[u8],
        at_protein_nterm: bool,
        at_protein_cterm: bool,
    ) -> Vec<Peptidoform> {
        let mut base = Peptidoform::unmodified(sequence);

        for id in self.fixed.iter() {
            let target = self.get(*id).target;
            for site in self.matching_sites(target, sequence, at_protein_nterm, at_protein_cterm) {
                base.try_set(site, *id);
            }
        }

        let mut candidates: Vec<(ModSite, ModificationId)> = Vec::new();
        for id in self.variable.iter() {
            let target = self.get(*id).target;
            for site in self.matching_sites(target, sequence, at_protein_nterm, at_protein_cterm) {
                if base.is_free(site) {
                    candidates.push((site, *id));
                }
            }
        }
        candidates.sort();

        let mut out = vec![base.clone()];
        if self.max_variable_mods == 0 || candidates.is_empty() {
            return out;
        }

        let mut chosen: Vec<(ModSite, ModificationId)> = Vec::with_capacity(self.max_variable_mods);
        self.enumerate_variable(&candidates, 0, &mut chosen, &base, &mut out);
        out
    }

    fn enumerate_variable(
        &self,
        candidates: &[(ModSite, ModificationId)],
        start: usize,
        chosen: &mut Vec<(ModSite, ModificationId)>,
        base: &Peptidoform,
        out: &mut Vec<Peptidoform>,
    ) {
        if chosen.len() == self.max_variable_mods {
            return;
        }
        for i in start..candidates.len() {
            let (site, id) = candidates[i];
            // Candidates are sorted by site, so an occupied site can only
            // be the last one chosen.
            if chosen.last().is_some_and(|(last, _)| *last == site) {
                continue;
            }
            chosen.push((site, id));
            let mut form = base.clone();
            for (s, m) in chosen.iter() {
                form.try_set(*s, *m);
            }
            out.push(form);
            self.enumerate_variable(candidates, i + 1, chosen, base, out);
            chosen.pop();
        }
    }

    fn matching_sites(
        &self,
        target: ModificationTarget,
        sequence: &[u8],
        at_protein_nterm: bool,
        at_protein_cterm: bool,
    ) -> Vec<ModSite> {
        match target {
            ModificationTarget::Residue(aa) => sequence
                .iter()
                .enumerate()
                .filter(|(_, x)| x.to_ascii_uppercase() == aa)
                .map(|(i, _)| ModSite::Residue(i))
                .collect(),
            ModificationTarget::PeptideNTerm => vec![ModSite::NTerm],
            ModificationTarget::PeptideCTerm => vec![ModSite::CTerm],
            ModificationTarget::ProteinNTerm if at_protein_nterm => vec![ModSite::NTerm],
            ModificationTarget::ProteinCTerm if at_protein_cterm => vec![ModSite::CTerm],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(fixed: &[&str], variable: &[&str], max_mods: usize) -> ModificationSet {
        let fixed: Vec<String> = fixed.iter().map(|x| x.to_string()).collect();
        let variable: Vec<String> = variable.iter().map(|x| x.to_string()).collect();
        ModificationSet::from_identifiers(&fixed, &variable, max_mods).unwrap()
    }

    #[test]
    fn test_parse_sites() {
        let acetyl = Modification::parse("Acetyl (Protein N-term)").unwrap();
        assert_eq!(acetyl.target, ModificationTarget::ProteinNTerm);
        let label = Modification::parse("Label:13C(6)15N(2) (K) +8.014199").unwrap();
        assert_eq!(label.name, "Label:13C(6)15N(2)");
        assert_eq!(label.target, ModificationTarget::Residue(b'K'));
        assert_eq!(label.mass_delta, 8.014199);
        // Resolved by name, beyond the handful of everyday modifications
        let succinyl = Modification::parse("Succinyl (K)").unwrap();
        assert!((succinyl.mass_delta - 100.016044).abs() < 1e-5);
        assert!(Modification::parse("Oxidation").is_err());
        assert!(Modification::parse("Nonsense (M)").is_err());
        assert!(Modification::parse("Oxidation (X)").is_err());
    }

    #[test]
    fn test_fixed_only() {
        let mods = set(&["Carbamidomethyl (C)"], &[], 2);
        let forms = mods.apply(b"ACDCK", false, false);
        assert_eq!(forms.len(), 1);
        let modified: Vec<bool> = forms[0]
            .residues
            .iter()
            .map(|r| r.modification.is_some())
            .collect();
        assert_eq!(modified, vec![false, true, false, true, false]);
    }

    #[test]
    fn test_variable_combinations() {
        // Two methionines, at most 2 variable mods: none, M1, M2, M1+M2
        let mods = set(&[], &["Oxidation (M)"], 2);
        let forms = mods.apply(b"MAMK", false, false);
        assert_eq!(forms.len(), 4);

        // Limit to one simultaneous mod: none, M1, M2
        let mods = set(&[], &["Oxidation (M)"], 1);
        let forms = mods.apply(b"MAMK", false, false);
        assert_eq!(forms.len(), 3);
        assert!(forms.iter().all(|f| f.variable_count(&mods) <= 1));
    }

    #[test]
    fn test_site_holds_one_modification() {
        let mods = set(&[], &["Phospho (S)", "Custom (S) +10.0"], 2);
        // none, S+P, S+Custom; never both on the same residue
        let forms = mods.apply(b"AS", false, false);
        assert_eq!(forms.len(), 3);
    }

    #[test]
    fn test_protein_terminal_mods() {
        let mods = set(&[], &["Acetyl (Protein N-term)"], 1);
        assert_eq!(mods.apply(b"PEPTIDEK", true, false).len(), 2);
        assert_eq!(mods.apply(b"PEPTIDEK", false, false).len(), 1);
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let mods = set(&["Carbamidomethyl (C)", "Carbamidomethyl (C)"], &[], 1);
        assert_eq!(mods.fixed().count(), 1);
        let mods = set(&[], &["Oxidation (M)", "Oxidation (M)"], 1);
        assert_eq!(mods.variable().count(), 1);
    }

    #[test]
    fn test_fixed_and_variable_overlap_is_rejected() {
        let both = ModificationSet::from_identifiers(
            &["Oxidation (M)".to_string()],
            &["Oxidation (M)".to_string(), "Phospho (S)".to_string()],
            2,
        );
        match both {
            Err(FragSeekError::Configuration { field, reason }) => {
                assert_eq!(field, "modifications");
                assert!(reason.contains("Oxidation (M)"), "{reason}");
            }
            other => panic!("expected a configuration error, got {other:?}"),
        }
        // Same name on a different site is a different modification.
        let mods = set(&["Oxidation (M)"], &["Oxidation (W)"], 1);
        assert_eq!(mods.fixed().count(), 1);
        assert_eq!(mods.variable().count(), 1);
    }
}
