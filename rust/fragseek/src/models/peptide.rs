use super::decoy::{
    DecoyMarking,
    reverse_inner,
};
use crate::chemistry::{
    ModificationId,
    ModificationSet,
    water_mass,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Residue {
    pub aa: u8,
    pub modification: Option<ModificationId>,
}

/// A position that can carry a modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModSite {
    NTerm,
    Residue(usize),
    CTerm,
}

/// A residue sequence together with the modifications placed on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Peptidoform {
    pub residues: Vec<Residue>,
    pub nterm: Option<ModificationId>,
    pub cterm: Option<ModificationId>,
}

impl Peptidoform {
    pub fn unmodified(sequence: &[u8]) -> Self {
        Self {
            residues: sequence
                .iter()
                .map(|aa| Residue {
                    aa: aa.to_ascii_uppercase(),
                    modification: None,
                })
                .collect(),
            nterm: None,
            cterm: None,
        }
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn is_free(&self, site: ModSite) -> bool {
        match site {
            ModSite::NTerm => self.nterm.is_none(),
            ModSite::CTerm => self.cterm.is_none(),
            ModSite::Residue(i) => self
                .residues
                .get(i)
                .is_some_and(|r| r.modification.is_none()),
        }
    }

    /// Places a modification on a free site. Occupied or missing sites are
    /// left untouched and `false` is returned.
    pub fn try_set(&mut self, site: ModSite, modification: ModificationId) -> bool {
        if !self.is_free(site) {
            return false;
        }
        match site {
            ModSite::NTerm => self.nterm = Some(modification),
            ModSite::CTerm => self.cterm = Some(modification),
            ModSite::Residue(i) => self.residues[i].modification = Some(modification),
        }
        true
    }

    fn modifications(&self) -> impl Iterator<Item = ModificationId> + '_ {
        self.nterm
            .into_iter()
            .chain(self.residues.iter().filter_map(|r| r.modification))
            .chain(self.cterm)
    }

    pub fn variable_count(&self, mods: &ModificationSet) -> usize {
        self.modifications()
            .filter(|id| mods.is_variable(*id))
            .count()
    }

    /// Neutral monoisotopic mass: residues, terminal modifications and water.
    pub fn monoisotopic_mass(&self, mods: &ModificationSet) -> f64 {
        let residues: f64 = self.residues.iter().map(|r| mods.residue_mass(r)).sum();
        residues + mods.terminal_mass(self.nterm) + mods.terminal_mass(self.cterm) + water_mass()
    }

    /// Decoy with the inner residues reversed; the terminal residues and
    /// terminal modifications stay in place.
    pub fn as_decoy(&self) -> Self {
        Self {
            residues: reverse_inner(&self.residues),
            nterm: self.nterm,
            cterm: self.cterm,
        }
    }

    pub fn stripped_sequence(&self) -> String {
        self.residues.iter().map(|r| r.aa as char).collect()
    }

    /// Sequence with modification mass shifts inline, e.g. `PEPM[+15.9949]K`.
    pub fn to_annotated_string(&self, mods: &ModificationSet) -> String {
        let mut out = String::with_capacity(self.residues.len() * 2);
        if let Some(id) = self.nterm {
            out.push_str(&format!("[{:+.4}]-", mods.get(id).mass_delta));
        }
        for r in self.residues.iter() {
            out.push(r.aa as char);
            if let Some(id) = r.modification {
                out.push_str(&format!("[{:+.4}]", mods.get(id).mass_delta));
            }
        }
        if let Some(id) = self.cterm {
            out.push_str(&format!("-[{:+.4}]", mods.get(id).mass_delta));
        }
        out
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Peptide {
    pub form: Peptidoform,
    /// Index into the protein list the catalog was built from.
    pub protein_idx: u32,
    /// Offset of the first residue in the protein.
    pub start: u32,
    /// Neutral monoisotopic mass.
    pub monoisotopic: f64,
    pub decoy: DecoyMarking,
}

impl Peptide {
    pub fn residues(&self) -> &[Residue] {
        &self.form.residues
    }

    pub fn len(&self) -> usize {
        self.form.len()
    }

    pub fn is_empty(&self) -> bool {
        self.form.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::Modification;

    #[test]
    fn test_mass_and_rendering() {
        let mods = ModificationSet::new(
            vec![],
            vec![Modification::parse("Oxidation (M)").unwrap()],
            1,
        )
        .unwrap();
        let mut form = Peptidoform::unmodified(b"PEPMK");
        let plain = form.monoisotopic_mass(&mods);
        assert!(form.try_set(ModSite::Residue(3), ModificationId(0)));
        assert!(!form.try_set(ModSite::Residue(3), ModificationId(0)));
        assert!(!form.try_set(ModSite::Residue(10), ModificationId(0)));
        let oxidized = form.monoisotopic_mass(&mods);
        assert!((oxidized - plain - 15.994915).abs() < 1e-9);
        assert_eq!(form.to_annotated_string(&mods), "PEPM[+15.9949]K");
        assert_eq!(form.stripped_sequence(), "PEPMK");
        assert_eq!(form.variable_count(&mods), 1);
    }

    #[test]
    fn test_decoy_keeps_mods_with_residues() {
        let mut form = Peptidoform::unmodified(b"AMCDK");
        form.try_set(ModSite::Residue(1), ModificationId(0));
        let decoy = form.as_decoy();
        assert_eq!(decoy.stripped_sequence(), "ADCMK");
        assert_eq!(decoy.residues[3].modification, Some(ModificationId(0)));
    }
}
