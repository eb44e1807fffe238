//! Sequence tags from a single spectrum.
//!
//! [`TagGenerator`] runs in four stages that have to be called in order:
//! [`TagGenerator::global_selection`], [`TagGenerator::local_selection`],
//! [`TagGenerator::generate_directed_acyclic_graph`] and
//! [`TagGenerator::generate_all_multi_peaks`]. Peaks are treated as singly
//! charged, so the mass difference of two peaks connected by an edge is
//! the mass of one or more residues.

use crate::chemistry::{
    ModificationSet,
    ModificationTarget,
    PROTON,
    STANDARD_RESIDUES,
    residue_mass,
};
use crate::errors::{
    FragSeekError,
    Result,
};
use crate::models::Spectrum;
use arrayvec::ArrayVec;
use serde::{
    Deserialize,
    Serialize,
};
use tracing::warn;

/// Hard upper bound on the number of peaks in one tag.
pub const MAX_TAG_PEAKS: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TagConfig {
    /// Number of most intense peaks kept by the global selection.
    pub max_peaks: usize,
    /// Width (m/z) of the window used for local maxima. 0 disables it.
    pub local_window_mz: f64,
    /// Largest number of residues a single edge may represent.
    pub max_edge_residues: usize,
    pub min_tag_peaks: usize,
    pub max_tag_peaks: usize,
    /// Upper bound on the tags emitted per spectrum.
    pub max_tags: usize,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            max_peaks: 50,
            local_window_mz: 1.5,
            max_edge_residues: 2,
            min_tag_peaks: 3,
            max_tag_peaks: 6,
            max_tags: 10_000,
        }
    }
}

impl TagConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_peaks < 2 {
            return Err(FragSeekError::config(
                "tags.max_peaks",
                "at least two peaks are needed to form a tag",
            ));
        }
        if !(self.local_window_mz.is_finite() && self.local_window_mz >= 0.0) {
            return Err(FragSeekError::config(
                "tags.local_window_mz",
                format!("must be finite and non-negative, got {}", self.local_window_mz),
            ));
        }
        if self.max_edge_residues == 0 || self.max_edge_residues > 3 {
            return Err(FragSeekError::config(
                "tags.max_edge_residues",
                format!("must be between 1 and 3, got {}", self.max_edge_residues),
            ));
        }
        if self.min_tag_peaks < 2 {
            return Err(FragSeekError::config(
                "tags.min_tag_peaks",
                "tags contain at least two peaks",
            ));
        }
        if self.max_tag_peaks < self.min_tag_peaks || self.max_tag_peaks > MAX_TAG_PEAKS {
            return Err(FragSeekError::config(
                "tags.max_tag_peaks",
                format!(
                    "must be between min_tag_peaks ({}) and {}, got {}",
                    self.min_tag_peaks, MAX_TAG_PEAKS, self.max_tag_peaks
                ),
            ));
        }
        if self.max_tags == 0 {
            return Err(FragSeekError::config("tags.max_tags", "must be positive"));
        }
        Ok(())
    }
}

/// Masses of every combination of up to `max_edge_residues` residues,
/// sorted by mass. Each entry records how many residues it spans.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueAlphabet {
    combinations: Vec<(f64, u8)>,
}

impl ResidueAlphabet {
    /// Residue masses as they can occur in the catalog: fixed residue
    /// modifications replace the plain mass, variable ones add a variant.
    pub fn new(modifications: &ModificationSet, max_edge_residues: usize) -> Self {
        let mut singles: Vec<f64> = Vec::new();
        for aa in STANDARD_RESIDUES.iter() {
            let Some(base) = residue_mass(*aa) else {
                continue;
            };
            let fixed = modifications
                .fixed()
                .find(|m| m.target == ModificationTarget::Residue(*aa));
            match fixed {
                Some(m) => singles.push(base + m.mass_delta),
                None => singles.push(base),
            }
            for m in modifications.variable() {
                if m.target == ModificationTarget::Residue(*aa) && fixed.is_none() {
                    singles.push(base + m.mass_delta);
                }
            }
        }
        singles.sort_by(|a, b| a.total_cmp(b));
        singles.dedup_by(|a, b| (*a - *b).abs() < 1e-6);

        let mut combinations: Vec<(f64, u8)> = singles.iter().map(|m| (*m, 1)).collect();
        let mut previous: Vec<(f64, usize)> = singles.iter().copied().zip(0..).collect();
        for count in 2..=max_edge_residues.min(3) {
            // Extend non-decreasing index sequences to enumerate multisets once.
            let mut next = Vec::new();
            for (mass, last) in previous.iter() {
                for (i, single) in singles.iter().enumerate().skip(*last) {
                    next.push((mass + single, i));
                }
            }
            combinations.extend(next.iter().map(|(m, _)| (*m, count as u8)));
            previous = next;
        }
        combinations.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.total_cmp(&b.0)));
        combinations.dedup_by(|a, b| a.1 == b.1 && (a.0 - b.0).abs() < 1e-6);
        combinations.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        Self { combinations }
    }

    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }

    /// Distinct residue counts of the combinations within `tolerance` of
    /// `delta`, ascending.
    pub fn matching_counts(&self, delta: f64, tolerance: f64) -> ArrayVec<u8, 3> {
        let lo = self
            .combinations
            .partition_point(|(m, _)| *m < delta - tolerance);
        let mut out = ArrayVec::new();
        for (mass, count) in self.combinations[lo..].iter() {
            if *mass > delta + tolerance {
                break;
            }
            if !out.contains(count) && !out.is_full() {
                out.push(*count);
            }
        }
        out.sort_unstable();
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    /// Node positions (in m/z order of the selected peaks).
    pub from: usize,
    pub to: usize,
    pub residues: u8,
}

/// An ordered chain of peaks whose consecutive mass differences are
/// residue masses.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiPeak {
    peaks: ArrayVec<usize, MAX_TAG_PEAKS>,
    masses: ArrayVec<f64, MAX_TAG_PEAKS>,
    steps: ArrayVec<u8, MAX_TAG_PEAKS>,
}

impl MultiPeak {
    /// Builds a tag from neutral fragment masses and the residue count of
    /// each step. `peaks` are the spectrum positions of the masses.
    ///
    /// ```
    /// use fragseek::tags::MultiPeak;
    ///
    /// let tag = MultiPeak::new(&[0, 1, 2], &[200.0, 271.04, 400.08], &[1, 1]).unwrap();
    /// assert_eq!(tag.len(), 3);
    /// assert!(MultiPeak::new(&[0], &[200.0], &[]).is_err());
    /// ```
    pub fn new(peaks: &[usize], masses: &[f64], steps: &[u8]) -> Result<Self> {
        if peaks.len() < 2
            || peaks.len() > MAX_TAG_PEAKS
            || masses.len() != peaks.len()
            || steps.len() + 1 != peaks.len()
        {
            return Err(FragSeekError::config(
                "tag",
                format!(
                    "a tag needs 2 to {} peaks with one step between each, got {} peaks, {} masses and {} steps",
                    MAX_TAG_PEAKS,
                    peaks.len(),
                    masses.len(),
                    steps.len()
                ),
            ));
        }
        Ok(Self {
            peaks: peaks.iter().copied().collect(),
            masses: masses.iter().copied().collect(),
            steps: steps.iter().copied().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn peaks(&self) -> &[usize] {
        &self.peaks
    }

    /// Neutral fragment masses of the peaks, ascending.
    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    /// Residues spanned between consecutive peaks.
    pub fn steps(&self) -> &[u8] {
        &self.steps
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Created,
    GloballySelected,
    LocallySelected,
    GraphBuilt,
}

impl Stage {
    fn describe(&self) -> &'static str {
        match self {
            Stage::Created => "a new generator",
            Stage::GloballySelected => "global selection to have run",
            Stage::LocallySelected => "local selection to have run",
            Stage::GraphBuilt => "the graph to have been built",
        }
    }
}

pub struct TagGenerator<'a> {
    spectrum: &'a Spectrum,
    config: &'a TagConfig,
    alphabet: &'a ResidueAlphabet,
    stage: Stage,
    /// Spectrum positions of the retained peaks, in m/z order.
    selected: Vec<usize>,
    /// Outgoing edges per node, sorted by target node.
    edges: Vec<Vec<Edge>>,
}

impl<'a> TagGenerator<'a> {
    /// Fails with a configuration error when `config` does not validate,
    /// so the path bounds below always fit a [`MultiPeak`].
    pub fn new(
        spectrum: &'a Spectrum,
        config: &'a TagConfig,
        alphabet: &'a ResidueAlphabet,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            spectrum,
            config,
            alphabet,
            stage: Stage::Created,
            selected: Vec::new(),
            edges: Vec::new(),
        })
    }

    fn require(&self, operation: &'static str, stage: Stage) -> Result<()> {
        if self.stage == stage {
            Ok(())
        } else {
            Err(FragSeekError::InvalidState {
                operation,
                expected: stage.describe(),
            })
        }
    }

    fn mz(&self, peak: usize) -> f64 {
        self.spectrum.peaks[peak].mz
    }

    fn intensity(&self, peak: usize) -> f32 {
        self.spectrum.peaks[peak].intensity
    }

    /// Keeps the `max_peaks` most intense peaks, ties going to the peak
    /// that comes first in the spectrum, and orders them by m/z.
    pub fn global_selection(&mut self) -> Result<()> {
        self.require("global_selection", Stage::Created)?;
        let peaks = &self.spectrum.peaks;
        let mut order: Vec<usize> = (0..peaks.len())
            .filter(|i| peaks[*i].mz.is_finite() && peaks[*i].intensity.is_finite())
            .collect();
        order.sort_by(|a, b| peaks[*b].intensity.total_cmp(&peaks[*a].intensity));
        order.truncate(self.config.max_peaks);
        order.sort_by(|a, b| peaks[*a].mz.total_cmp(&peaks[*b].mz).then(a.cmp(b)));
        self.selected = order;
        self.stage = Stage::GloballySelected;
        Ok(())
    }

    /// Drops every peak that has a more intense neighbour within half the
    /// window width on either side. Among equally intense neighbours the
    /// lower m/z one survives.
    pub fn local_selection(&mut self) -> Result<()> {
        self.require("local_selection", Stage::GloballySelected)?;
        let half = self.config.local_window_mz / 2.0;
        if half > 0.0 {
            let selected = &self.selected;
            let keep: Vec<bool> = (0..selected.len())
                .map(|i| {
                    let (mz, intensity) = (self.mz(selected[i]), self.intensity(selected[i]));
                    let left = selected[..i]
                        .iter()
                        .rev()
                        .take_while(|p| mz - self.mz(**p) <= half)
                        .any(|p| self.intensity(*p) >= intensity);
                    let right = selected[i + 1..]
                        .iter()
                        .take_while(|p| self.mz(**p) - mz <= half)
                        .any(|p| self.intensity(*p) > intensity);
                    !(left || right)
                })
                .collect();
            let mut keep = keep.into_iter();
            self.selected.retain(|_| keep.next().unwrap_or(false));
        }
        self.stage = Stage::LocallySelected;
        Ok(())
    }

    /// Connects every pair of retained peaks whose m/z difference matches a
    /// residue combination within `tolerance_da`. Edges always point from
    /// the lower to the higher m/z peak, so the graph is acyclic.
    pub fn generate_directed_acyclic_graph(&mut self, tolerance_da: f64) -> Result<()> {
        if !(tolerance_da.is_finite() && tolerance_da >= 0.0) {
            return Err(FragSeekError::config(
                "tolerance_da",
                format!("must be finite and non-negative, got {tolerance_da}"),
            ));
        }
        self.require("generate_directed_acyclic_graph", Stage::LocallySelected)?;

        let n = self.selected.len();
        let mut edges = vec![Vec::new(); n];
        for from in 0..n {
            let low = self.mz(self.selected[from]);
            for to in (from + 1)..n {
                let delta = self.mz(self.selected[to]) - low;
                if delta <= 0.0 {
                    continue;
                }
                for residues in self.alphabet.matching_counts(delta, tolerance_da) {
                    edges[from].push(Edge { from, to, residues });
                }
            }
        }
        self.edges = edges;
        self.stage = Stage::GraphBuilt;
        Ok(())
    }

    /// Appends every path of the graph with between `min_tag_peaks` and
    /// `max_tag_peaks` peaks, stopping once `max_tags` were produced.
    /// Returns the number of tags appended.
    pub fn generate_all_multi_peaks(&self, out: &mut Vec<MultiPeak>) -> Result<usize> {
        self.require("generate_all_multi_peaks", Stage::GraphBuilt)?;
        let mut path: ArrayVec<usize, MAX_TAG_PEAKS> = ArrayVec::new();
        let mut steps: ArrayVec<u8, MAX_TAG_PEAKS> = ArrayVec::new();
        let mut emitted = 0;
        for start in 0..self.selected.len() {
            path.push(start);
            let done = self.extend_path(&mut path, &mut steps, out, &mut emitted);
            path.pop();
            if done {
                warn!(
                    "Spectrum {} reached the cap of {} tags, remaining paths are skipped",
                    self.spectrum.id, self.config.max_tags
                );
                break;
            }
        }
        Ok(emitted)
    }

    /// Depth-first extension of `path`; true once the tag cap is reached.
    fn extend_path(
        &self,
        path: &mut ArrayVec<usize, MAX_TAG_PEAKS>,
        steps: &mut ArrayVec<u8, MAX_TAG_PEAKS>,
        out: &mut Vec<MultiPeak>,
        emitted: &mut usize,
    ) -> bool {
        if path.len() >= self.config.min_tag_peaks {
            if *emitted >= self.config.max_tags {
                return true;
            }
            out.push(self.to_multi_peak(path, steps));
            *emitted += 1;
        }
        if path.len() >= self.config.max_tag_peaks {
            return false;
        }
        let Some(node) = path.last().copied() else {
            return false;
        };
        for edge in self.edges[node].iter() {
            path.push(edge.to);
            steps.push(edge.residues);
            let done = self.extend_path(path, steps, out, emitted);
            steps.pop();
            path.pop();
            if done {
                return true;
            }
        }
        false
    }

    fn to_multi_peak(&self, path: &[usize], steps: &[u8]) -> MultiPeak {
        let peaks: ArrayVec<usize, MAX_TAG_PEAKS> =
            path.iter().map(|node| self.selected[*node]).collect();
        let masses = peaks.iter().map(|p| self.mz(*p) - PROTON).collect();
        MultiPeak {
            peaks,
            masses,
            steps: steps.iter().copied().collect(),
        }
    }

    /// Spectrum positions of the peaks currently retained, in m/z order.
    pub fn selected_peaks(&self) -> &[usize] {
        &self.selected
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().flatten()
    }

    pub fn node_count(&self) -> usize {
        self.selected.len()
    }
}
