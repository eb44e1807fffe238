use crate::index::Hit;
use crate::utils::math::lnfact;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-peptide evidence aggregated over every query of one spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedHit {
    pub peptide_idx: u32,
    /// Output of the [`ScoringFunction`].
    pub score: f64,
    /// Summed matched counts.
    pub matched: u32,
    /// Summed raw hit scores.
    pub raw_score: f64,
    /// Number of hits that were merged.
    pub n_hits: u32,
}

/// Turns aggregated evidence into a single ranking score.
///
/// Implementations must not decrease when `matched` or `raw_score` grow.
pub trait ScoringFunction: Send + Sync {
    fn combine(&self, matched: u32, raw_score: f64, n_hits: u32) -> f64;
}

/// Ranks by the number of matched fragments alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchCountScore;

impl ScoringFunction for MatchCountScore {
    fn combine(&self, matched: u32, _raw_score: f64, _n_hits: u32) -> f64 {
        matched as f64
    }
}

/// `ln(n!) + ln(1 + s)` where `n` is the matched count and `s` the summed
/// mass-accuracy weights.
///
/// ```
/// use fragseek::scoring::{ScoringFunction, TagHyperscore};
///
/// let score = TagHyperscore.combine(3, 2.5, 1);
/// assert!((score - (6f64.ln() + 3.5f64.ln())).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TagHyperscore;

impl ScoringFunction for TagHyperscore {
    fn combine(&self, matched: u32, raw_score: f64, _n_hits: u32) -> f64 {
        let matched = matched.min(u16::MAX as u32) as u16;
        lnfact(matched) + raw_score.max(0.0).ln_1p()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FragmentIndexScorer<S: ScoringFunction = TagHyperscore> {
    scoring: S,
}

impl<S: ScoringFunction> FragmentIndexScorer<S> {
    pub fn new(scoring: S) -> Self {
        Self { scoring }
    }

    /// Groups `hits` by peptide and ranks the peptides, best first. Equal
    /// scores are ordered by ascending peptide index.
    pub fn score(&self, hits: &[Hit]) -> Vec<RankedHit> {
        let mut grouped: BTreeMap<u32, (u32, f64, u32)> = BTreeMap::new();
        for hit in hits.iter() {
            let entry = grouped.entry(hit.peptide_idx).or_insert((0, 0.0, 0));
            entry.0 += hit.matched;
            entry.1 += hit.score;
            entry.2 += 1;
        }

        let mut ranked: Vec<RankedHit> = grouped
            .into_iter()
            .map(|(peptide_idx, (matched, raw_score, n_hits))| RankedHit {
                peptide_idx,
                score: self.scoring.combine(matched, raw_score, n_hits),
                matched,
                raw_score,
                n_hits,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.peptide_idx.cmp(&b.peptide_idx))
        });
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(peptide_idx: u32, matched: u32, score: f64) -> Hit {
        Hit {
            peptide_idx,
            score,
            matched,
        }
    }

    #[test]
    fn test_grouping_and_order() {
        let scorer = FragmentIndexScorer::new(MatchCountScore);
        let ranked = scorer.score(&[hit(5, 2, 1.0), hit(2, 3, 1.0), hit(5, 2, 1.0), hit(1, 3, 0.1)]);
        let order: Vec<u32> = ranked.iter().map(|x| x.peptide_idx).collect();
        // 5 has 4 matches, 1 and 2 tie on 3 and are ordered by index
        assert_eq!(order, vec![5, 1, 2]);
        assert_eq!(ranked[0].n_hits, 2);
        assert_eq!(ranked[0].matched, 4);
    }

    #[test]
    fn test_extra_hit_never_lowers_score() {
        let scorer = FragmentIndexScorer::<TagHyperscore>::default();
        let base = vec![hit(1, 2, 1.5), hit(2, 3, 2.0)];
        let mut extended = base.clone();
        extended.push(hit(1, 2, 0.5));

        let find = |ranked: &[RankedHit], idx: u32| {
            ranked
                .iter()
                .position(|x| x.peptide_idx == idx)
                .map(|pos| (pos, ranked[pos].score))
                .unwrap()
        };
        let (pos_before, score_before) = find(&scorer.score(&base), 1);
        let (pos_after, score_after) = find(&scorer.score(&extended), 1);
        assert!(score_after >= score_before);
        assert!(pos_after <= pos_before);
    }

    #[test]
    fn test_empty() {
        let scorer = FragmentIndexScorer::new(TagHyperscore);
        assert!(scorer.score(&[]).is_empty());
    }
}
