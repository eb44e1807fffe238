//! Fold/reduce collection of per-spectrum search results from rayon.

use super::search_results::PeptideSpectrumMatch;
use super::timings::SearchTimings;
use crate::errors::FragSeekError;
use rayon::iter::{
    FromParallelIterator,
    IntoParallelIterator,
    ParallelIterator,
};
use tracing::warn;

/// Outcome of searching one spectrum, tagged with its input position.
pub(crate) type SpectrumOutcome = (
    usize,
    String,
    Result<Vec<PeptideSpectrumMatch>, FragSeekError>,
    SearchTimings,
);

#[derive(Default)]
pub(crate) struct SearchAccumulator {
    pub(crate) matches: Vec<(usize, Vec<PeptideSpectrumMatch>)>,
    pub(crate) timings: SearchTimings,
    pub(crate) n_searched: usize,
    pub(crate) n_failed: usize,
}

impl SearchAccumulator {
    pub(crate) fn reduce(mut self, other: Self) -> Self {
        self.matches.extend(other.matches);
        self.timings += other.timings;
        self.n_searched += other.n_searched;
        self.n_failed += other.n_failed;
        self
    }

    /// Failed spectra are logged and counted, not propagated.
    pub(crate) fn fold(mut self, item: SpectrumOutcome) -> Self {
        let (position, spectrum_id, result, timings) = item;
        self.n_searched += 1;
        self.timings += timings;
        match result {
            Ok(matches) => self.matches.push((position, matches)),
            Err(e) => {
                warn!("Failed to search spectrum {}: {}", spectrum_id, e);
                self.n_failed += 1;
            }
        }
        self
    }
}

impl FromIterator<SpectrumOutcome> for SearchAccumulator {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = SpectrumOutcome>,
    {
        iter.into_iter()
            .fold(SearchAccumulator::default(), SearchAccumulator::fold)
    }
}

impl FromParallelIterator<SpectrumOutcome> for SearchAccumulator {
    fn from_par_iter<I>(par_iter: I) -> Self
    where
        I: IntoParallelIterator<Item = SpectrumOutcome>,
    {
        par_iter
            .into_par_iter()
            .fold(SearchAccumulator::default, SearchAccumulator::fold)
            .reduce(SearchAccumulator::default, SearchAccumulator::reduce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_parallel_collect_counts_failures() {
        let acc: SearchAccumulator = (0..10usize)
            .into_par_iter()
            .map(|i| {
                let result = if i % 3 == 0 {
                    Err(FragSeekError::InvalidState {
                        operation: "test",
                        expected: "nothing",
                    })
                } else {
                    Ok(Vec::new())
                };
                (i, format!("s{i}"), result, SearchTimings::default())
            })
            .collect();
        assert_eq!(acc.n_searched, 10);
        assert_eq!(acc.n_failed, 4);
        assert_eq!(acc.matches.len(), 6);
    }
}
