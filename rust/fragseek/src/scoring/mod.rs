pub(crate) mod accumulator;
pub mod hyperscore;
pub mod scorer;
pub mod search_results;
pub mod timings;

pub use hyperscore::{
    PsmDetail,
    TheoreticalPeak,
};
pub use scorer::{
    FragmentIndexScorer,
    MatchCountScore,
    RankedHit,
    ScoringFunction,
    TagHyperscore,
};
pub use search_results::PeptideSpectrumMatch;
pub use timings::SearchTimings;
