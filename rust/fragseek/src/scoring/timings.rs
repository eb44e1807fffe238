//! Time spent in each stage of a spectrum search, summed over spectra.

use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SearchTimings {
    /// Peak filtering and normalisation.
    pub preprocess: Duration,
    /// Peak selection, graph construction and path enumeration.
    pub tagging: Duration,
    /// Fragment index queries and hit aggregation.
    pub query: Duration,
    /// Theoretical spectrum generation and hyperscore rescoring.
    pub rescore: Duration,
}

impl SearchTimings {
    pub fn total(&self) -> Duration {
        self.preprocess + self.tagging + self.query + self.rescore
    }
}

impl Serialize for SearchTimings {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("SearchTimings", 4)?;
        state.serialize_field("preprocess_ms", &self.preprocess.as_millis())?;
        state.serialize_field("tagging_ms", &self.tagging.as_millis())?;
        state.serialize_field("query_ms", &self.query.as_millis())?;
        state.serialize_field("rescore_ms", &self.rescore.as_millis())?;
        state.end()
    }
}

impl std::ops::AddAssign for SearchTimings {
    fn add_assign(&mut self, rhs: Self) {
        self.preprocess += rhs.preprocess;
        self.tagging += rhs.tagging;
        self.query += rhs.query;
        self.rescore += rhs.rescore;
    }
}
