use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Protein {
    pub accession: String,
    pub description: String,
    pub sequence: Arc<str>,
}

impl Protein {
    pub fn new(accession: impl Into<String>, sequence: &str) -> Self {
        Self {
            accession: accession.into(),
            description: String::new(),
            sequence: sequence.trim().to_ascii_uppercase().into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}
