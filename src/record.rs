//! Data structures for the GPT library.

use serde::{Deserialize, Serialize};

/// One saved GPT listing. `url` is the unique key: two records with the
/// same `url` are the same logical entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GptRecord {
    pub name: String,
    pub description: String,
    pub url: String,
}

impl GptRecord {
    pub fn new(name: impl Into<String>, description: impl Into<String>, url: impl Into<String>) -> GptRecord {
        GptRecord {
            name: name.into(),
            description: description.into(),
            url: url.into(),
        }
    }
}

/// Counts reported back from a batch merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub added: usize,
    pub updated: usize,
}
