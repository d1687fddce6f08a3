//! Request/response envelopes passed between popup, page, and background.
//!
//! On the wire every request is `{action, data?}`; responses are
//! per-action shapes.

use crate::record::{GptRecord, MergeOutcome};
use serde::{Deserialize, Serialize};

/// A cross-context request, tagged by its `action` string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", content = "data")]
pub enum Request {
    /// popup -> page: scrape the current page.
    #[serde(rename = "scrapeGptData")]
    ScrapeGptData,
    /// popup -> background: merge an imported batch into the store.
    #[serde(rename = "processCSVData")]
    ProcessCsvData(Vec<GptRecord>),
    /// background -> popup: reload from the authoritative store.
    #[serde(rename = "refreshPopup")]
    RefreshPopup,
}

/// Page's answer to `scrapeGptData`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapeResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<GptRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapeResponse {
    pub fn ok(record: GptRecord) -> Self {
        ScrapeResponse { success: true, data: Some(record), error: None }
    }

    pub fn err(message: impl Into<String>) -> Self {
        ScrapeResponse { success: false, data: None, error: Some(message.into()) }
    }
}

/// Coordinator's answer to `processCSVData`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportResponse {
    pub status: String,
    #[serde(default)]
    pub added: usize,
    #[serde(default)]
    pub updated: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ImportResponse {
    pub fn success(outcome: MergeOutcome) -> Self {
        ImportResponse {
            status: "success".to_string(),
            added: outcome.added,
            updated: outcome.updated,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ImportResponse {
            status: "error".to_string(),
            added: 0,
            updated: 0,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}
