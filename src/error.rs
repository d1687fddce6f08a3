//! Error taxonomy shared by all extension contexts.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Everything that can go wrong behind a user action. Each variant maps to
/// one transient status notice in the popup; nothing is retried
/// automatically.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Target fields absent or empty on the scraped page.
    #[error("scrape failed: {0}")]
    Scrape(String),

    /// The underlying chrome.storage operation failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Missing required columns or an empty import file.
    #[error("invalid import: {0}")]
    ImportValidation(String),

    /// No response, or a disconnected receiving context.
    #[error("messaging failure: {0}")]
    Messaging(String),
}

impl Error {
    pub fn scrape(msg: impl Into<String>) -> Self {
        Error::Scrape(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    pub fn import(msg: impl Into<String>) -> Self {
        Error::ImportValidation(msg.into())
    }

    pub fn messaging(msg: impl Into<String>) -> Self {
        Error::Messaging(msg.into())
    }
}

/// Render a JS-side rejection into a message we can carry in an [`Error`].
pub fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}
