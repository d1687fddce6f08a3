//! chrome.storage.local access for the record list.
//!
//! Every mutation is read-entire-list -> mutate -> write-entire-list, and
//! all writers are serialized through one async mutex so overlapping popup
//! operations cannot lose updates.

use crate::error::{js_message, Error};
use crate::library::Library;
use crate::record::GptRecord;
use futures::lock::Mutex;
use serde::Deserialize;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

// Import JS bridge functions (shared by the popup and background pages)
#[wasm_bindgen(module = "/storage.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeStorage(key: &str) -> Result<(), JsValue>;
}

/// Key holding the unified record list.
const LIST_KEY: &str = "gptDataList";

/// Raw import buffer written by older extension versions. Merged into the
/// unified list on read, retired after the next successful write, never
/// written again.
const LEGACY_KEY: &str = "csvData";

thread_local! {
    static WRITE_LOCK: Rc<Mutex<()>> = Rc::new(Mutex::new(()));
}

fn write_lock() -> Rc<Mutex<()>> {
    WRITE_LOCK.with(|lock| Rc::clone(lock))
}

/// Row shape of the legacy buffer (old CSV imports kept the `gptName`
/// header).
#[derive(Debug, Deserialize)]
struct LegacyRow {
    #[serde(rename = "gptName", alias = "name", default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: String,
}

fn legacy_records(rows: Vec<LegacyRow>) -> Vec<GptRecord> {
    rows.into_iter()
        .filter(|row| !row.url.trim().is_empty())
        .map(|row| GptRecord::new(row.name, row.description, row.url))
        .collect()
}

async fn read_raw() -> Result<(Library, bool), Error> {
    let value = getStorage(LIST_KEY)
        .await
        .map_err(|e| Error::storage(js_message(&e)))?;
    let mut library: Library = if value.is_null() || value.is_undefined() {
        Library::new()
    } else {
        serde_wasm_bindgen::from_value(value)
            .map_err(|e| Error::storage(format!("unreadable record list: {e}")))?
    };

    let legacy = getStorage(LEGACY_KEY)
        .await
        .map_err(|e| Error::storage(js_message(&e)))?;
    let mut had_legacy = false;
    if !legacy.is_null() && !legacy.is_undefined() {
        match serde_wasm_bindgen::from_value::<Vec<LegacyRow>>(legacy) {
            Ok(rows) => {
                had_legacy = true;
                let records = legacy_records(rows);
                if !records.is_empty() {
                    let outcome = library.merge(records);
                    log::info!(
                        "migrated legacy import buffer: {} added, {} updated",
                        outcome.added,
                        outcome.updated
                    );
                }
            }
            Err(e) => log::warn!("ignoring unreadable legacy import buffer: {e}"),
        }
    }

    Ok((library, had_legacy))
}

/// Load the current library. An absent key is an empty library.
pub async fn load() -> Result<Library, Error> {
    let (library, _) = read_raw().await?;
    Ok(library)
}

/// Apply one mutation under the single-writer lock and persist the result.
/// Returns the closure's value together with the authoritative post-write
/// library, so callers re-render without trusting a stale copy.
pub async fn update<T>(mutate: impl FnOnce(&mut Library) -> T) -> Result<(T, Library), Error> {
    let lock = write_lock();
    let _guard = lock.lock().await;

    let (mut library, had_legacy) = read_raw().await?;
    let result = mutate(&mut library);

    let value = serde_wasm_bindgen::to_value(&library)
        .map_err(|e| Error::storage(format!("unserializable record list: {e}")))?;
    setStorage(LIST_KEY, value)
        .await
        .map_err(|e| Error::storage(js_message(&e)))?;

    if had_legacy {
        // The buffer now lives in the unified list; retire the old key.
        if let Err(e) = removeStorage(LEGACY_KEY).await {
            log::warn!("failed to retire legacy import buffer: {}", js_message(&e));
        }
    }

    Ok((result, library))
}
