//! CSV import/export for the record list.

use crate::error::Error;
use crate::record::GptRecord;
use csv::{ReaderBuilder, Trim, WriterBuilder};

/// Column order for export; also the required header set for import.
pub const COLUMNS: [&str; 3] = ["name", "description", "url"];

/// Header name written by older extension versions; accepted on import.
const LEGACY_NAME_COLUMN: &str = "gptName";

/// Export filename offered to the browser's download path.
pub const EXPORT_FILENAME: &str = "gpt_data.csv";

fn column_index(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| names.contains(&header))
}

/// Parse import text into a record batch.
///
/// The header row must carry all three recognized column names (any order;
/// `gptName` is accepted for `name`). Extra columns are ignored, a missing
/// required column rejects the whole file, and rows whose `url` is empty
/// after trimming are dropped. A file with no usable data rows is an error
/// so "nothing to import" is distinguishable from a zero-change merge.
pub fn parse_import(text: &str) -> Result<Vec<GptRecord>, Error> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| Error::import(format!("unreadable header row: {e}")))?
        .clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(Error::import("file is empty"));
    }

    let name_idx = column_index(&headers, &["name", LEGACY_NAME_COLUMN]);
    let description_idx = column_index(&headers, &["description"]);
    let url_idx = column_index(&headers, &["url"]);
    let (name_idx, description_idx, url_idx) = match (name_idx, description_idx, url_idx) {
        (Some(n), Some(d), Some(u)) => (n, d, u),
        _ => {
            let missing: Vec<&str> = [
                (name_idx, "name"),
                (description_idx, "description"),
                (url_idx, "url"),
            ]
            .into_iter()
            .filter_map(|(idx, col)| idx.is_none().then_some(col))
            .collect();
            return Err(Error::import(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }
    };

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| Error::import(format!("malformed row: {e}")))?;
        let url = row.get(url_idx).unwrap_or_default();
        if url.is_empty() {
            log::warn!("skipping import row with empty url");
            continue;
        }
        records.push(GptRecord::new(
            row.get(name_idx).unwrap_or_default(),
            row.get(description_idx).unwrap_or_default(),
            url,
        ));
    }

    if records.is_empty() {
        return Err(Error::import("file has no data rows"));
    }
    Ok(records)
}

/// Serialize the full list with a header row in fixed column order,
/// RFC 4180 quoting. Importing the result into an empty library reproduces
/// the list exactly.
pub fn export_csv(records: &[GptRecord]) -> Result<String, Error> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    writer
        .write_record(COLUMNS)
        .map_err(|e| Error::storage(format!("export failed: {e}")))?;
    for record in records {
        writer
            .write_record([&record.name, &record.description, &record.url])
            .map_err(|e| Error::storage(format!("export failed: {e}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::storage(format!("export failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| Error::storage(format!("export failed: {e}")))
}
