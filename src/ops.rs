//! Display operations over a rendering copy: search and sort.

use crate::record::GptRecord;

/// Case-insensitive substring filter on name and description. An empty
/// query keeps everything.
pub fn filter_records(records: &[GptRecord], query: &str) -> Vec<GptRecord> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| {
            r.name.to_lowercase().contains(&query)
                || r.description.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

/// Sort records by name, case-insensitive ascending; ties broken by URL so
/// the order is stable across re-renders.
pub fn sort_by_name(records: &[GptRecord]) -> Vec<GptRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.url.cmp(&b.url))
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, description: &str, url: &str) -> GptRecord {
        GptRecord::new(name, description, url)
    }

    #[test]
    fn test_filter_matches_name_and_description() {
        let records = vec![
            record("Code Tutor", "Explains Rust", "https://a"),
            record("Chef", "recipes and cooking", "https://b"),
            record("Travel Guide", "city trips", "https://c"),
        ];

        let by_name = filter_records(&records, "code");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].url, "https://a");

        let by_description = filter_records(&records, "COOKING");
        assert_eq!(by_description.len(), 1);
        assert_eq!(by_description[0].url, "https://b");
    }

    #[test]
    fn test_filter_empty_query_keeps_all() {
        let records = vec![record("A", "a", "https://a"), record("B", "b", "https://b")];

        assert_eq!(filter_records(&records, "").len(), 2);
        assert_eq!(filter_records(&records, "   ").len(), 2);
    }

    #[test]
    fn test_filter_no_match() {
        let records = vec![record("A", "a", "https://a")];

        assert!(filter_records(&records, "zzz").is_empty());
    }

    #[test]
    fn test_sort_by_name_case_insensitive() {
        let records = vec![
            record("banana", "", "https://b"),
            record("Apple", "", "https://a"),
            record("cherry", "", "https://c"),
        ];

        let sorted = sort_by_name(&records);

        let names: Vec<&str> = sorted.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn test_sort_ties_break_on_url() {
        let records = vec![
            record("Same", "", "https://b"),
            record("Same", "", "https://a"),
        ];

        let sorted = sort_by_name(&records);

        assert_eq!(sorted[0].url, "https://a");
        assert_eq!(sorted[1].url, "https://b");
    }
}
