//! Shared export helpers.

use crate::models::Quote;

/// Render the full collection as pretty-printed JSON, no filtering.
pub fn render_json_export(quotes: &[Quote]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(quotes)
}

/// Deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(date: chrono::NaiveDate) -> String {
    format!("quotes-{}.json", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::seed_defaults;

    #[test]
    fn render_json_export_is_pretty_and_complete() {
        let quotes = seed_defaults();
        let rendered = render_json_export(&quotes).unwrap();

        assert!(rendered.contains("\"updatedAt\""));
        let parsed: Vec<Quote> = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, quotes);
    }

    #[test]
    fn suggested_export_file_name_is_dated() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(suggested_export_file_name(date), "quotes-2024-03-09.json");
    }
}
