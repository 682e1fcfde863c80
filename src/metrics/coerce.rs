//! Defensive coercion over `row_to_json` documents.
//!
//! The stores hold years of records written by several generations of
//! the storefront: amounts as numbers or numeric strings, timestamps as
//! native timestamptz or stringified ISO dates, display fields missing
//! outright. A malformed row degrades to a default and falls out of
//! windowed logic; it never aborts a snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

pub const FALLBACK_DISPLAY_NAME: &str = "(unknown)";

pub fn text_field(row: &Value, key: &str) -> String {
    row.as_object()
        .and_then(|object| object.get(key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_default()
}

/// Lifecycle labels compared across entities: trimmed, lowercased,
/// inner whitespace collapsed to underscores ("in review" == "in_review").
pub fn status_slug(row: &Value, key: &str) -> String {
    text_field(row, key)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Monetary or count field as an integer, accepting numbers and numeric
/// strings. Anything else is 0.
pub fn amount_field(row: &Value, key: &str) -> i64 {
    let Some(value) = row.as_object().and_then(|object| object.get(key)) else {
        return 0;
    };
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.round() as i64))
            .unwrap_or(0),
        Value::String(text) => {
            let trimmed = text.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|float| float.round() as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Timestamp field parsed leniently: RFC 3339 with or without a
/// trailing `Z`, or a bare `YYYY-MM-DD` taken as local midnight UTC.
/// Genuinely unparseable values are `None` and the row is excluded
/// from windowed queries.
pub fn datetime_field(row: &Value, key: &str) -> Option<DateTime<Utc>> {
    let text = row
        .as_object()
        .and_then(|object| object.get(key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())?;

    let mut normalized = text.to_string();
    if normalized.ends_with('Z') {
        normalized.truncate(normalized.len().saturating_sub(1));
        normalized.push_str("+00:00");
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// Calendar-date field: `YYYY-MM-DD`, or the date part of an RFC 3339
/// timestamp for stores that kept a full instant.
pub fn date_field(row: &Value, key: &str) -> Option<NaiveDate> {
    let text = row
        .as_object()
        .and_then(|object| object.get(key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())?;

    if let Ok(parsed) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(parsed);
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|parsed| parsed.date_naive())
}

pub fn int_field(row: &Value, key: &str) -> i64 {
    amount_field(row, key)
}

pub fn row_id(row: &Value) -> String {
    text_field(row, "id")
}

/// First non-empty candidate field, else the generic placeholder.
pub fn display_name(row: &Value, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| text_field(row, key))
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        amount_field, date_field, datetime_field, display_name, status_slug, text_field,
        FALLBACK_DISPLAY_NAME,
    };

    #[test]
    fn amounts_accept_numbers_and_numeric_strings() {
        let row = json!({
            "a": 25000,
            "b": "25000",
            "c": "25000.6",
            "d": 25000.4,
            "e": "not a number",
            "f": null
        });
        assert_eq!(amount_field(&row, "a"), 25000);
        assert_eq!(amount_field(&row, "b"), 25000);
        assert_eq!(amount_field(&row, "c"), 25001);
        assert_eq!(amount_field(&row, "d"), 25000);
        assert_eq!(amount_field(&row, "e"), 0);
        assert_eq!(amount_field(&row, "f"), 0);
        assert_eq!(amount_field(&row, "missing"), 0);
    }

    #[test]
    fn datetimes_parse_native_and_stringified_shapes() {
        let row = json!({
            "native": "2026-08-06T12:00:00+09:00",
            "zulu": "2026-08-06T03:00:00Z",
            "date_only": "2026-08-06",
            "garbage": "last tuesday"
        });
        let native = datetime_field(&row, "native").expect("parses offset timestamp");
        let zulu = datetime_field(&row, "zulu").expect("parses Z timestamp");
        assert_eq!(native, zulu);
        assert!(datetime_field(&row, "date_only").is_some());
        assert!(datetime_field(&row, "garbage").is_none());
        assert!(datetime_field(&row, "missing").is_none());
    }

    #[test]
    fn dates_accept_timestamps_from_newer_stores() {
        let row = json!({ "plain": "2026-09-01", "stamped": "2026-09-01T10:30:00+09:00" });
        assert_eq!(date_field(&row, "plain").map(|d| d.to_string()), Some("2026-09-01".into()));
        assert_eq!(date_field(&row, "stamped").map(|d| d.to_string()), Some("2026-09-01".into()));
    }

    #[test]
    fn status_slug_collapses_spacing_and_case() {
        let row = json!({ "status": "  In Review " });
        assert_eq!(status_slug(&row, "status"), "in_review");
    }

    #[test]
    fn display_name_falls_back_to_placeholder() {
        let row = json!({ "customer_name": "", "user_email": "kim@example.com" });
        assert_eq!(
            display_name(&row, &["customer_name", "user_email"]),
            "kim@example.com"
        );
        assert_eq!(display_name(&row, &["customer_name"]), FALLBACK_DISPLAY_NAME);
        assert_eq!(text_field(&row, "customer_name"), "");
    }
}
