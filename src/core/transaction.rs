//! Normalization of backend transaction records.
//!
//! Transaction shapes differ per entity type: field names vary, dates
//! arrive as ISO strings, `DDMMYYYY` strings or epoch seconds, and amount
//! sign conventions differ per source. Everything funnels through
//! [`normalize`] into one common shape before aggregation.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use crate::core::model::SourceKind;

/// A transaction reshaped into the common schema.
///
/// `date` is either a real calendar date or `None`; an unparseable date
/// never leaks downstream as an invalid sentinel. `amount` is always
/// finite, defaulting to 0 on malformed input.
#[derive(Debug, Clone)]
pub struct NormalizedTransaction {
    pub id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub amount: f64,
    pub category: String,
    pub source: SourceKind,
    /// Original record, kept for traceability.
    pub raw: Value,
}

const AMOUNT_KEYS: [&str; 3] = ["amount", "amt", "value"];
const CATEGORY_KEYS: [&str; 4] = ["category", "tx_category", "category_name", "categoryName"];

/// Converts a raw backend record into a [`NormalizedTransaction`].
/// Pure function, no side effects.
pub fn normalize(raw: &Value, source: SourceKind) -> NormalizedTransaction {
    // Some endpoints wrap individual records in a data envelope too.
    let record = raw.get("data").unwrap_or(raw);

    let date = record.get("date").and_then(parse_date);

    let amount = AMOUNT_KEYS
        .iter()
        .find_map(|key| record.get(*key))
        .map(coerce_amount)
        .unwrap_or(0.0);

    let category = CATEGORY_KEYS
        .iter()
        .find_map(|key| record.get(*key))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "Uncategorized".to_string());

    let id = record
        .get("id")
        .or_else(|| record.get("tx_id"))
        .and_then(Value::as_i64);

    NormalizedTransaction {
        id,
        date,
        amount,
        category,
        source,
        raw: record.clone(),
    }
}

fn coerce_amount(value: &Value) -> f64 {
    let amount = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    if amount.is_finite() { amount } else { 0.0 }
}

/// Parses a date value in any of the formats the backend is known to emit.
/// Returns `None` for anything that does not resolve to a real calendar
/// date.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.date_naive()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    // Flask serializes Date columns in RFC 2822 form.
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%d", "%d%m%Y", "%d-%m-%Y", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }
    None
}

/// Wire format the backend expects for credit card transaction dates.
pub fn to_wire_date(date: NaiveDate) -> String {
    date.format("%d%m%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalizes_iso_date_and_amount() {
        let raw = json!({"id": 7, "date": "2024-03-12", "amount": -450.25, "category": "Food"});
        let tx = normalize(&raw, SourceKind::Bank);
        assert_eq!(tx.id, Some(7));
        assert_eq!(tx.date, Some(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()));
        assert_eq!(tx.amount, -450.25);
        assert_eq!(tx.category, "Food");
        assert_eq!(tx.source, SourceKind::Bank);
    }

    #[test]
    fn test_unparseable_date_becomes_none() {
        for bad in ["not-a-date", "2024-13-45", "32132024", ""] {
            let tx = normalize(&json!({"date": bad, "amount": 1.0}), SourceKind::Asset);
            assert_eq!(tx.date, None, "expected None for {bad:?}");
        }
        let tx = normalize(&json!({"amount": 1.0}), SourceKind::Asset);
        assert_eq!(tx.date, None);
    }

    #[test]
    fn test_accepts_backend_date_variants() {
        let ddmmyyyy = normalize(&json!({"date": "05012024"}), SourceKind::Credit);
        assert_eq!(ddmmyyyy.date, Some(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()));

        let rfc3339 = normalize(&json!({"date": "2024-06-01T10:30:00+05:30"}), SourceKind::Bank);
        assert_eq!(rfc3339.date, Some(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));

        let rfc2822 = normalize(
            &json!({"date": "Tue, 12 Mar 2024 00:00:00 GMT"}),
            SourceKind::Saving,
        );
        assert_eq!(rfc2822.date, Some(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()));

        let epoch = normalize(&json!({"date": 1700000000}), SourceKind::Asset);
        assert_eq!(epoch.date, Some(NaiveDate::from_ymd_opt(2023, 11, 14).unwrap()));
    }

    #[test]
    fn test_amount_fallback_keys_and_coercion() {
        assert_eq!(normalize(&json!({"amt": 12.5}), SourceKind::Bank).amount, 12.5);
        assert_eq!(normalize(&json!({"value": "99.9"}), SourceKind::Bank).amount, 99.9);
        assert_eq!(normalize(&json!({"amount": "oops"}), SourceKind::Bank).amount, 0.0);
        assert_eq!(normalize(&json!({"amount": null}), SourceKind::Bank).amount, 0.0);
        assert_eq!(normalize(&json!({}), SourceKind::Bank).amount, 0.0);
    }

    #[test]
    fn test_amount_is_always_finite() {
        let tx = normalize(&json!({"amount": "inf"}), SourceKind::Credit);
        assert!(tx.amount.is_finite());
        assert_eq!(tx.amount, 0.0);
    }

    #[test]
    fn test_category_fallback_chain() {
        assert_eq!(
            normalize(&json!({"tx_category": "Rent"}), SourceKind::Bank).category,
            "Rent"
        );
        assert_eq!(
            normalize(&json!({"categoryName": "Fuel"}), SourceKind::Credit).category,
            "Fuel"
        );
        assert_eq!(
            normalize(&json!({"category": "  "}), SourceKind::Bank).category,
            "Uncategorized"
        );
        assert_eq!(normalize(&json!({}), SourceKind::Bank).category, "Uncategorized");
    }

    #[test]
    fn test_unwraps_per_record_envelope_and_keeps_raw() {
        let raw = json!({"data": {"id": 1, "amount": 5.0, "note": "extra"}});
        let tx = normalize(&raw, SourceKind::Saving);
        assert_eq!(tx.amount, 5.0);
        assert_eq!(tx.raw.get("note").and_then(Value::as_str), Some("extra"));
    }

    #[test]
    fn test_wire_date_format() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(to_wire_date(date), "05012024");
    }
}
