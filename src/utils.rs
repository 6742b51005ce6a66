//! Utility functions for date handling and API payload quirks

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer};

/// Accepted layouts for timestamps without an offset
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 date or date-time
///
/// Accepts a bare date (midnight is assumed), a date-time with `T` or space as
/// separator, optional fractional seconds, and an optional UTC offset. Offsets
/// are dropped: the wall-clock time is kept, which is what the MES stores.
///
/// # Examples
///
/// ```
/// use busca_retrabalho::utils::parse_iso_datetime;
///
/// let dt = parse_iso_datetime("2024-03-01").unwrap();
/// assert_eq!(dt.to_string(), "2024-03-01 00:00:00");
///
/// let dt = parse_iso_datetime("2024-03-01T08:15:00-03:00").unwrap();
/// assert_eq!(dt.to_string(), "2024-03-01 08:15:00");
/// ```
pub fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Format a timestamp the way the API expects it in query strings
///
/// Seconds are always present; microseconds only when non-zero.
pub fn format_iso_datetime(value: &NaiveDateTime) -> String {
    if value.nanosecond() == 0 {
        value.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Boolean query value as the MES API reads it
///
/// The API has always received Python-style capitalized booleans.
pub fn query_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Extract the `mensagem` field from an API error body
///
/// Returns `None` when the body is not JSON or carries no usable message.
pub fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("mensagem")
        .and_then(|m| m.as_str())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Serde helper for ISO-8601 timestamps sent by the API
pub fn deserialize_iso_datetime<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_iso_datetime(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid ISO-8601 timestamp: {raw}")))
}

/// Serde helper for operation codes sent either as strings or integers
pub fn deserialize_operation_code<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Code>::deserialize(deserializer)?.map(|code| match code {
        Code::Text(text) => text.trim().to_string(),
        Code::Number(number) => number.to_string(),
    }))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_datetime_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 15, 0)
            .unwrap();

        assert_eq!(parse_iso_datetime("2024-03-01T08:15:00"), Some(expected));
        assert_eq!(parse_iso_datetime("2024-03-01 08:15:00"), Some(expected));
        assert_eq!(parse_iso_datetime("2024-03-01T08:15"), Some(expected));
        assert_eq!(parse_iso_datetime("2024-03-01T08:15:00Z"), Some(expected));
        assert_eq!(
            parse_iso_datetime("2024-03-01T08:15:00+02:00"),
            Some(expected)
        );
        assert_eq!(
            parse_iso_datetime("2024-03-01"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
        );
    }

    #[test]
    fn test_parse_iso_datetime_fraction() {
        let dt = parse_iso_datetime("2024-03-01T08:15:00.250000").unwrap();
        assert_eq!(dt.nanosecond(), 250_000_000);
    }

    #[test]
    fn test_parse_iso_datetime_rejects_garbage() {
        assert_eq!(parse_iso_datetime("01/03/2024"), None);
        assert_eq!(parse_iso_datetime(""), None);
        assert_eq!(parse_iso_datetime("2024-13-01"), None);
    }

    #[test]
    fn test_format_iso_datetime() {
        let dt = parse_iso_datetime("2024-03-01").unwrap();
        assert_eq!(format_iso_datetime(&dt), "2024-03-01T00:00:00");

        let dt = parse_iso_datetime("2024-03-01T23:59:59.5").unwrap();
        assert_eq!(format_iso_datetime(&dt), "2024-03-01T23:59:59.500000");
    }

    #[test]
    fn test_query_bool() {
        assert_eq!(query_bool(true), "True");
        assert_eq!(query_bool(false), "False");
    }

    #[test]
    fn test_api_error_message() {
        assert_eq!(
            api_error_message(r#"{"mensagem": "usuário inválido"}"#),
            Some("usuário inválido".to_string())
        );
        assert_eq!(api_error_message(r#"{"mensagem": "  "}"#), None);
        assert_eq!(api_error_message(r#"{"erro": "x"}"#), None);
        assert_eq!(api_error_message("<html>502</html>"), None);
    }
}
