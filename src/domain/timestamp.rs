//! Loosely-typed timestamps as they arrive from the presentation layer.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A timestamp as sent by clients: either epoch milliseconds or a string.
///
/// Strings are kept verbatim. Before a write, every timestamp is normalized
/// to an ISO-8601 string with millisecond precision (`2024-01-15T10:30:00.000Z`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Milliseconds since the Unix epoch.
    Millis(i64),
    /// Any string, normally already ISO-8601.
    Text(String),
}

impl Timestamp {
    /// Returns the current time as an ISO-8601 string timestamp.
    pub fn now() -> Self {
        Self::Text(iso_now())
    }

    /// Creates a string timestamp from a UTC datetime.
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self::Text(to_iso(datetime))
    }

    /// Normalizes an optional timestamp into the string that gets persisted.
    ///
    /// Strings pass through untouched. Milliseconds are rendered in UTC.
    /// Missing or out-of-range values are stamped with the current time.
    pub fn normalize(value: Option<&Timestamp>) -> String {
        match value {
            Some(Timestamp::Text(text)) => text.clone(),
            Some(Timestamp::Millis(ms)) => DateTime::from_timestamp_millis(*ms)
                .map(to_iso)
                .unwrap_or_else(iso_now),
            None => iso_now(),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::from_datetime(datetime)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Millis(ms) => write!(f, "{}ms", ms),
            Timestamp::Text(text) => f.write_str(text),
        }
    }
}

/// Reads an optional timestamp without ever rejecting the surrounding note.
///
/// Integers become milliseconds, fractional numbers are truncated to
/// milliseconds, and strings are kept. Anything else (`null`, booleans,
/// objects) reads as absent and gets stamped with the current time on write.
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Millis(i64),
        Fractional(f64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Loose::deserialize(deserializer)? {
        Loose::Millis(ms) => Some(Timestamp::Millis(ms)),
        Loose::Fractional(ms) if ms.is_finite() => Some(Timestamp::Millis(ms.trunc() as i64)),
        Loose::Text(text) => Some(Timestamp::Text(text)),
        Loose::Fractional(_) | Loose::Other(_) => None,
    })
}

/// Current UTC time as an ISO-8601 string with millisecond precision.
pub fn iso_now() -> String {
    to_iso(Utc::now())
}

fn to_iso(datetime: DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn text_passes_through_verbatim() {
        let ts = Timestamp::Text("yesterday-ish".to_string());
        assert_eq!(Timestamp::normalize(Some(&ts)), "yesterday-ish");
    }

    #[test]
    fn millis_render_as_iso_utc() {
        let ts = Timestamp::Millis(1_705_314_600_123);
        assert_eq!(
            Timestamp::normalize(Some(&ts)),
            "2024-01-15T10:30:00.123Z"
        );
    }

    #[test]
    fn missing_is_stamped_with_now() {
        let before = Utc::now();
        let stamped = Timestamp::normalize(None);
        let parsed = DateTime::parse_from_rfc3339(&stamped)
            .unwrap()
            .with_timezone(&Utc);
        assert!(parsed >= before - chrono::Duration::milliseconds(1));
        assert!(stamped.ends_with('Z'));
    }

    #[test]
    fn out_of_range_millis_fall_back_to_now() {
        let ts = Timestamp::Millis(i64::MAX);
        let stamped = Timestamp::normalize(Some(&ts));
        assert!(DateTime::parse_from_rfc3339(&stamped).is_ok());
    }

    #[test]
    fn from_datetime_uses_millisecond_precision() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(
            Timestamp::from(dt),
            Timestamp::Text("2024-01-15T10:30:00.000Z".to_string())
        );
    }

    #[test]
    fn deserializes_numbers_and_strings() {
        let n: Timestamp = serde_json::from_str("1705314600000").unwrap();
        assert_eq!(n, Timestamp::Millis(1_705_314_600_000));
        let s: Timestamp = serde_json::from_str("\"2024-01-15T10:30:00.000Z\"").unwrap();
        assert_eq!(s, Timestamp::Text("2024-01-15T10:30:00.000Z".to_string()));
    }

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "deserialize_lenient")]
        at: Option<Timestamp>,
    }

    fn lenient(json: &str) -> Option<Timestamp> {
        serde_json::from_str::<Holder>(&format!("{{\"at\": {json}}}"))
            .unwrap()
            .at
    }

    #[test]
    fn lenient_truncates_fractional_millis() {
        assert_eq!(lenient("1705314600000.5"), Some(Timestamp::Millis(1_705_314_600_000)));
    }

    #[test]
    fn lenient_reads_unusable_values_as_absent() {
        assert_eq!(lenient("true"), None);
        assert_eq!(lenient("null"), None);
        assert_eq!(lenient("{\"seconds\": 1}"), None);
        assert_eq!(lenient("\"2024-01-15\""), Some(Timestamp::Text("2024-01-15".into())));
    }
}
