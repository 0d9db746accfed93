//! API Request and Response Types
//!
//! Request bodies and query filters for every resource, plus the row types
//! read back from PostgreSQL through `row_to_json`. Extended rows embed
//! their base row with `#[serde(flatten)]`.

mod agent;
pub use agent::*;

mod client;
pub use client::*;

mod communication;
pub use communication::*;

mod dashboard;
pub use dashboard::*;

mod deal;
pub use deal::*;

mod property;
pub use property::*;

mod showing;
pub use showing::*;

mod task;
pub use task::*;

mod user;
pub use user::*;

pub use lenient::{
    lenient_date, lenient_f64, lenient_i32, lenient_i64, lenient_timestamp,
};

/// Deserializers for form-style input.
///
/// Browsers send numbers as strings and empty inputs as `""`. These accept
/// a JSON number or a numeric string, and treat `null` and blank strings as
/// absent. They also work for query strings, where every value is text.
pub mod lenient {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;
    use serde_json::Value;

    fn raw_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<RawInput>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Null => None,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(RawInput::Text(trimmed.to_string()))
                }
            }
            Value::Number(n) => Some(RawInput::Number(n)),
            other => Some(RawInput::Other(other.to_string())),
        })
    }

    enum RawInput {
        Text(String),
        Number(serde_json::Number),
        Other(String),
    }

    pub fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        match raw_text(deserializer)? {
            None => Ok(None),
            Some(RawInput::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| D::Error::custom("number out of range")),
            Some(RawInput::Text(s)) => s
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid number: {}", s))),
            Some(RawInput::Other(s)) => Err(D::Error::custom(format!("expected a number, got {}", s))),
        }
    }

    pub fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        match raw_text(deserializer)? {
            None => Ok(None),
            Some(RawInput::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("expected an integer, got {}", n))),
            Some(RawInput::Text(s)) => s
                .parse::<i64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid integer: {}", s))),
            Some(RawInput::Other(s)) => Err(D::Error::custom(format!("expected an integer, got {}", s))),
        }
    }

    pub fn lenient_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
        match lenient_i64(deserializer)? {
            None => Ok(None),
            Some(v) => i32::try_from(v)
                .map(Some)
                .map_err(|_| D::Error::custom(format!("integer out of range: {}", v))),
        }
    }

    /// `YYYY-MM-DD`, or the date part of a longer timestamp.
    pub fn lenient_date<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match raw_text(deserializer)? {
            None => Ok(None),
            Some(RawInput::Text(s)) => parse_date(&s)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid date: {}", s))),
            Some(RawInput::Number(n)) => Err(D::Error::custom(format!("invalid date: {}", n))),
            Some(RawInput::Other(s)) => Err(D::Error::custom(format!("invalid date: {}", s))),
        }
    }

    /// RFC 3339, or a naive date-time / date read as UTC.
    pub fn lenient_timestamp<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match raw_text(deserializer)? {
            None => Ok(None),
            Some(RawInput::Text(s)) => parse_timestamp(&s)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid date-time: {}", s))),
            Some(RawInput::Number(n)) => Err(D::Error::custom(format!("invalid date-time: {}", n))),
            Some(RawInput::Other(s)) => Err(D::Error::custom(format!("invalid date-time: {}", s))),
        }
    }

    pub fn parse_date(s: &str) -> Option<NaiveDate> {
        let head = s.get(..10).unwrap_or(s);
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    }

    pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Some(naive.and_utc());
            }
        }
        if s.len() == 10 {
            return NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc());
        }
        None
    }

}
