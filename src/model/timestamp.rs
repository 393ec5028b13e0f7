use std::ops::Deref;

use chrono::{DateTime, NaiveDateTime, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};

/// The layout the backend uses for its `created` and `updated` fields.
const BACKEND_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3fZ";

pub fn now() -> Timestamp {
    Timestamp(Utc::now())
}

/// A UTC timestamp as written by the backend, e.g. `2024-03-01 12:30:00.000Z`.
///
/// RFC 3339 input is accepted as well so records created by other clients still parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, new)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn parse(input: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.fZ")
            .map(|naive| Self(naive.and_utc()))
            .or_else(|err| {
                DateTime::parse_from_rfc3339(input)
                    .map(|dt| Self(dt.with_timezone(&Utc)))
                    .map_err(|_| err)
            })
    }
}

impl Deref for Timestamp {
    type Target = DateTime<Utc>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(BACKEND_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn parses_backend_format() {
        let parsed = Timestamp::parse("2024-03-01 12:30:05.250Z").unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap() + Duration::milliseconds(250);

        assert_eq!(*parsed, expected);
    }

    #[test]
    fn parses_rfc3339_as_fallback() {
        let parsed = Timestamp::parse("2024-03-01T14:30:05+02:00").unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();

        assert_eq!(*parsed, expected, "offsets should be normalized to UTC");
    }

    #[test]
    fn rejects_garbage() {
        assert!(Timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn serializes_in_backend_format() {
        let timestamp = Timestamp::new(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap());
        let json = serde_json::to_string(&timestamp).unwrap();

        assert_eq!(json, r#""2023-12-31 23:59:59.000Z""#);
    }
}
