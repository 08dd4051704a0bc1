//! Timestamps: millisecond precision, ISO-8601 on the wire.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// Timestamp type used for commits, releases and exports.
pub type Timestamp = DateTime<Utc>;

/// Current time truncated to whole milliseconds.
///
/// Truncating at creation keeps serialize/deserialize round-trips exact.
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(3)
}

/// Format a timestamp the way it is persisted (`2025-01-01T12:00:00.000Z`).
pub fn to_iso(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `YYYY-MM-DD` for the given timestamp.
pub fn date_stamp(ts: &Timestamp) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Serde adapter writing [`to_iso`] and reading any RFC 3339 timestamp.
pub mod iso {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{Timestamp, to_iso};

    /// Serialize as an ISO-8601 string with milliseconds.
    pub fn serialize<S>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&to_iso(ts))
    }

    /// Deserialize from an RFC 3339 string, normalizing to UTC.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp `{raw}`: {e}")))
    }

    /// Same as the parent module, for `Option<Timestamp>` fields.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        use super::super::{Timestamp, to_iso};

        /// Serialize `Some` as an ISO-8601 string, `None` as `null`.
        pub fn serialize<S>(ts: &Option<Timestamp>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match ts {
                Some(ts) => serializer.serialize_str(&to_iso(ts)),
                None => serializer.serialize_none(),
            }
        }

        /// Deserialize an optional RFC 3339 string.
        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| {
                    chrono::DateTime::parse_from_rfc3339(&raw)
                        .map(|ts| ts.with_timezone(&chrono::Utc))
                        .map_err(|e| {
                            serde::de::Error::custom(format!("invalid timestamp `{raw}`: {e}"))
                        })
                })
                .transpose()
        }
    }
}
