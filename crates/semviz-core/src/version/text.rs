//! Serde helpers for versions stored as `"1.2.3"` strings.
//!
//! `currentVersion` is persisted as an object, but commits and releases carry
//! their versions as strings. Use with `#[serde(with = "...")]`.

use serde::{Deserialize, Deserializer, Serializer};

use super::{Version, parse_version};

/// Serialize a [`Version`] as its dotted string.
pub fn serialize<S>(version: &Version, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(version)
}

/// Deserialize a [`Version`] from a dotted string (optional `v` prefix).
pub fn deserialize<'de, D>(deserializer: D) -> Result<Version, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_version(&raw).map_err(serde::de::Error::custom)
}

/// Same as the parent module, for `Option<Version>` fields.
pub mod option {
    use super::{Deserialize, Deserializer, Serializer, Version, parse_version};

    /// Serialize `Some(version)` as a string and `None` as `null`.
    pub fn serialize<S>(version: &Option<Version>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match version {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional version string. Empty strings count as absent.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Version>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => parse_version(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}
