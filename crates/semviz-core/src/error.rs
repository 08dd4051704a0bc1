//! Error types for semviz-core.
//!
//! Each module that can fail owns its error enum; this one covers
//! configuration. See also [`crate::version::VersionError`],
//! [`crate::snapshot::SnapshotError`], [`crate::store::StoreError`] and
//! [`crate::release::ReleaseRejected`].

use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// No state file was given and no platform data directory exists.
    #[error("cannot determine where to keep state; pass --state or set state_file")]
    NoStateLocation,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;
