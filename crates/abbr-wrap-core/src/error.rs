//! Error types for abbr-wrap-core.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why an ingested abbreviation entry was dropped during sanitization.
///
/// Sanitization never fails as a whole; each rejected entry is reported
/// with one of these reasons and the rest of the list is kept.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The abbreviation text was empty after sanitization.
    #[error("abbreviation is empty")]
    EmptyShort,

    /// The expansion text was empty after sanitization.
    #[error("expansion is empty")]
    EmptyExpansion,

    /// An earlier entry already registered the same abbreviation.
    #[error("duplicate abbreviation")]
    Duplicate,
}
