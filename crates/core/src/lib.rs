//! Shared primitives for all Rust crates in principal-sync.

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result type used across principal-sync crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Identifier correlating every log event of a single reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Creates a random run identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RunId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Error categories of a reconciliation run.
///
/// Every variant is fatal to the run. Tolerated conflicts (duplicate
/// create, missing delete target) are modelled as explicit outcomes on the
/// ports and never reach this type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Required configuration is missing or unparsable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Desired state could not be read from the secret store.
    #[error("discovery error: {0}")]
    Discovery(String),

    /// Actual principals could not be read from the cluster.
    #[error("inspection error: {0}")]
    Inspection(String),

    /// A create, update, or delete against the cluster failed.
    #[error("apply error: {0}")]
    Apply(String),

    /// Session establishment or the liveness probe failed.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns a stable tag naming the error category.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::Discovery(_) => "discovery_error",
            Self::Inspection(_) => "inspection_error",
            Self::Apply(_) => "apply_error",
            Self::Connectivity(_) => "connectivity_error",
            Self::Validation(_) => "validation_error",
            Self::Internal(_) => "internal_error",
        }
    }
}
