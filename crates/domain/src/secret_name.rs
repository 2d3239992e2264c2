//! Naming convention of application-user secrets.

use principal_sync_core::{AppError, AppResult};

/// Literal prefix of application-user secret names:
/// `documentdb-elastic-app-user-<username>-<environment>`.
pub const DEFAULT_APP_USER_SECRET_PREFIX: &str = "documentdb-elastic-app-user-";

/// Filter selecting the desired-state secrets of one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretNamePattern {
    prefix: String,
    environment: String,
    suffix: String,
}

impl SecretNamePattern {
    /// Creates a pattern from a name prefix and an environment tag.
    pub fn new(prefix: impl Into<String>, environment: impl Into<String>) -> AppResult<Self> {
        let prefix = prefix.into();
        let environment = environment.into();

        if prefix.trim().is_empty() {
            return Err(AppError::Configuration(
                "secret name prefix must not be empty".to_owned(),
            ));
        }

        if environment.trim().is_empty() {
            return Err(AppError::Configuration(
                "environment must not be empty".to_owned(),
            ));
        }

        let suffix = format!("-{environment}");
        Ok(Self {
            prefix,
            environment,
            suffix,
        })
    }

    /// Returns the literal name prefix, used as the server-side list filter.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.prefix.as_str()
    }

    /// Returns the environment tag.
    #[must_use]
    pub fn environment(&self) -> &str {
        self.environment.as_str()
    }

    /// Returns whether a secret name belongs to this pattern.
    ///
    /// The name must contain the prefix and end with `-{environment}`; a name
    /// that merely contains the environment tag elsewhere does not match.
    #[must_use]
    pub fn matches(&self, secret_name: &str) -> bool {
        secret_name.contains(self.prefix.as_str()) && secret_name.ends_with(self.suffix.as_str())
    }
}
