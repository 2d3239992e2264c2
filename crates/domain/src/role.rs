//! Role grants and translation of stored role descriptors.

use principal_sync_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role applied when a credential record carries no well-formed grant.
pub const DEFAULT_GRANT_ROLE: &str = "readWrite";

/// Database scope of the default grant.
pub const DEFAULT_GRANT_DATABASE: &str = "admin";

/// Authorization unit attached to a principal: a role scoped to a database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleGrant {
    role: String,
    #[serde(rename = "db")]
    database: String,
}

impl RoleGrant {
    /// Creates a role grant. Both fields must be non-blank.
    pub fn new(role: impl Into<String>, database: impl Into<String>) -> AppResult<Self> {
        let role = role.into();
        let database = database.into();

        if role.trim().is_empty() {
            return Err(AppError::Validation(
                "role grant requires a non-empty role".to_owned(),
            ));
        }

        if database.trim().is_empty() {
            return Err(AppError::Validation(
                "role grant requires a non-empty database".to_owned(),
            ));
        }

        Ok(Self { role, database })
    }

    /// Returns the `readWrite@admin` fallback grant.
    #[must_use]
    pub fn default_grant() -> Self {
        Self {
            role: DEFAULT_GRANT_ROLE.to_owned(),
            database: DEFAULT_GRANT_DATABASE.to_owned(),
        }
    }

    /// Returns the role name.
    #[must_use]
    pub fn role(&self) -> &str {
        self.role.as_str()
    }

    /// Returns the database the role is scoped to.
    #[must_use]
    pub fn database(&self) -> &str {
        self.database.as_str()
    }

    pub(crate) fn from_descriptor(entry: &Value) -> Option<Self> {
        let descriptor = entry.as_object()?;
        let role = descriptor.get("role").and_then(Value::as_str)?;
        let database = descriptor.get("db").and_then(Value::as_str)?;

        Self::new(role, database).ok()
    }
}

/// Translates stored `{role, db}` descriptors into role grants.
///
/// Entries that are not objects with non-empty string `role` and `db` fields
/// are discarded. When nothing survives, the result is exactly
/// [`RoleGrant::default_grant`].
#[must_use]
pub fn translate_role_grants(entries: &[Value]) -> Vec<RoleGrant> {
    let grants: Vec<RoleGrant> = entries
        .iter()
        .filter_map(RoleGrant::from_descriptor)
        .collect();

    if grants.is_empty() {
        return vec![RoleGrant::default_grant()];
    }

    grants
}
