//! Desired-state principals and the admin credential.
//!
//! Both are parsed from secret-store JSON payloads. Secret material is kept
//! behind [`Password`], whose `Debug` output is redacted so that records can
//! be logged safely.

use std::fmt::{Debug, Formatter};

use principal_sync_core::{AppError, AppResult, NonEmptyString};
use serde_json::{Map, Value};

use crate::role::{RoleGrant, translate_role_grants};

/// Secret string that never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Wraps a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Exposes the secret value for the transport layer.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl Debug for Password {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("Password(<redacted>)")
    }
}

/// One desired principal read from an application-user secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    username: NonEmptyString,
    password: Password,
    raw_roles: Vec<Value>,
    source_secret: String,
}

impl CredentialRecord {
    /// Creates a credential record.
    pub fn new(
        username: impl Into<String>,
        password: Password,
        raw_roles: Vec<Value>,
        source_secret: impl Into<String>,
    ) -> AppResult<Self> {
        let username = NonEmptyString::new(username)
            .map_err(|_| AppError::Validation("principal username must not be empty".to_owned()))?;

        if password.expose().is_empty() {
            return Err(AppError::Validation(format!(
                "principal '{username}' has an empty password"
            )));
        }

        Ok(Self {
            username,
            password,
            raw_roles,
            source_secret: source_secret.into(),
        })
    }

    /// Parses an application-user secret payload of the shape
    /// `{username, password, db_roles?}`.
    ///
    /// A `db_roles` value that is not an array is treated as empty so that
    /// role translation falls back to the default grant.
    pub fn from_secret_payload(source_secret: &str, payload: &Value) -> AppResult<Self> {
        let fields = payload_object(source_secret, payload)?;
        let username = required_string(source_secret, fields, "username")?;
        let password = required_string(source_secret, fields, "password")?;
        let raw_roles = fields
            .get("db_roles")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Self::new(username, Password::new(password), raw_roles, source_secret)
    }

    /// Returns the principal username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the principal password.
    #[must_use]
    pub fn password(&self) -> &Password {
        &self.password
    }

    /// Returns the untranslated role descriptors.
    #[must_use]
    pub fn raw_roles(&self) -> &[Value] {
        self.raw_roles.as_slice()
    }

    /// Returns the name of the secret this record was read from.
    #[must_use]
    pub fn source_secret(&self) -> &str {
        self.source_secret.as_str()
    }

    /// Translates the stored role descriptors into grants.
    #[must_use]
    pub fn role_grants(&self) -> Vec<RoleGrant> {
        translate_role_grants(&self.raw_roles)
    }

    /// Returns whether no stored descriptor survives translation, so the
    /// default grant applies.
    #[must_use]
    pub fn uses_default_grant(&self) -> bool {
        self.raw_roles
            .iter()
            .all(|entry| RoleGrant::from_descriptor(entry).is_none())
    }
}

/// Credential of the privileged principal that owns the session.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredential {
    username: NonEmptyString,
    password: Password,
    connection_string: Option<Password>,
}

impl AdminCredential {
    /// Parses the admin secret payload of the shape
    /// `{username, password, connection_string?}`.
    pub fn from_secret_payload(source_secret: &str, payload: &Value) -> AppResult<Self> {
        let fields = payload_object(source_secret, payload)?;
        let username = required_string(source_secret, fields, "username")?;
        let password = required_string(source_secret, fields, "password")?;
        let connection_string = fields
            .get("connection_string")
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
            .map(Password::new);

        Ok(Self {
            username: NonEmptyString::new(username)?,
            password: Password::new(password),
            connection_string,
        })
    }

    /// Returns the admin username. It is never a deletion candidate.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the admin password.
    #[must_use]
    pub fn password(&self) -> &Password {
        &self.password
    }

    /// Returns the pre-built connection string, if the secret carries one.
    #[must_use]
    pub fn connection_string(&self) -> Option<&Password> {
        self.connection_string.as_ref()
    }
}

impl Debug for AdminCredential {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AdminCredential")
            .field("username", &self.username.as_str())
            .field("password", &self.password)
            .field("has_connection_string", &self.connection_string.is_some())
            .finish()
    }
}

fn payload_object<'a>(source_secret: &str, payload: &'a Value) -> AppResult<&'a Map<String, Value>> {
    payload.as_object().ok_or_else(|| {
        AppError::Validation(format!(
            "secret '{source_secret}' is not a key-value record"
        ))
    })
}

fn required_string<'a>(
    source_secret: &str,
    fields: &'a Map<String, Value>,
    key: &str,
) -> AppResult<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AppError::Validation(format!(
                "secret '{source_secret}' requires a non-empty string field '{key}'"
            ))
        })
}
