//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod principal;
mod reconciliation;
mod role;
mod secret_name;

pub use principal::{AdminCredential, CredentialRecord, Password};
pub use reconciliation::{PrincipalChange, ReconciliationResult};
pub use role::{DEFAULT_GRANT_DATABASE, DEFAULT_GRANT_ROLE, RoleGrant, translate_role_grants};
pub use secret_name::{DEFAULT_APP_USER_SECRET_PREFIX, SecretNamePattern};
