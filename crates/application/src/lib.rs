//! Application services and ports.

#![forbid(unsafe_code)]

mod credential_discovery_service;
mod principal_inspector;
mod principal_session_ports;
mod principal_sync_service;
mod reconciliation_service;
mod secret_store_ports;

pub use credential_discovery_service::CredentialDiscoveryService;
pub use principal_inspector::inspect_principals;
pub use principal_session_ports::{
    ClusterEndpoint, CreatePrincipalOutcome, DEFAULT_CLUSTER_PORT, DeletePrincipalOutcome,
    PrincipalSession, PrincipalSessionConnector,
};
pub use principal_sync_service::{PrincipalSyncService, SyncRequest};
pub use reconciliation_service::reconcile_principals;
pub use secret_store_ports::{SecretNamePage, SecretStore};

#[cfg(test)]
mod test_fakes;
