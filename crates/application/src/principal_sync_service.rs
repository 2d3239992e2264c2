//! One reconciliation run, wrapped in the session lifecycle.
//!
//! The admin credential is fetched once, a session is opened with it and
//! probed for liveness, then discovery, inspection, and reconciliation run
//! over that session. The session is closed on every path once it has
//! been opened.

use std::sync::Arc;

use tracing::{Instrument, info, info_span, warn};

use principal_sync_core::{AppResult, RunId};
use principal_sync_domain::{AdminCredential, ReconciliationResult, SecretNamePattern};

use crate::{
    ClusterEndpoint, CredentialDiscoveryService, PrincipalSession, PrincipalSessionConnector,
    inspect_principals, reconcile_principals,
};

/// Inputs of one reconciliation run.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Data-plane endpoint of the cluster.
    pub cluster_endpoint: ClusterEndpoint,
    /// Name of the secret holding the admin credential.
    pub admin_secret_name: String,
    /// Filter selecting the environment's application-user secrets.
    pub secret_pattern: SecretNamePattern,
}

/// Application service running a full reconciliation.
#[derive(Clone)]
pub struct PrincipalSyncService {
    discovery: CredentialDiscoveryService,
    connector: Arc<dyn PrincipalSessionConnector>,
}

impl PrincipalSyncService {
    /// Creates a new sync service.
    #[must_use]
    pub fn new(
        discovery: CredentialDiscoveryService,
        connector: Arc<dyn PrincipalSessionConnector>,
    ) -> Self {
        Self {
            discovery,
            connector,
        }
    }

    /// Runs one reconciliation and returns the usernames it touched.
    ///
    /// At most one run per cluster may be in flight; concurrent runs can
    /// race on the same username.
    pub async fn run(&self, request: &SyncRequest) -> AppResult<ReconciliationResult> {
        let run_id = RunId::new();
        let span = info_span!(
            "principal_sync",
            run_id = %run_id,
            environment = %request.secret_pattern.environment(),
            endpoint = %request.cluster_endpoint,
        );

        self.run_with_session(request).instrument(span).await
    }

    async fn run_with_session(&self, request: &SyncRequest) -> AppResult<ReconciliationResult> {
        let admin = self
            .discovery
            .fetch_admin_credential(request.admin_secret_name.as_str())
            .await?;

        let session = self
            .connector
            .connect(&admin, &request.cluster_endpoint)
            .await?;

        let outcome = self.reconcile_in_session(session.as_ref(), &admin, request).await;

        if let Err(error) = session.close().await {
            warn!(error = %error, "failed to close cluster session");
        }

        outcome
    }

    async fn reconcile_in_session(
        &self,
        session: &dyn PrincipalSession,
        admin: &AdminCredential,
        request: &SyncRequest,
    ) -> AppResult<ReconciliationResult> {
        session.ping().await?;
        info!(admin = %admin.username(), "connected to cluster");

        let desired = self.discovery.discover(&request.secret_pattern).await?;
        let actual = inspect_principals(session).await?;

        reconcile_principals(session, &desired, &actual, admin.username()).await
    }
}
