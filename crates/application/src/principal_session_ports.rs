use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use async_trait::async_trait;

use principal_sync_core::{AppError, AppResult};
use principal_sync_domain::{AdminCredential, Password, RoleGrant};

/// Default listener port of the document-database cluster.
pub const DEFAULT_CLUSTER_PORT: u16 = 27017;

/// Network location of the cluster's data-plane listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterEndpoint {
    host: String,
    port: u16,
}

impl ClusterEndpoint {
    /// Creates an endpoint from a host name and port.
    pub fn new(host: impl Into<String>, port: u16) -> AppResult<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(AppError::Configuration(
                "cluster endpoint must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            host: host.trim().to_owned(),
            port,
        })
    }

    /// Returns the host name.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    /// Returns the listener port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Display for ClusterEndpoint {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.host, self.port)
    }
}

/// Outcome of a create call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePrincipalOutcome {
    /// The principal was created.
    Created,
    /// The cluster reported that the principal already exists.
    AlreadyExists,
}

/// Outcome of a delete call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePrincipalOutcome {
    /// The principal was removed.
    Deleted,
    /// The cluster reported that the principal does not exist.
    AlreadyAbsent,
}

/// Port establishing privileged sessions against the cluster.
#[async_trait]
pub trait PrincipalSessionConnector: Send + Sync {
    /// Opens a session authenticated as the admin principal.
    ///
    /// Adapters report failures as `AppError::Connectivity`.
    async fn connect(
        &self,
        admin: &AdminCredential,
        endpoint: &ClusterEndpoint,
    ) -> AppResult<Box<dyn PrincipalSession>>;
}

/// Port for principal catalog reads and mutations over one session.
#[async_trait]
pub trait PrincipalSession: Send + Sync {
    /// Liveness probe; fails with `AppError::Connectivity`.
    async fn ping(&self) -> AppResult<()>;

    /// Lists usernames of all principals; fails with `AppError::Inspection`.
    async fn list_principals(&self) -> AppResult<BTreeSet<String>>;

    /// Creates a principal. An existing principal is reported as
    /// [`CreatePrincipalOutcome::AlreadyExists`], not as an error.
    async fn create_principal(
        &self,
        username: &str,
        password: &Password,
        grants: &[RoleGrant],
    ) -> AppResult<CreatePrincipalOutcome>;

    /// Rewrites password and grants of an existing principal.
    async fn update_principal(
        &self,
        username: &str,
        password: &Password,
        grants: &[RoleGrant],
    ) -> AppResult<()>;

    /// Deletes a principal. A missing principal is reported as
    /// [`DeletePrincipalOutcome::AlreadyAbsent`], not as an error.
    async fn delete_principal(&self, username: &str) -> AppResult<DeletePrincipalOutcome>;

    /// Releases the underlying connection.
    async fn close(&self) -> AppResult<()>;
}
