//! Port fakes shared by the service test suites.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use principal_sync_core::{AppError, AppResult};
use principal_sync_domain::{AdminCredential, Password, RoleGrant};

use crate::{
    ClusterEndpoint, CreatePrincipalOutcome, DeletePrincipalOutcome, PrincipalSession,
    PrincipalSessionConnector, SecretNamePage, SecretStore,
};

/// Secret store serving a fixed list of pages.
#[derive(Default)]
pub(crate) struct FakeSecretStore {
    pages: Vec<Vec<String>>,
    secrets: HashMap<String, String>,
    listing_fails: bool,
    repeat_token: bool,
    pub(crate) list_calls: Mutex<Vec<Option<String>>>,
}

impl FakeSecretStore {
    pub(crate) fn with_pages(pages: Vec<Vec<&str>>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|page| page.into_iter().map(str::to_owned).collect())
                .collect(),
            ..Self::default()
        }
    }

    pub(crate) fn with_secret(mut self, name: &str, payload: serde_json::Value) -> Self {
        self.secrets.insert(name.to_owned(), payload.to_string());
        self
    }

    pub(crate) fn with_raw_secret(mut self, name: &str, payload: &str) -> Self {
        self.secrets.insert(name.to_owned(), payload.to_owned());
        self
    }

    pub(crate) fn failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    pub(crate) fn repeating_token(mut self) -> Self {
        self.repeat_token = true;
        self
    }
}

#[async_trait]
impl SecretStore for FakeSecretStore {
    async fn list_secret_names(
        &self,
        name_prefix: &str,
        next_token: Option<&str>,
    ) -> AppResult<SecretNamePage> {
        self.list_calls
            .lock()
            .await
            .push(next_token.map(str::to_owned));

        if self.listing_fails {
            return Err(AppError::Discovery("listing is unavailable".to_owned()));
        }

        let page_index = next_token
            .and_then(|token| token.strip_prefix("page-"))
            .and_then(|index| index.parse::<usize>().ok())
            .unwrap_or(0);

        let names = self
            .pages
            .get(page_index)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|name| name.starts_with(name_prefix))
            .collect();

        let next_token = if self.repeat_token {
            Some("page-1".to_owned())
        } else if page_index + 1 < self.pages.len() {
            Some(format!("page-{}", page_index + 1))
        } else {
            None
        };

        Ok(SecretNamePage { names, next_token })
    }

    async fn get_secret_string(&self, name: &str) -> AppResult<Option<String>> {
        Ok(self.secrets.get(name).cloned())
    }
}

/// Stored state of one principal on the fake cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredPrincipal {
    pub(crate) password: String,
    pub(crate) grants: Vec<RoleGrant>,
}

/// In-memory cluster recording every call made against it.
#[derive(Default)]
pub(crate) struct FakeCluster {
    pub(crate) principals: Mutex<BTreeMap<String, StoredPrincipal>>,
    pub(crate) calls: Mutex<Vec<String>>,
    pub(crate) failing_creates: Mutex<BTreeSet<String>>,
    pub(crate) failing_updates: Mutex<BTreeSet<String>>,
    pub(crate) failing_deletes: Mutex<BTreeSet<String>>,
    pub(crate) hidden_from_listing: Mutex<BTreeSet<String>>,
    pub(crate) connect_fails: Mutex<bool>,
    pub(crate) ping_fails: Mutex<bool>,
    pub(crate) listing_fails: Mutex<bool>,
    pub(crate) close_count: Mutex<u32>,
}

impl FakeCluster {
    pub(crate) fn with_principals(usernames: &[&str]) -> Arc<Self> {
        let principals = usernames
            .iter()
            .map(|username| {
                (
                    (*username).to_owned(),
                    StoredPrincipal {
                        password: "old-password".to_owned(),
                        grants: vec![RoleGrant::default_grant()],
                    },
                )
            })
            .collect();

        Arc::new(Self {
            principals: Mutex::new(principals),
            ..Self::default()
        })
    }

    pub(crate) async fn usernames(&self) -> BTreeSet<String> {
        self.principals.lock().await.keys().cloned().collect()
    }

    pub(crate) async fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: String) {
        self.calls.lock().await.push(call);
    }
}

/// Session over a [`FakeCluster`].
pub(crate) struct FakeSession {
    cluster: Arc<FakeCluster>,
}

impl FakeSession {
    pub(crate) fn new(cluster: Arc<FakeCluster>) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl PrincipalSession for FakeSession {
    async fn ping(&self) -> AppResult<()> {
        self.cluster.record("ping".to_owned()).await;
        if *self.cluster.ping_fails.lock().await {
            return Err(AppError::Connectivity("ping timed out".to_owned()));
        }

        Ok(())
    }

    async fn list_principals(&self) -> AppResult<BTreeSet<String>> {
        self.cluster.record("list".to_owned()).await;
        if *self.cluster.listing_fails.lock().await {
            return Err(AppError::Inspection("usersInfo failed".to_owned()));
        }

        let hidden = self.cluster.hidden_from_listing.lock().await.clone();
        Ok(self
            .cluster
            .usernames()
            .await
            .into_iter()
            .filter(|username| !hidden.contains(username))
            .collect())
    }

    async fn create_principal(
        &self,
        username: &str,
        password: &Password,
        grants: &[RoleGrant],
    ) -> AppResult<CreatePrincipalOutcome> {
        self.cluster.record(format!("create:{username}")).await;
        if self.cluster.failing_creates.lock().await.contains(username) {
            return Err(AppError::Apply(format!(
                "failed to create principal '{username}': not authorized"
            )));
        }

        let mut principals = self.cluster.principals.lock().await;
        if principals.contains_key(username) {
            return Ok(CreatePrincipalOutcome::AlreadyExists);
        }

        principals.insert(
            username.to_owned(),
            StoredPrincipal {
                password: password.expose().to_owned(),
                grants: grants.to_vec(),
            },
        );
        Ok(CreatePrincipalOutcome::Created)
    }

    async fn update_principal(
        &self,
        username: &str,
        password: &Password,
        grants: &[RoleGrant],
    ) -> AppResult<()> {
        self.cluster.record(format!("update:{username}")).await;
        if self.cluster.failing_updates.lock().await.contains(username) {
            return Err(AppError::Apply(format!(
                "failed to update principal '{username}': not authorized"
            )));
        }

        let mut principals = self.cluster.principals.lock().await;
        let Some(stored) = principals.get_mut(username) else {
            return Err(AppError::Apply(format!(
                "failed to update principal '{username}': user not found"
            )));
        };

        stored.password = password.expose().to_owned();
        stored.grants = grants.to_vec();
        Ok(())
    }

    async fn delete_principal(&self, username: &str) -> AppResult<DeletePrincipalOutcome> {
        self.cluster.record(format!("delete:{username}")).await;
        if self.cluster.failing_deletes.lock().await.contains(username) {
            return Err(AppError::Apply(format!(
                "failed to delete principal '{username}': not authorized"
            )));
        }

        match self.cluster.principals.lock().await.remove(username) {
            Some(_) => Ok(DeletePrincipalOutcome::Deleted),
            None => Ok(DeletePrincipalOutcome::AlreadyAbsent),
        }
    }

    async fn close(&self) -> AppResult<()> {
        let mut close_count = self.cluster.close_count.lock().await;
        *close_count += 1;
        Ok(())
    }
}

/// Connector handing out [`FakeSession`]s.
pub(crate) struct FakeConnector {
    cluster: Arc<FakeCluster>,
    pub(crate) connected_as: Mutex<Vec<String>>,
}

impl FakeConnector {
    pub(crate) fn new(cluster: Arc<FakeCluster>) -> Self {
        Self {
            cluster,
            connected_as: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PrincipalSessionConnector for FakeConnector {
    async fn connect(
        &self,
        admin: &AdminCredential,
        endpoint: &ClusterEndpoint,
    ) -> AppResult<Box<dyn PrincipalSession>> {
        if *self.cluster.connect_fails.lock().await {
            return Err(AppError::Connectivity(format!(
                "failed to connect to {endpoint}"
            )));
        }

        self.connected_as
            .lock()
            .await
            .push(admin.username().to_owned());
        Ok(Box::new(FakeSession::new(self.cluster.clone())))
    }
}
