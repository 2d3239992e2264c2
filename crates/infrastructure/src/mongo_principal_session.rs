//! MongoDB-wire session adapter for DocumentDB clusters.
//!
//! Principals are managed with the `createUser`, `updateUser`, `dropUser`
//! and `usersInfo` commands against the `admin` database. Tolerated
//! conflicts are recognised by the server's command error code.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document, doc};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::{ClientOptions, Credential, Tls};
use mongodb::{Client, Database};
use tracing::{debug, info, warn};

use principal_sync_application::{
    ClusterEndpoint, CreatePrincipalOutcome, DeletePrincipalOutcome, PrincipalSession,
    PrincipalSessionConnector,
};
use principal_sync_core::{AppError, AppResult};
use principal_sync_domain::{AdminCredential, Password, RoleGrant};

const ADMIN_DATABASE: &str = "admin";

/// `UserNotFound`.
const USER_NOT_FOUND_CODE: i32 = 11;

/// `DuplicateKey`.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// `Location51003`: "User ... already exists".
const USER_ALREADY_EXISTS_CODE: i32 = 51003;

/// Connection settings of the session connector.
#[derive(Debug, Clone)]
pub struct MongoSessionSettings {
    /// PEM bundle replacing the system trust roots, if set.
    pub tls_ca_file: Option<PathBuf>,
    /// Pause before connecting, bridging the gap between the cluster
    /// reporting itself available and its listener accepting connections.
    pub connect_delay: Duration,
    /// Transport-level timeout for selecting a server.
    pub server_selection_timeout: Duration,
    /// Application name reported to the server.
    pub app_name: String,
}

/// Opens TLS sessions authenticated as the admin principal.
#[derive(Debug, Clone)]
pub struct MongoPrincipalSessionConnector {
    settings: MongoSessionSettings,
}

impl MongoPrincipalSessionConnector {
    /// Creates a connector with the provided settings.
    #[must_use]
    pub fn new(settings: MongoSessionSettings) -> Self {
        Self { settings }
    }

    async fn client_options(
        &self,
        admin: &AdminCredential,
        endpoint: &ClusterEndpoint,
    ) -> AppResult<ClientOptions> {
        let mut options = match admin.connection_string() {
            Some(connection_string) => ClientOptions::parse(connection_string.expose())
                .await
                .map_err(|_| {
                    AppError::Connectivity(
                        "admin secret carries an unparsable connection string".to_owned(),
                    )
                })?,
            None => self.derived_options(admin, endpoint).await?,
        };

        fill_unset_options(&mut options, &self.settings);
        Ok(options)
    }

    async fn derived_options(
        &self,
        admin: &AdminCredential,
        endpoint: &ClusterEndpoint,
    ) -> AppResult<ClientOptions> {
        let uri = format!(
            "mongodb://{}:{}/?tls=true&retryWrites=false",
            endpoint.host(),
            endpoint.port()
        );
        let mut options = ClientOptions::parse(uri.as_str()).await.map_err(|error| {
            AppError::Connectivity(format!("invalid cluster endpoint '{endpoint}': {error}"))
        })?;

        options.credential = Some(
            Credential::builder()
                .username(admin.username().to_owned())
                .password(admin.password().expose().to_owned())
                .source(ADMIN_DATABASE.to_owned())
                .build(),
        );
        options.retry_writes = Some(false);

        Ok(options)
    }
}

/// Applies connector settings only where the parsed options leave a gap,
/// so an admin connection string always wins over local configuration.
fn fill_unset_options(options: &mut ClientOptions, settings: &MongoSessionSettings) {
    if options.server_selection_timeout.is_none() {
        options.server_selection_timeout = Some(settings.server_selection_timeout);
    }
    if options.app_name.is_none() {
        options.app_name = Some(settings.app_name.clone());
    }

    let Some(ca_file) = &settings.tls_ca_file else {
        return;
    };
    match options.tls.as_mut() {
        Some(Tls::Enabled(tls)) if tls.ca_file_path.is_none() => {
            tls.ca_file_path = Some(ca_file.clone());
        }
        _ => warn!(
            ca_file = %ca_file.display(),
            "connection options already define TLS trust, ignoring configured CA file"
        ),
    }
}

#[async_trait]
impl PrincipalSessionConnector for MongoPrincipalSessionConnector {
    async fn connect(
        &self,
        admin: &AdminCredential,
        endpoint: &ClusterEndpoint,
    ) -> AppResult<Box<dyn PrincipalSession>> {
        if !self.settings.connect_delay.is_zero() {
            debug!(
                delay_ms = self.settings.connect_delay.as_millis(),
                "waiting before connecting to cluster"
            );
            tokio::time::sleep(self.settings.connect_delay).await;
        }

        let options = self.client_options(admin, endpoint).await?;
        let client = Client::with_options(options).map_err(|error| {
            AppError::Connectivity(format!("failed to build client for '{endpoint}': {error}"))
        })?;
        let admin_database = client.database(ADMIN_DATABASE);

        Ok(Box::new(MongoPrincipalSession {
            client,
            admin_database,
        }))
    }
}

/// Session over one driver client, scoped to the `admin` database.
pub struct MongoPrincipalSession {
    client: Client,
    admin_database: Database,
}

#[async_trait]
impl PrincipalSession for MongoPrincipalSession {
    async fn ping(&self) -> AppResult<()> {
        self.admin_database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|error| AppError::Connectivity(format!("liveness probe failed: {error}")))
    }

    async fn list_principals(&self) -> AppResult<BTreeSet<String>> {
        let response = self
            .admin_database
            .run_command(doc! { "usersInfo": 1 })
            .await
            .map_err(|error| {
                AppError::Inspection(format!("failed to list cluster principals: {error}"))
            })?;

        usernames_from_users_info(&response)
    }

    async fn create_principal(
        &self,
        username: &str,
        password: &Password,
        grants: &[RoleGrant],
    ) -> AppResult<CreatePrincipalOutcome> {
        let command = doc! {
            "createUser": username,
            "pwd": password.expose(),
            "roles": roles_to_bson(grants)
        };

        match self.admin_database.run_command(command).await {
            Ok(_) => Ok(CreatePrincipalOutcome::Created),
            Err(error) if is_already_exists(command_error_code(&error)) => {
                Ok(CreatePrincipalOutcome::AlreadyExists)
            }
            Err(error) => Err(AppError::Apply(format!(
                "failed to create principal '{username}': {error}"
            ))),
        }
    }

    async fn update_principal(
        &self,
        username: &str,
        password: &Password,
        grants: &[RoleGrant],
    ) -> AppResult<()> {
        let command = doc! {
            "updateUser": username,
            "pwd": password.expose(),
            "roles": roles_to_bson(grants)
        };

        self.admin_database
            .run_command(command)
            .await
            .map(|_| ())
            .map_err(|error| {
                AppError::Apply(format!("failed to update principal '{username}': {error}"))
            })
    }

    async fn delete_principal(&self, username: &str) -> AppResult<DeletePrincipalOutcome> {
        match self
            .admin_database
            .run_command(doc! { "dropUser": username })
            .await
        {
            Ok(_) => Ok(DeletePrincipalOutcome::Deleted),
            Err(error) if is_not_found(command_error_code(&error)) => {
                Ok(DeletePrincipalOutcome::AlreadyAbsent)
            }
            Err(error) => Err(AppError::Apply(format!(
                "failed to delete principal '{username}': {error}"
            ))),
        }
    }

    async fn close(&self) -> AppResult<()> {
        self.client.clone().shutdown().await;
        info!("closed cluster session");
        Ok(())
    }
}

fn roles_to_bson(grants: &[RoleGrant]) -> Vec<Document> {
    grants
        .iter()
        .map(|grant| doc! { "role": grant.role(), "db": grant.database() })
        .collect()
}

fn usernames_from_users_info(response: &Document) -> AppResult<BTreeSet<String>> {
    let users = response.get_array("users").map_err(|error| {
        AppError::Inspection(format!("usersInfo response has no users array: {error}"))
    })?;

    users
        .iter()
        .map(|entry| {
            entry
                .as_document()
                .and_then(|user| user.get("user"))
                .and_then(Bson::as_str)
                .map(str::to_owned)
                .ok_or_else(|| {
                    AppError::Inspection("usersInfo returned an entry without a user name".to_owned())
                })
        })
        .collect()
}

fn command_error_code(error: &MongoError) -> Option<i32> {
    match error.kind.as_ref() {
        ErrorKind::Command(command_error) => Some(command_error.code),
        _ => None,
    }
}

fn is_already_exists(code: Option<i32>) -> bool {
    matches!(code, Some(USER_ALREADY_EXISTS_CODE | DUPLICATE_KEY_CODE))
}

fn is_not_found(code: Option<i32>) -> bool {
    code == Some(USER_NOT_FOUND_CODE)
}
