use std::env;
use std::path::PathBuf;
use std::time::Duration;

use principal_sync_application::{ClusterEndpoint, DEFAULT_CLUSTER_PORT, SyncRequest};
use principal_sync_core::{AppError, AppResult};
use principal_sync_domain::{DEFAULT_APP_USER_SECRET_PREFIX, SecretNamePattern};
use principal_sync_infrastructure::MongoSessionSettings;

const APP_NAME: &str = "principal-sync";
const DEFAULT_CONNECT_DELAY_MS: u64 = 5_000;
const DEFAULT_SERVER_SELECTION_TIMEOUT_MS: u64 = 30_000;

/// Settings of one invocation, read once at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub cluster_endpoint: String,
    pub cluster_port: u16,
    pub admin_secret_name: String,
    pub environment: String,
    pub secret_prefix: String,
    pub tls_ca_file: Option<PathBuf>,
    pub connect_delay_ms: u64,
    pub server_selection_timeout_ms: u64,
}

impl JobConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let cluster_endpoint = read("DOCDB_ENDPOINT");
        let admin_secret_name = read("ADMIN_SECRET_NAME");
        let environment = read("ENVIRONMENT");

        let (Some(cluster_endpoint), Some(admin_secret_name), Some(environment)) =
            (cluster_endpoint.clone(), admin_secret_name.clone(), environment.clone())
        else {
            let missing: Vec<&str> = [
                ("DOCDB_ENDPOINT", cluster_endpoint.is_none()),
                ("ADMIN_SECRET_NAME", admin_secret_name.is_none()),
                ("ENVIRONMENT", environment.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, is_missing)| is_missing.then_some(name))
            .collect();

            return Err(AppError::Configuration(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        };

        let cluster_port = parse_or(read("DOCDB_PORT"), "DOCDB_PORT", DEFAULT_CLUSTER_PORT)?;
        let connect_delay_ms = parse_or(
            read("DOCDB_CONNECT_DELAY_MS"),
            "DOCDB_CONNECT_DELAY_MS",
            DEFAULT_CONNECT_DELAY_MS,
        )?;
        let server_selection_timeout_ms = parse_or(
            read("DOCDB_SERVER_SELECTION_TIMEOUT_MS"),
            "DOCDB_SERVER_SELECTION_TIMEOUT_MS",
            DEFAULT_SERVER_SELECTION_TIMEOUT_MS,
        )?;

        if server_selection_timeout_ms == 0 {
            return Err(AppError::Configuration(
                "DOCDB_SERVER_SELECTION_TIMEOUT_MS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            cluster_endpoint,
            cluster_port,
            admin_secret_name,
            environment,
            secret_prefix: read("APP_USER_SECRET_PREFIX")
                .unwrap_or_else(|| DEFAULT_APP_USER_SECRET_PREFIX.to_owned()),
            tls_ca_file: read("DOCDB_TLS_CA_FILE").map(PathBuf::from),
            connect_delay_ms,
            server_selection_timeout_ms,
        })
    }

    pub fn sync_request(&self) -> AppResult<SyncRequest> {
        Ok(SyncRequest {
            cluster_endpoint: ClusterEndpoint::new(
                self.cluster_endpoint.as_str(),
                self.cluster_port,
            )?,
            admin_secret_name: self.admin_secret_name.clone(),
            secret_pattern: SecretNamePattern::new(
                self.secret_prefix.as_str(),
                self.environment.as_str(),
            )?,
        })
    }

    pub fn session_settings(&self) -> MongoSessionSettings {
        MongoSessionSettings {
            tls_ca_file: self.tls_ca_file.clone(),
            connect_delay: Duration::from_millis(self.connect_delay_ms),
            server_selection_timeout: Duration::from_millis(self.server_selection_timeout_ms),
            app_name: APP_NAME.to_owned(),
        }
    }
}

fn parse_or<T>(value: Option<String>, name: &str, default: T) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(value) => value.parse::<T>().map_err(|error| {
            AppError::Configuration(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
