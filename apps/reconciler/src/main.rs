//! One-shot job converging a DocumentDB cluster's principals to the
//! application-user secrets of one environment.

#![forbid(unsafe_code)]

mod job_config;
mod job_response;

use std::process::ExitCode;
use std::sync::Arc;

use principal_sync_application::{CredentialDiscoveryService, PrincipalSyncService};
use principal_sync_core::AppResult;
use principal_sync_domain::ReconciliationResult;
use principal_sync_infrastructure::{AwsSecretsManagerStore, MongoPrincipalSessionConnector};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::job_config::JobConfig;
use crate::job_response::JobResponse;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let result = match JobConfig::load() {
        Ok(config) => run(&config).await,
        Err(error) => Err(error),
    };

    match &result {
        Ok(result) => info!(
            created = result.created.len(),
            updated = result.updated.len(),
            deleted = result.deleted.len(),
            "principal-sync finished"
        ),
        Err(run_error) => error!(
            error = %run_error,
            error_type = run_error.error_type(),
            "principal-sync failed"
        ),
    }

    let response = JobResponse::from_result(result);
    println!("{}", response.to_json_line());
    response.exit_code()
}

async fn run(config: &JobConfig) -> AppResult<ReconciliationResult> {
    let request = config.sync_request()?;

    info!(
        endpoint = %request.cluster_endpoint,
        environment = %config.environment,
        admin_secret = %config.admin_secret_name,
        secret_prefix = %config.secret_prefix,
        "principal-sync started"
    );

    let secret_store = Arc::new(AwsSecretsManagerStore::from_default_chain().await);
    let connector = Arc::new(MongoPrincipalSessionConnector::new(
        config.session_settings(),
    ));
    let service = PrincipalSyncService::new(CredentialDiscoveryService::new(secret_store), connector);

    service.run(&request).await
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
