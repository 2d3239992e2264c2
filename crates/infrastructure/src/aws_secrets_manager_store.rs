use async_trait::async_trait;
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::types::{Filter, FilterNameStringType};
use tracing::debug;

use principal_sync_application::{SecretNamePage, SecretStore};
use principal_sync_core::{AppError, AppResult};

/// AWS Secrets Manager implementation of the secret store port.
#[derive(Debug, Clone)]
pub struct AwsSecretsManagerStore {
    client: Client,
}

impl AwsSecretsManagerStore {
    /// Creates a store over an existing SDK client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a store using the default AWS credential and region chain.
    pub async fn from_default_chain() -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;

        debug!(
            region = ?sdk_config.region().map(|region| region.as_ref().to_owned()),
            "AWS Secrets Manager client initialized"
        );

        Self::new(Client::new(&sdk_config))
    }
}

#[async_trait]
impl SecretStore for AwsSecretsManagerStore {
    async fn list_secret_names(
        &self,
        name_prefix: &str,
        next_token: Option<&str>,
    ) -> AppResult<SecretNamePage> {
        let name_filter = Filter::builder()
            .key(FilterNameStringType::Name)
            .values(name_prefix)
            .build();

        let output = self
            .client
            .list_secrets()
            .filters(name_filter)
            .set_next_token(next_token.map(str::to_owned))
            .send()
            .await
            .map_err(|error| {
                AppError::Discovery(format!(
                    "failed to list secrets with prefix '{name_prefix}': {}",
                    DisplayErrorContext(&error)
                ))
            })?;

        let names = output
            .secret_list()
            .iter()
            .filter_map(|entry| entry.name())
            .map(str::to_owned)
            .collect();

        Ok(SecretNamePage {
            names,
            next_token: output.next_token().map(str::to_owned),
        })
    }

    async fn get_secret_string(&self, name: &str) -> AppResult<Option<String>> {
        match self.client.get_secret_value().secret_id(name).send().await {
            Ok(output) => Ok(output.secret_string().map(str::to_owned)),
            Err(error)
                if error
                    .as_service_error()
                    .is_some_and(|service_error| service_error.is_resource_not_found_exception()) =>
            {
                debug!(secret_name = %name, "secret does not exist");
                Ok(None)
            }
            Err(error) => Err(AppError::Discovery(format!(
                "failed to read secret '{name}': {}",
                DisplayErrorContext(&error)
            ))),
        }
    }
}
