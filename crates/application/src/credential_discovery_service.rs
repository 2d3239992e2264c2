//! Discovery of desired-state credentials from the secret store.
//!
//! Enumeration follows pagination tokens until the listing is exhausted: a
//! partially enumerated desired state would make the reconciliation delete
//! principals that are still wanted. Listing failures are fatal. Individual
//! secrets that are absent or malformed are skipped.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use principal_sync_core::{AppError, AppResult};
use principal_sync_domain::{AdminCredential, CredentialRecord, SecretNamePattern};

use crate::SecretStore;

/// Application service reading credentials from the secret store.
#[derive(Clone)]
pub struct CredentialDiscoveryService {
    secret_store: Arc<dyn SecretStore>,
}

impl CredentialDiscoveryService {
    /// Creates a new discovery service.
    #[must_use]
    pub fn new(secret_store: Arc<dyn SecretStore>) -> Self {
        Self { secret_store }
    }

    /// Fetches the credential of the admin principal.
    ///
    /// Unlike application-user secrets, a missing or malformed admin secret
    /// is fatal.
    pub async fn fetch_admin_credential(&self, secret_name: &str) -> AppResult<AdminCredential> {
        let payload = self
            .secret_store
            .get_secret_string(secret_name)
            .await?
            .ok_or_else(|| {
                AppError::Discovery(format!("admin secret '{secret_name}' was not found"))
            })?;

        let value = serde_json::from_str::<Value>(payload.as_str()).map_err(|error| {
            AppError::Discovery(format!(
                "admin secret '{secret_name}' is not valid JSON: {error}"
            ))
        })?;

        AdminCredential::from_secret_payload(secret_name, &value).map_err(|error| match error {
            AppError::Validation(message) => AppError::Discovery(message),
            other => other,
        })
    }

    /// Enumerates every credential record matching `pattern`.
    ///
    /// Usernames are unique in the result: when two secrets name the same
    /// principal, the first one listed wins.
    pub async fn discover(&self, pattern: &SecretNamePattern) -> AppResult<Vec<CredentialRecord>> {
        let mut records = Vec::new();
        let mut usernames = BTreeSet::new();
        let mut next_token: Option<String> = None;
        let mut page_count = 0_u32;

        loop {
            let page = self
                .secret_store
                .list_secret_names(pattern.prefix(), next_token.as_deref())
                .await?;
            page_count = page_count.saturating_add(1);

            debug!(
                page = page_count,
                listed = page.names.len(),
                "listed secret page"
            );

            for secret_name in page.names.iter().filter(|name| pattern.matches(name)) {
                let Some(record) = self.fetch_credential_record(secret_name).await? else {
                    continue;
                };

                if !usernames.insert(record.username().to_owned()) {
                    warn!(
                        secret_name = %secret_name,
                        username = %record.username(),
                        "skipping secret with duplicate username"
                    );
                    continue;
                }

                records.push(record);
            }

            match page.next_token.filter(|token| !token.is_empty()) {
                None => break,
                Some(token) if next_token.as_deref() == Some(token.as_str()) => {
                    return Err(AppError::Discovery(format!(
                        "secret listing returned the same pagination token twice after page {page_count}"
                    )));
                }
                Some(token) => next_token = Some(token),
            }
        }

        info!(
            environment = %pattern.environment(),
            pages = page_count,
            discovered = records.len(),
            "discovered desired principals"
        );

        Ok(records)
    }

    async fn fetch_credential_record(&self, secret_name: &str) -> AppResult<Option<CredentialRecord>> {
        let Some(payload) = self.secret_store.get_secret_string(secret_name).await? else {
            warn!(secret_name = %secret_name, "skipping secret without payload");
            return Ok(None);
        };

        let value = match serde_json::from_str::<Value>(payload.as_str()) {
            Ok(value) => value,
            Err(error) => {
                warn!(
                    secret_name = %secret_name,
                    error = %error,
                    "skipping secret whose payload is not JSON"
                );
                return Ok(None);
            }
        };

        match CredentialRecord::from_secret_payload(secret_name, &value) {
            Ok(record) => Ok(Some(record)),
            Err(error) => {
                warn!(
                    secret_name = %secret_name,
                    error = %error,
                    "skipping malformed credential secret"
                );
                Ok(None)
            }
        }
    }
}
