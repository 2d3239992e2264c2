use async_trait::async_trait;

use principal_sync_core::AppResult;

/// One page of a secret-store listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretNamePage {
    /// Secret names on this page.
    pub names: Vec<String>,
    /// Token for the next page; `None` once the listing is exhausted.
    pub next_token: Option<String>,
}

/// Port for the centralized secret store holding desired state.
///
/// Adapters report failures as `AppError::Discovery`.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Lists one page of secret names starting with `name_prefix`.
    async fn list_secret_names(
        &self,
        name_prefix: &str,
        next_token: Option<&str>,
    ) -> AppResult<SecretNamePage>;

    /// Returns the string payload of a secret, or `None` when it does not
    /// exist or carries no string payload.
    async fn get_secret_string(&self, name: &str) -> AppResult<Option<String>>;
}
