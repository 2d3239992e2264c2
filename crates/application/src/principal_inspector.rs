use std::collections::BTreeSet;

use tracing::info;

use principal_sync_core::AppResult;

use crate::PrincipalSession;

/// Reads the usernames of every principal currently on the cluster.
///
/// Failure is fatal: without the actual state no safe diff exists.
pub async fn inspect_principals(session: &dyn PrincipalSession) -> AppResult<BTreeSet<String>> {
    let principals = session.list_principals().await?;
    info!(actual = principals.len(), "inspected cluster principals");
    Ok(principals)
}
