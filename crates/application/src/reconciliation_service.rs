//! Three-way diff between desired and actual principals.
//!
//! Every desired principal is upserted: create first, and on an
//! already-exists outcome rewrite it with the same password and grants.
//! Afterwards every actual principal that no desired record names is
//! deleted, except the admin principal. Creates and updates run before
//! deletes. The first failure that is not a tolerated conflict aborts the
//! run; nothing already applied is rolled back.

use std::collections::BTreeSet;

use tracing::{info, warn};

use principal_sync_core::AppResult;
use principal_sync_domain::{CredentialRecord, PrincipalChange, ReconciliationResult};

use crate::{CreatePrincipalOutcome, DeletePrincipalOutcome, PrincipalSession};

/// Converges the cluster's principals to `desired`.
pub async fn reconcile_principals(
    session: &dyn PrincipalSession,
    desired: &[CredentialRecord],
    actual: &BTreeSet<String>,
    admin_username: &str,
) -> AppResult<ReconciliationResult> {
    let desired_names: BTreeSet<&str> = desired.iter().map(CredentialRecord::username).collect();
    let mut result = ReconciliationResult::default();

    for record in desired {
        if record.username() == admin_username {
            warn!(
                username = %record.username(),
                source_secret = %record.source_secret(),
                "desired principal shares the admin username, rewriting the admin password and grants"
            );
        }

        let change = upsert_principal(session, record, actual).await?;
        info!(
            username = %record.username(),
            change = change.as_str(),
            "applied desired principal"
        );
        result.record_change(record.username(), change);
    }

    for username in actual {
        if desired_names.contains(username.as_str()) || username == admin_username {
            continue;
        }

        match session.delete_principal(username).await? {
            DeletePrincipalOutcome::Deleted => {
                info!(username = %username, "deleted undesired principal");
            }
            DeletePrincipalOutcome::AlreadyAbsent => {
                info!(username = %username, "undesired principal was already absent");
            }
        }
        result.record_deletion(username);
    }

    info!(
        created = result.created.len(),
        updated = result.updated.len(),
        deleted = result.deleted.len(),
        "reconciliation completed"
    );

    Ok(result)
}

async fn upsert_principal(
    session: &dyn PrincipalSession,
    record: &CredentialRecord,
    actual: &BTreeSet<String>,
) -> AppResult<PrincipalChange> {
    if record.uses_default_grant() {
        warn!(
            username = %record.username(),
            "no well-formed role grant, applying default readWrite@admin"
        );
    }

    let grants = record.role_grants();
    let outcome = session
        .create_principal(record.username(), record.password(), &grants)
        .await?;

    match outcome {
        CreatePrincipalOutcome::Created if !actual.contains(record.username()) => {
            Ok(PrincipalChange::Created)
        }
        CreatePrincipalOutcome::Created => Ok(PrincipalChange::Updated),
        CreatePrincipalOutcome::AlreadyExists => {
            info!(
                username = %record.username(),
                "principal already exists, updating password and roles"
            );
            session
                .update_principal(record.username(), record.password(), &grants)
                .await?;
            Ok(PrincipalChange::Updated)
        }
    }
}
