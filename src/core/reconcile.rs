//! Idempotent provisioning primitives.
//!
//! `ensure_resource` finds a resource by exact name or creates it, so re-running
//! a pipeline converges instead of duplicating. `ensure_scope` and
//! `put_secrets` do the same for secret scopes and their entries.

use anyhow::Result;
use tracing::{debug, info};

use crate::adapters::{NamedResource, ResourceProvider, SecretStore};
use crate::domain::Secret;

/// Return the resource named `name`, creating it in `namespace` if absent.
///
/// Matching is exact and case-sensitive. Should the provider ever list more
/// than one resource with that name, the first one in listing order is used.
/// Existing resources are returned unchanged.
pub async fn ensure_resource<P>(provider: &P, namespace: &str, name: &str) -> Result<P::Resource>
where
    P: ResourceProvider + ?Sized,
{
    let resources = provider.list().await?;

    let mut matching = resources.into_iter().filter(|r| r.name() == name);
    if let Some(existing) = matching.next() {
        let duplicates = matching.count();
        if duplicates > 0 {
            info!(name, duplicates, "Multiple resources share this name, using the first listed");
        }
        debug!(name, "Resource exists");
        return Ok(existing);
    }

    info!(name, namespace, "Creating resource");
    provider.create(namespace, name).await
}

/// Create secret scope `scope` unless it already exists
pub async fn ensure_scope<S>(store: &S, scope: &str) -> Result<()>
where
    S: SecretStore + ?Sized,
{
    let scopes = store.list_scopes().await?;

    if scopes.iter().any(|s| s == scope) {
        debug!(scope, "Secret scope exists");
        return Ok(());
    }

    info!(scope, "Creating secret scope");
    store.create_scope(scope).await
}

/// Upsert `secrets` into `scope`
pub async fn put_secrets<S>(store: &S, scope: &str, secrets: &[Secret]) -> Result<()>
where
    S: SecretStore + ?Sized,
{
    for secret in secrets {
        // Names only: values never reach the log
        info!(scope, secret = %secret.name, "Writing secret");
        store.put_secret(scope, secret).await?;
    }

    Ok(())
}

/// `ensure_scope` followed by `put_secrets`
pub async fn propagate_secrets<S>(store: &S, scope: &str, secrets: &[Secret]) -> Result<()>
where
    S: SecretStore + ?Sized,
{
    ensure_scope(store, scope).await?;
    put_secrets(store, scope, secrets).await
}
