use std::sync::Arc;

use objstore::ObjectStore;

/// Runs a synchronous object-store call off the async runtime.
pub async fn with_store_blocking<R, F>(
    store: Arc<dyn ObjectStore>,
    f: F,
) -> Result<R, tokio::task::JoinError>
where
    R: Send + 'static,
    F: FnOnce(&dyn ObjectStore) -> R + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(store.as_ref())).await
}
