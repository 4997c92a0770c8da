use std::path::PathBuf;
use std::sync::Arc;

use objstore::{mirror_prefix, mirrored_root, ObjectStore, StoreError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store_exec::with_store_blocking;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionArtifact {
    /// Dataset root: `<data_dir>/<prefix>`.
    pub dataset: PathBuf,
    pub objects: usize,
    pub bytes: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("ingestion task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Downloads `bucket/prefix` into `data_dir`.
pub async fn ingest(
    store: Arc<dyn ObjectStore>,
    bucket: &str,
    prefix: &str,
    data_dir: PathBuf,
) -> Result<IngestionArtifact, IngestionError> {
    info!(bucket, prefix, dest = %data_dir.display(), "data ingestion started");

    let dataset = mirrored_root(&data_dir, prefix);
    let (b, p) = (bucket.to_string(), prefix.to_string());
    let summary = with_store_blocking(store, move |s| mirror_prefix(s, &b, &p, &data_dir)).await??;

    info!(
        dataset = %dataset.display(),
        objects = summary.objects,
        bytes = summary.bytes,
        "data ingestion completed"
    );
    Ok(IngestionArtifact {
        dataset,
        objects: summary.objects,
        bytes: summary.bytes,
    })
}
