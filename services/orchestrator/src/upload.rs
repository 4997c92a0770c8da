use std::path::{Path, PathBuf};
use std::sync::Arc;

use modelops::{artifact_key, publish_checkpoint, save_artifact_record, ModelArtifact, ModelOpsError};
use objstore::ObjectStore;
use thiserror::Error;
use tracing::info;

use crate::store_exec::with_store_blocking;
use crate::trainer::TrainingArtifact;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    ModelOps(#[from] ModelOpsError),
    #[error("upload task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Publishes the run's best checkpoint to `<bucket>/<prefix>/<run_name>/<file name>`
/// and records the result as `model_artifact.json` in `record_dir`.
pub async fn upload_model(
    store: Arc<dyn ObjectStore>,
    training: &TrainingArtifact,
    bucket: &str,
    prefix: &str,
    run_name: &str,
    record_dir: &Path,
) -> Result<(ModelArtifact, PathBuf), UploadError> {
    let checkpoint = &training.best_model;
    let file_name = checkpoint
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| crate::trainer::BEST_CHECKPOINT.to_string());
    let key = artifact_key(prefix, run_name, &file_name);

    info!(bucket, key = %key, "model upload started");
    let (src, last, b) = (checkpoint.clone(), training.last_model.clone(), bucket.to_string());
    let artifact = with_store_blocking(store, move |s| {
        publish_checkpoint(s, &src, &[last.as_path()], &b, &key)
    })
    .await??;

    let record = save_artifact_record(record_dir, &artifact)?;
    info!(
        uri = %artifact.uri,
        content_hash = %short_hash(&artifact.content_hash),
        "model uploaded"
    );
    Ok((artifact, record))
}

/// First six bytes of a hash, hex encoded, for log lines.
fn short_hash(hash: &[u8]) -> String {
    hex::encode(&hash[..hash.len().min(6)])
}
