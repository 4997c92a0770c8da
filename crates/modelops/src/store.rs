use std::path::{Path, PathBuf};

use objstore::{ObjectStore, StoreError};
use thiserror::Error;

use crate::{file_hash, manifest_hash, model_file, ModelArtifact, ModelFile, ARTIFACT_RECORD_FILE};

#[derive(Debug, Error)]
pub enum ModelOpsError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Object store error: {0}")]
    Store(#[from] StoreError),
    #[error("Serialization error: {0}")]
    Ser(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelOpsError>;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ModelOpsError + '_ {
    move |source| ModelOpsError::Io { path: path.to_path_buf(), source }
}

/// Hashes the checkpoint, uploads it to `bucket/key` and returns the record.
/// The manifest hash covers the checkpoint plus `run_files` (the other
/// checkpoints of the same run, e.g. `last.pt`).
pub fn publish_checkpoint(
    store: &dyn ObjectStore,
    checkpoint: &Path,
    run_files: &[&Path],
    bucket: &str,
    key: &str,
) -> Result<ModelArtifact> {
    let (content_hash, size) = file_hash(checkpoint).map_err(io_err(checkpoint))?;
    let name = checkpoint
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| key.to_string());

    let file = ModelFile { rel_path: name.clone(), size };
    let mut manifest = vec![file.clone()];
    for path in run_files {
        manifest.push(model_file(path).map_err(io_err(path))?);
    }
    let uri = store.upload(checkpoint, bucket, key)?;

    Ok(ModelArtifact {
        name,
        manifest_hash: manifest_hash(manifest),
        file,
        content_hash,
        uri,
        uploaded_at: chrono::Utc::now(),
    })
}

/// Writes `<dir>/model_artifact.json`.
pub fn save_artifact_record(dir: &Path, artifact: &ModelArtifact) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(io_err(dir))?;
    let path = dir.join(ARTIFACT_RECORD_FILE);
    let bytes = serde_json::to_vec_pretty(artifact)?;
    std::fs::write(&path, bytes).map_err(io_err(&path))?;
    Ok(path)
}

pub fn load_artifact_record(path: &Path) -> Result<ModelArtifact> {
    let bytes = std::fs::read(path).map_err(io_err(path))?;
    Ok(serde_json::from_slice(&bytes)?)
}
