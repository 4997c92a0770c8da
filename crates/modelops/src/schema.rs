use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Hash32 = [u8; 32];

pub const ARTIFACT_RECORD_FILE: &str = "model_artifact.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFile {
    pub rel_path: String,
    pub size: u64,
}

/// A trained checkpoint that has been published to object storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    pub file: ModelFile,
    #[serde(with = "hex", rename = "content_hash_hex")]
    pub content_hash: Hash32, // blake3(file bytes)
    #[serde(with = "hex", rename = "manifest_hash_hex")]
    pub manifest_hash: Hash32, // blake3 over sorted metadata
    pub uri: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Deterministic destination key: `<prefix>/<run_name>/<file_name>`.
/// Empty segments are dropped so a trailing `/` on the prefix is harmless.
pub fn artifact_key(prefix: &str, run_name: &str, file_name: &str) -> String {
    prefix
        .split('/')
        .chain(run_name.split('/'))
        .chain(std::iter::once(file_name))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
