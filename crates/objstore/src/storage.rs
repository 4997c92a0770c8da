//! ObjectStore trait and implementations

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{io_err, Result, StoreError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
}

/// Bucket/key storage. Keys use `/` as separator; a key ending in `/` is a
/// directory marker with no content.
pub trait ObjectStore: Send + Sync {
    /// Every object under `prefix`, sorted by key.
    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectEntry>>;
    /// Writes the object to `dest` and returns the byte count.
    fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64>;
    /// Stores `src` under `bucket/key` and returns the object's URI.
    fn upload(&self, src: &Path, bucket: &str, key: &str) -> Result<String>;
}

pub fn object_uri(bucket: &str, key: &str) -> String {
    format!("s3://{bucket}/{key}")
}

/// Rejects keys that would escape a destination directory when mirrored.
pub fn check_key(key: &str) -> Result<()> {
    let trimmed = key.trim_end_matches('/');
    let bad = trimmed.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || trimmed.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// `root` joined with the `/`-separated segments of `key`.
pub fn key_path(root: &Path, key: &str) -> PathBuf {
    let mut p = root.to_path_buf();
    p.extend(key.split('/').filter(|s| !s.is_empty()));
    p
}

/// Buckets are directories under `root`, like a MinIO data directory.
#[derive(Clone, Debug)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        let dir = self.root.join(bucket);
        if bucket.is_empty() || bucket.contains('/') || !dir.is_dir() {
            return Err(StoreError::NoSuchBucket(bucket.to_string()));
        }
        Ok(dir)
    }
}

impl ObjectStore for LocalObjectStore {
    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectEntry>> {
        let dir = self.bucket_dir(bucket)?;
        let mut out = Vec::new();

        for entry in WalkDir::new(&dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|source| StoreError::Walk { path: dir.clone(), source })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&dir) else { continue };
            let key = rel
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => s.to_str(),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("/");
            if !key.starts_with(prefix) {
                continue;
            }
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            out.push(ObjectEntry { key, size });
        }

        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }

    fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64> {
        check_key(key)?;
        let src = key_path(&self.bucket_dir(bucket)?, key);
        if !src.is_file() {
            return Err(StoreError::NoSuchKey {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        std::fs::copy(&src, dest).map_err(io_err(dest))
    }

    fn upload(&self, src: &Path, bucket: &str, key: &str) -> Result<String> {
        check_key(key)?;
        let dest = key_path(&self.bucket_dir(bucket)?, key);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        std::fs::copy(src, &dest).map_err(io_err(src))?;
        Ok(object_uri(bucket, key))
    }
}

type Buckets = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// In-memory store (for testing and demos)
#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    buckets: Arc<RwLock<Buckets>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut b = self.buckets.write().map_err(|_| StoreError::Poisoned)?;
        b.entry(bucket.to_string()).or_default();
        Ok(())
    }

    pub fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<()> {
        let mut b = self.buckets.write().map_err(|_| StoreError::Poisoned)?;
        b.entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    pub fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let b = self.buckets.read().map_err(|_| StoreError::Poisoned)?;
        Ok(b.get(bucket).and_then(|objs| objs.get(key)).cloned())
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectEntry>> {
        let b = self.buckets.read().map_err(|_| StoreError::Poisoned)?;
        let objs = b
            .get(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?;
        Ok(objs
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| ObjectEntry { key: k.clone(), size: v.len() as u64 })
            .collect())
    }

    fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64> {
        let bytes = self.get(bucket, key)?.ok_or_else(|| StoreError::NoSuchKey {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;
        std::fs::write(dest, &bytes).map_err(io_err(dest))?;
        Ok(bytes.len() as u64)
    }

    fn upload(&self, src: &Path, bucket: &str, key: &str) -> Result<String> {
        check_key(key)?;
        let bytes = std::fs::read(src).map_err(io_err(src))?;
        let mut b = self.buckets.write().map_err(|_| StoreError::Poisoned)?;
        let objs = b
            .get_mut(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?;
        objs.insert(key.to_string(), bytes);
        Ok(object_uri(bucket, key))
    }
}
