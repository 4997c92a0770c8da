use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{io_err, Result};
use crate::storage::{check_key, key_path, ObjectStore};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    pub objects: usize,
    pub bytes: u64,
    pub skipped_markers: usize,
}

/// Downloads every object under `prefix` to `<dest_root>/<key>`, so the local
/// tree mirrors the bucket hierarchy. Directory markers are skipped.
pub fn mirror_prefix(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
    dest_root: &Path,
) -> Result<MirrorSummary> {
    let mut summary = MirrorSummary::default();

    for entry in store.list(bucket, prefix)? {
        if entry.key.ends_with('/') {
            summary.skipped_markers += 1;
            continue;
        }
        check_key(&entry.key)?;

        let dest = key_path(dest_root, &entry.key);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        summary.bytes += store.download(bucket, &entry.key, &dest)?;
        summary.objects += 1;
        debug!(key = %entry.key, dest = %dest.display(), "object downloaded");
    }

    info!(
        bucket,
        prefix,
        objects = summary.objects,
        bytes = summary.bytes,
        "prefix mirrored"
    );
    Ok(summary)
}

/// Where the mirrored prefix ends up locally.
pub fn mirrored_root(dest_root: &Path, prefix: &str) -> PathBuf {
    key_path(dest_root, prefix)
}
