use std::io::Read;
use std::path::Path;

use crate::{Hash32, ModelFile};

/// Fingerprint of a training run's checkpoint set. Order-independent: entries
/// are hashed by file name, each as `<rel_path>\n<size>\n`.
pub fn manifest_hash(mut files: Vec<ModelFile>) -> Hash32 {
    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

    let mut hasher = blake3::Hasher::new();
    for f in files {
        hasher.update(f.rel_path.as_bytes());
        hasher.update(b"\n");
        hasher.update(f.size.to_string().as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().into()
}

/// Name and size of a checkpoint on disk.
pub fn model_file(path: &Path) -> std::io::Result<ModelFile> {
    let size = std::fs::metadata(path)?.len();
    let rel_path = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ModelFile { rel_path, size })
}

/// BLAKE3 of the file contents, streamed. Returns the hash and the size.
pub fn file_hash(path: &Path) -> std::io::Result<(Hash32, u64)> {
    let mut f = std::fs::File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; 64 * 1024];
    let mut size = 0u64;

    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok((hasher.finalize().into(), size))
}
