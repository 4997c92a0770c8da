//! Tiny YOLO datasets for stage and pipeline tests.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use objstore::InMemoryObjectStore;

pub const SCHEMA: &str = "train: ../train/images\nval: ../valid/images\ntest: ../test/images\nnc: 1\nnames: ['pothole']\n";
pub const LABEL: &str = "0 0.5 0.5 0.25 0.2\n";

pub fn png_bytes(seed: u8) -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 8, Rgb([seed, 60, 30]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
    buf
}

/// `(relative path, bytes)` for `per_split` labeled images in each default split.
pub fn dataset_files(per_split: usize, with_schema: bool) -> Vec<(String, Vec<u8>)> {
    let mut files = Vec::new();
    for split in dataset::DEFAULT_SPLITS {
        for i in 0..per_split {
            files.push((format!("{split}/images/img_{i}.png"), png_bytes(i as u8)));
            files.push((format!("{split}/labels/img_{i}.txt"), LABEL.as_bytes().to_vec()));
        }
    }
    if with_schema {
        files.push((dataset::SCHEMA_FILE.to_string(), SCHEMA.as_bytes().to_vec()));
    }
    files
}

pub fn write_dataset(root: &Path, per_split: usize, with_schema: bool) {
    for (rel, bytes) in dataset_files(per_split, with_schema) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, bytes).unwrap();
    }
}

/// Same dataset as `write_dataset`, stored under `bucket/prefix`.
pub fn seeded_store(bucket: &str, prefix: &str, per_split: usize, with_schema: bool) -> InMemoryObjectStore {
    let store = InMemoryObjectStore::new();
    store.create_bucket(bucket).unwrap();
    for (rel, bytes) in dataset_files(per_split, with_schema) {
        store.put(bucket, &format!("{prefix}{rel}"), &bytes).unwrap();
    }
    store
}
