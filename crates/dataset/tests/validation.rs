use std::fs;
use std::path::{Path, PathBuf};

use dataset::{
    read_report, validate_and_persist, DatasetValidator, MemoryLog, ValidationConfig,
};
use image::{Rgb, RgbImage};

const SCHEMA: &str = "train: ../train/images\nval: ../valid/images\ntest: ../test/images\n\nnc: 1\nnames: ['pothole']\n";

/// Writes a YOLO dataset with `counts[i]` labeled images in split `i`.
fn build_dataset(root: &Path, counts: [usize; 3]) -> Vec<PathBuf> {
    let mut images = Vec::new();
    for (split, count) in ["train", "test", "valid"].into_iter().zip(counts) {
        let images_dir = root.join(split).join("images");
        let labels_dir = root.join(split).join("labels");
        fs::create_dir_all(&images_dir).unwrap();
        fs::create_dir_all(&labels_dir).unwrap();

        for i in 0..count {
            let mut img = RgbImage::new(8, 8);
            for px in img.pixels_mut() {
                *px = Rgb([(i * 7 % 255) as u8, 90, 40]);
            }
            let img_path = images_dir.join(format!("pothole_{i:03}.png"));
            img.save(&img_path).unwrap();
            fs::write(
                labels_dir.join(format!("pothole_{i:03}.txt")),
                "0 0.512 0.48 0.2 0.15\n0 0.1 0.9 0.05 0.05\n",
            )
            .unwrap();
            images.push(img_path);
        }
    }
    fs::write(root.join("data.yaml"), SCHEMA).unwrap();
    images
}

fn config(root: &Path) -> ValidationConfig {
    ValidationConfig::new(root, root.join("artifacts"))
}

#[test]
fn test_valid_dataset_of_100_images_passes() {
    let tmp = tempfile::tempdir().unwrap();
    build_dataset(tmp.path(), [70, 20, 10]);

    let cfg = config(tmp.path());
    let log = MemoryLog::new();
    let report = DatasetValidator::new(&cfg, &log).validate();

    assert!(report.folder_structure_ok);
    assert!(report.image_extensions_ok);
    assert!(report.images_ok);
    assert!(report.annotations_ok);
    assert!(report.image_label_mapping_ok);
    assert!(report.data_yaml_ok);
    assert!(report.validation_status);
    assert_eq!(report.total_images, 100);
    assert_eq!(report.valid_images, 100);
    assert_eq!(report.total_annotations, 100);
    assert!(report.invalid_image_extensions.is_empty());
    assert!(report.missing_annotation_files.is_empty());
    assert!(report.invalid_annotation_files.is_empty());
    assert!(log.errors().is_empty(), "{:?}", log.errors());
}

#[test]
fn test_validation_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    build_dataset(tmp.path(), [4, 2, 2]);

    let cfg = config(tmp.path());
    let log = MemoryLog::new();
    let validator = DatasetValidator::new(&cfg, &log);

    let first = validator.validate();
    let second = validator.validate();
    assert!(first.validation_status);
    assert_eq!(first, second);
    assert_eq!(second.total_images, 8);
    assert_eq!(second.valid_images, 8);
}

#[test]
fn test_missing_schema_file_fails_overall() {
    let tmp = tempfile::tempdir().unwrap();
    build_dataset(tmp.path(), [2, 1, 1]);
    fs::remove_file(tmp.path().join("data.yaml")).unwrap();

    let cfg = config(tmp.path());
    let log = MemoryLog::new();
    let report = DatasetValidator::new(&cfg, &log).validate();

    assert!(!report.data_yaml_ok);
    assert!(!report.validation_status);
    assert!(report.annotations_ok && report.images_ok && report.folder_structure_ok);
}

#[test]
fn test_schema_missing_class_names() {
    let tmp = tempfile::tempdir().unwrap();
    build_dataset(tmp.path(), [1, 1, 1]);
    fs::write(tmp.path().join("data.yaml"), "train: a\nval: b\ntest: c\nnc: 1\n").unwrap();

    let cfg = config(tmp.path());
    let log = MemoryLog::new();
    let report = DatasetValidator::new(&cfg, &log).validate();
    assert!(!report.data_yaml_ok);
    assert!(log.errors().iter().any(|e| e.contains("'names'")));
}

#[test]
fn test_width_out_of_range_flags_file() {
    let tmp = tempfile::tempdir().unwrap();
    build_dataset(tmp.path(), [3, 1, 1]);
    let bad = tmp.path().join("train/labels/pothole_001.txt");
    fs::write(&bad, "1 0.5 0.5 1.2 0.3\n").unwrap();

    let cfg = config(tmp.path());
    let log = MemoryLog::new();
    let report = DatasetValidator::new(&cfg, &log).validate();

    assert!(!report.annotations_ok);
    assert!(!report.validation_status);
    assert_eq!(report.invalid_annotation_files, vec![bad]);
}

#[test]
fn test_malformed_lines_flag_their_files() {
    let tmp = tempfile::tempdir().unwrap();
    build_dataset(tmp.path(), [1, 2, 2]);
    let short = tmp.path().join("test/labels/pothole_000.txt");
    let bad_class = tmp.path().join("valid/labels/pothole_001.txt");
    fs::write(&short, "0 0.5 0.5 0.2\n").unwrap();
    fs::write(&bad_class, "0 0.5 0.5 0.2 0.2\n-2 0.5 0.5 0.2 0.2\n").unwrap();

    let cfg = config(tmp.path());
    let log = MemoryLog::new();
    let report = DatasetValidator::new(&cfg, &log).validate();

    assert!(!report.annotations_ok);
    assert_eq!(report.invalid_annotation_files, vec![short, bad_class]);
    assert_eq!(report.total_annotations, 5);
}

#[test]
fn test_unsupported_extension_in_one_split() {
    let tmp = tempfile::tempdir().unwrap();
    build_dataset(tmp.path(), [2, 2, 2]);
    let odd = tmp.path().join("valid/images/pothole_extra.gif");
    RgbImage::new(4, 4).save_with_format(&odd, image::ImageFormat::Png).unwrap();
    fs::write(tmp.path().join("valid/labels/pothole_extra.txt"), "0 0.5 0.5 0.1 0.1\n").unwrap();

    let cfg = config(tmp.path());
    let log = MemoryLog::new();
    let report = DatasetValidator::new(&cfg, &log).validate();

    assert!(!report.image_extensions_ok);
    assert!(!report.validation_status);
    assert_eq!(report.invalid_image_extensions, vec![odd]);
    // content is a real PNG and it has a label
    assert!(report.images_ok);
    assert!(report.image_label_mapping_ok);
}

#[test]
fn test_uppercase_extension_is_supported() {
    let tmp = tempfile::tempdir().unwrap();
    build_dataset(tmp.path(), [1, 1, 1]);
    RgbImage::new(4, 4)
        .save_with_format(tmp.path().join("train/images/IMG_0042.JPG"), image::ImageFormat::Jpeg)
        .unwrap();
    fs::write(tmp.path().join("train/labels/IMG_0042.txt"), "0 0.5 0.5 0.1 0.1\n").unwrap();

    let cfg = config(tmp.path());
    let log = MemoryLog::new();
    let report = DatasetValidator::new(&cfg, &log).validate();
    assert!(report.validation_status, "{:?}", log.errors());
    assert_eq!(report.total_images, 4);
}

#[test]
fn test_images_without_labels_are_listed() {
    let tmp = tempfile::tempdir().unwrap();
    let images = build_dataset(tmp.path(), [3, 1, 1]);
    fs::remove_file(tmp.path().join("train/labels/pothole_002.txt")).unwrap();
    fs::remove_file(tmp.path().join("valid/labels/pothole_000.txt")).unwrap();

    let cfg = config(tmp.path());
    let log = MemoryLog::new();
    let report = DatasetValidator::new(&cfg, &log).validate();

    assert!(!report.image_label_mapping_ok);
    assert_eq!(
        report.missing_annotation_files,
        vec![images[2].clone(), images[4].clone()]
    );
}

#[test]
fn test_corrupted_image_is_counted_but_scan_continues() {
    let tmp = tempfile::tempdir().unwrap();
    build_dataset(tmp.path(), [3, 1, 1]);
    fs::write(tmp.path().join("train/images/pothole_001.png"), b"\x89PNG\r\n\x1a\ntruncated").unwrap();

    let cfg = config(tmp.path());
    let log = MemoryLog::new();
    let report = DatasetValidator::new(&cfg, &log).validate();

    assert!(!report.images_ok);
    assert_eq!(report.total_images, 5);
    assert_eq!(report.valid_images, 4);
    assert!(log.errors().iter().any(|e| e.contains("pothole_001.png")));
}

#[test]
fn test_missing_split_directory() {
    let tmp = tempfile::tempdir().unwrap();
    build_dataset(tmp.path(), [2, 2, 2]);
    fs::remove_dir_all(tmp.path().join("test/labels")).unwrap();

    let cfg = config(tmp.path());
    let log = MemoryLog::new();
    let report = DatasetValidator::new(&cfg, &log).validate();

    assert!(!report.folder_structure_ok);
    assert!(!report.annotations_ok);
    assert!(!report.image_label_mapping_ok);
    assert!(!report.validation_status);
}

#[test]
fn test_validate_and_persist_writes_report() {
    let tmp = tempfile::tempdir().unwrap();
    build_dataset(tmp.path(), [2, 1, 1]);

    let cfg = config(tmp.path());
    let log = MemoryLog::new();
    let artifact = validate_and_persist(&cfg, &log).unwrap();

    assert!(artifact.validation_status);
    assert_eq!(artifact.validation_report, tmp.path().join("artifacts/validation_report.json"));

    let report = read_report(&artifact.validation_report).unwrap();
    assert!(report.validation_status);
    assert_eq!(report.total_images, 4);
}

#[test]
fn test_validate_and_persist_surfaces_write_failure() {
    let tmp = tempfile::tempdir().unwrap();
    build_dataset(tmp.path(), [1, 1, 1]);
    fs::write(tmp.path().join("artifacts"), b"occupied").unwrap();

    let cfg = config(tmp.path());
    let log = MemoryLog::new();
    assert!(validate_and_persist(&cfg, &log).is_err());
    assert!(log.errors().iter().any(|e| e.starts_with("Error in data validation")));
}
