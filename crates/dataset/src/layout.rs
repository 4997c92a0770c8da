use std::path::{Path, PathBuf};

pub const IMAGES_DIR: &str = "images";
pub const LABELS_DIR: &str = "labels";
pub const LABEL_EXTENSION: &str = "txt";
pub const SCHEMA_FILE: &str = "data.yaml";
pub const REPORT_FILE: &str = "validation_report.json";

pub const DEFAULT_SPLITS: [&str; 3] = ["train", "test", "valid"];
pub const DEFAULT_IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".bmp", ".webp"];
pub const REQUIRED_SCHEMA_KEYS: [&str; 5] = ["train", "val", "test", "nc", "names"];

/// Everything a validation run needs to know about the dataset on disk.
#[derive(Clone, Debug)]
pub struct ValidationConfig {
    pub dataset: PathBuf,
    pub splits: Vec<String>,
    pub supported_extensions: Vec<String>,
    pub schema_file: String,
    pub required_schema_keys: Vec<String>,
    pub artifacts_dir: PathBuf,
}

impl ValidationConfig {
    pub fn new(dataset: impl Into<PathBuf>, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            dataset: dataset.into(),
            splits: DEFAULT_SPLITS.iter().map(|s| s.to_string()).collect(),
            supported_extensions: DEFAULT_IMAGE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            schema_file: SCHEMA_FILE.to_string(),
            required_schema_keys: REQUIRED_SCHEMA_KEYS.iter().map(|s| s.to_string()).collect(),
            artifacts_dir: artifacts_dir.into(),
        }
    }

    pub fn with_splits<I, S>(mut self, splits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.splits = splits.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn split_dir(&self, split: &str) -> PathBuf {
        self.dataset.join(split)
    }

    pub fn images_dir(&self, split: &str) -> PathBuf {
        self.split_dir(split).join(IMAGES_DIR)
    }

    pub fn labels_dir(&self, split: &str) -> PathBuf {
        self.split_dir(split).join(LABELS_DIR)
    }

    pub fn schema_path(&self) -> PathBuf {
        self.dataset.join(&self.schema_file)
    }

    pub fn report_path(&self) -> PathBuf {
        self.artifacts_dir.join(REPORT_FILE)
    }

    /// Case-insensitive; entries may be written with or without the leading dot.
    pub fn is_supported_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.supported_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// `labels/<dir of image relative to images/>/<stem>.txt`
pub fn label_path_for(images_dir: &Path, labels_dir: &Path, image: &Path) -> PathBuf {
    let rel = image.strip_prefix(images_dir).unwrap_or(image);
    let rel_dir = rel.parent().unwrap_or_else(|| Path::new(""));
    let stem = image.file_stem().unwrap_or_default();

    let mut name = stem.to_os_string();
    name.push(".");
    name.push(LABEL_EXTENSION);
    labels_dir.join(rel_dir).join(name)
}
