use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use dataset::{ValidationConfig, DEFAULT_IMAGE_EXTENSIONS, DEFAULT_SPLITS};

use crate::trainer::{TrainingConfig, TrainingParams};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub s3_bucket: String,
    pub s3_prefix: String,
    pub object_store_root: PathBuf,

    pub data_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub log_dir: PathBuf,

    pub splits: Vec<String>,
    pub image_extensions: Vec<String>,

    pub model_name: String,
    pub trainer_bin: String,
    pub training: TrainingParams,

    pub upload_bucket: String,
    pub upload_prefix: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Missing required env var: {key}"))
        };
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let s3_bucket = get("S3_BUCKET")?;
        let s3_prefix = get_or("S3_PREFIX", "dataset/");
        let object_store_root = PathBuf::from(get("OBJECT_STORE_ROOT")?);

        let data_dir = PathBuf::from(get_or("DATA_DIR", "data"));
        let artifacts_dir = PathBuf::from(get_or("ARTIFACTS_DIR", "artifacts"));
        let log_dir = PathBuf::from(get_or("LOG_DIR", "logs"));

        let splits = csv(lookup("DATASET_SPLITS"), &DEFAULT_SPLITS);
        let image_extensions = csv(lookup("SUPPORTED_IMAGE_EXTENSIONS"), &DEFAULT_IMAGE_EXTENSIONS);

        let model_name = get_or("MODEL_NAME", "yolov8n.pt");
        let trainer_bin = get_or("TRAINER_BIN", "yolo");
        let upload_bucket = lookup("UPLOAD_BUCKET").unwrap_or_else(|| s3_bucket.clone());
        let upload_prefix = get_or("UPLOAD_PREFIX", "models");

        let d = TrainingParams::default();
        let training = TrainingParams {
            img_size: parse(&lookup, "TRAIN_IMG_SIZE", d.img_size)?,
            epochs: parse(&lookup, "TRAIN_EPOCHS", d.epochs)?,
            batch_size: parse(&lookup, "TRAIN_BATCH", d.batch_size)?,
            patience: parse(&lookup, "TRAIN_PATIENCE", d.patience)?,
            optimizer: get_or("TRAIN_OPTIMIZER", &d.optimizer),
            lr0: parse(&lookup, "TRAIN_LR0", d.lr0)?,
            lrf: parse(&lookup, "TRAIN_LRF", d.lrf)?,
            momentum: parse(&lookup, "TRAIN_MOMENTUM", d.momentum)?,
            weight_decay: parse(&lookup, "TRAIN_WEIGHT_DECAY", d.weight_decay)?,
            workers: parse(&lookup, "TRAIN_WORKERS", d.workers)?,
            warmup_epochs: parse(&lookup, "TRAIN_WARMUP_EPOCHS", d.warmup_epochs)?,
            val: flag(&lookup, "TRAIN_VAL", d.val)?,
            plots: flag(&lookup, "TRAIN_PLOTS", d.plots)?,
        };

        // Tiny sanity checks (fail fast, fail loud)
        if splits.is_empty() {
            bail!("DATASET_SPLITS must name at least one split");
        }
        if image_extensions.is_empty() {
            bail!("SUPPORTED_IMAGE_EXTENSIONS must list at least one extension");
        }
        if training.epochs == 0 || training.batch_size == 0 || training.img_size == 0 {
            bail!("TRAIN_EPOCHS, TRAIN_BATCH and TRAIN_IMG_SIZE must be positive");
        }
        if trainer_bin.split_whitespace().next().is_none() {
            bail!("TRAINER_BIN must not be empty");
        }

        Ok(Self {
            s3_bucket,
            s3_prefix,
            object_store_root,
            data_dir,
            artifacts_dir,
            log_dir,
            splits,
            image_extensions,
            model_name,
            trainer_bin,
            training,
            upload_bucket,
            upload_prefix,
        })
    }

    pub fn validation_artifacts_dir(&self) -> PathBuf {
        self.artifacts_dir.join("data_validation")
    }

    pub fn training_artifacts_dir(&self) -> PathBuf {
        self.artifacts_dir.join("model_training")
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.artifacts_dir.join("runs")
    }

    pub fn validation_config(&self, dataset: &Path) -> ValidationConfig {
        ValidationConfig::new(dataset, self.validation_artifacts_dir())
            .with_splits(self.splits.iter().cloned())
            .with_extensions(self.image_extensions.iter().cloned())
    }

    pub fn training_config(&self, dataset: &Path, validation_status: bool, run_name: &str) -> TrainingConfig {
        TrainingConfig {
            dataset: dataset.to_path_buf(),
            validation_status,
            model_name: self.model_name.clone(),
            params: self.training.clone(),
            runs_dir: self.runs_dir(),
            artifacts_dir: self.training_artifacts_dir(),
            run_name: run_name.to_string(),
        }
    }
}

fn csv(raw: Option<String>, default: &[&str]) -> Vec<String> {
    match raw {
        Some(v) => v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => default.iter().map(|s| s.to_string()).collect(),
    }
}

fn parse<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key}={raw:?} is invalid: {e}")),
        None => Ok(default),
    }
}

fn flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => bail!("{key}={raw:?} is invalid: expected true/false, yes/no or 1/0"),
    }
}
