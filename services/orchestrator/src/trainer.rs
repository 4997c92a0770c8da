use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{info, warn};

pub const BEST_CHECKPOINT: &str = "best.pt";
pub const LAST_CHECKPOINT: &str = "last.pt";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    pub img_size: u32,
    pub epochs: u32,
    pub batch_size: u32,
    pub patience: u32,
    pub optimizer: String,
    pub lr0: f64,
    pub lrf: f64,
    pub momentum: f64,
    pub weight_decay: f64,
    pub workers: u32,
    pub warmup_epochs: f64,
    pub val: bool,
    pub plots: bool,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            img_size: 640,
            epochs: 100,
            batch_size: 16,
            patience: 50,
            optimizer: "auto".to_string(),
            lr0: 0.01,
            lrf: 0.01,
            momentum: 0.937,
            weight_decay: 0.0005,
            workers: 8,
            warmup_epochs: 3.0,
            val: true,
            plots: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub dataset: PathBuf,
    pub validation_status: bool,
    pub model_name: String,
    pub params: TrainingParams,
    pub runs_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub run_name: String,
}

impl TrainingConfig {
    pub fn schema_file(&self) -> PathBuf {
        self.dataset.join(dataset::SCHEMA_FILE)
    }

    /// Where the trainer is told to put this run.
    pub fn run_dir(&self) -> PathBuf {
        self.runs_dir.join(&self.run_name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingArtifact {
    pub run_dir: PathBuf,
    pub best_model: PathBuf,
    pub last_model: PathBuf,
}

/// External detection-model trainer.
#[async_trait]
pub trait Trainer: Send + Sync {
    /// Trains on `cfg.dataset` and returns the run directory holding `weights/`.
    async fn train(&self, cfg: &TrainingConfig) -> anyhow::Result<PathBuf>;
    fn name(&self) -> &str;
}

/// Runs the Ultralytics `yolo` CLI as a child process.
pub struct UltralyticsTrainer {
    program: String,
    base_args: Vec<String>,
}

impl UltralyticsTrainer {
    /// `command` may carry leading arguments, e.g. `"python3 /opt/yolo_cli.py"`.
    pub fn new(command: &str) -> Self {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "yolo".to_string());
        Self {
            program,
            base_args: parts.collect(),
        }
    }
}

pub fn training_args(cfg: &TrainingConfig) -> Vec<String> {
    let p = &cfg.params;
    let py_bool = |b: bool| if b { "True" } else { "False" };
    vec![
        "detect".to_string(),
        "train".to_string(),
        format!("data={}", cfg.schema_file().display()),
        format!("model={}", cfg.model_name),
        format!("imgsz={}", p.img_size),
        format!("epochs={}", p.epochs),
        format!("batch={}", p.batch_size),
        format!("patience={}", p.patience),
        format!("optimizer={}", p.optimizer),
        format!("lr0={}", p.lr0),
        format!("lrf={}", p.lrf),
        format!("momentum={}", p.momentum),
        format!("weight_decay={}", p.weight_decay),
        format!("workers={}", p.workers),
        format!("warmup_epochs={}", p.warmup_epochs),
        format!("val={}", py_bool(p.val)),
        format!("plots={}", py_bool(p.plots)),
        format!("project={}", cfg.runs_dir.display()),
        format!("name={}", cfg.run_name),
        "exist_ok=True".to_string(),
    ]
}

#[async_trait]
impl Trainer for UltralyticsTrainer {
    async fn train(&self, cfg: &TrainingConfig) -> anyhow::Result<PathBuf> {
        tokio::fs::create_dir_all(&cfg.runs_dir)
            .await
            .with_context(|| format!("cannot create runs dir {}", cfg.runs_dir.display()))?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args).args(training_args(cfg));
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn trainer `{}`", self.program))?;

        // Stream child output into our log
        let out_task = child.stdout.take().map(|stdout| {
            tokio::spawn(drain_lines(stdout, |line| info!(target: "trainer", "{line}")))
        });
        let err_task = child.stderr.take().map(|stderr| {
            tokio::spawn(drain_lines(stderr, |line| warn!(target: "trainer", "{line}")))
        });

        let status = child.wait().await.context("trainer wait failed")?;
        for task in [out_task, err_task].into_iter().flatten() {
            let _ = task.await;
        }

        if !status.success() {
            bail!("trainer exited with {status}");
        }
        Ok(cfg.run_dir())
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Reads `reader` to EOF, one line at a time. Invalid UTF-8 is replaced
/// rather than ending the loop, so the child never loses its pipe.
async fn drain_lines<R, F>(reader: R, on_line: F) -> usize
where
    R: AsyncRead + Unpin,
    F: Fn(&str),
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut count = 0;
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                on_line(line.trim_end_matches(&['\n', '\r'][..]));
                count += 1;
            }
        }
    }
    count
}

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("refusing to train on a dataset that did not pass validation")]
    NotValidated,
    #[error("trainer failed: {0:#}")]
    Trainer(anyhow::Error),
    #[error("trainer produced no checkpoint at {0}")]
    MissingCheckpoint(PathBuf),
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Drives one training run and collects its checkpoints.
pub struct ModelTrainer<'a> {
    config: TrainingConfig,
    trainer: &'a dyn Trainer,
}

impl<'a> ModelTrainer<'a> {
    pub fn new(config: TrainingConfig, trainer: &'a dyn Trainer) -> Self {
        Self { config, trainer }
    }

    pub async fn initiate(&self) -> Result<TrainingArtifact, TrainingError> {
        if !self.config.validation_status {
            return Err(TrainingError::NotValidated);
        }

        info!(
            model = %self.config.model_name,
            trainer = self.trainer.name(),
            run = %self.config.run_name,
            "model training started"
        );
        let run_dir = self
            .trainer
            .train(&self.config)
            .await
            .map_err(TrainingError::Trainer)?;
        info!(run_dir = %run_dir.display(), "model training completed");

        self.save_model(run_dir).await
    }

    /// Copies `weights/{best,last}.pt` from the run into the artifacts dir.
    async fn save_model(&self, run_dir: PathBuf) -> Result<TrainingArtifact, TrainingError> {
        let dest_dir = &self.config.artifacts_dir;
        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|source| TrainingError::Io { path: dest_dir.clone(), source })?;

        let best_model = copy_checkpoint(&run_dir, BEST_CHECKPOINT, dest_dir).await?;
        let last_model = copy_checkpoint(&run_dir, LAST_CHECKPOINT, dest_dir).await?;
        info!(dir = %dest_dir.display(), "best and last checkpoints saved");

        Ok(TrainingArtifact { run_dir, best_model, last_model })
    }
}

async fn copy_checkpoint(run_dir: &Path, name: &str, dest_dir: &Path) -> Result<PathBuf, TrainingError> {
    let src = run_dir.join("weights").join(name);
    if !src.is_file() {
        return Err(TrainingError::MissingCheckpoint(src));
    }
    let dest = dest_dir.join(name);
    tokio::fs::copy(&src, &dest)
        .await
        .map_err(|source| TrainingError::Io { path: dest.clone(), source })?;
    Ok(dest)
}
