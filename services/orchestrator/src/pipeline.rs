use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use dataset::ValidationArtifact;
use modelops::ModelArtifact;
use objstore::ObjectStore;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::ingestion::{ingest, IngestionArtifact, IngestionError};
use crate::trainer::{ModelTrainer, Trainer, TrainingArtifact, TrainingError};
use crate::upload::{upload_model, UploadError};
use crate::validation::{validate_dataset, ValidationStageError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Pending,
    Ingesting,
    Validating,
    Training,
    Uploading,
    Done,
    Aborted,
    Failed,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("data ingestion failed: {0}")]
    Ingestion(#[from] IngestionError),
    #[error("data validation failed to run: {0}")]
    Validation(#[from] ValidationStageError),
    #[error("Data validation failed, stopping the pipeline (report: {})", report.display())]
    ValidationGate { report: PathBuf },
    #[error("model training failed: {0}")]
    Training(#[from] TrainingError),
    #[error("model upload failed: {0}")]
    Upload(#[from] UploadError),
}

#[derive(Clone, Debug)]
pub struct PipelineOutcome {
    pub run_name: String,
    pub ingestion: IngestionArtifact,
    pub validation: ValidationArtifact,
    pub training: TrainingArtifact,
    pub model: ModelArtifact,
    pub model_record: PathBuf,
}

/// Ingest → Validate → (Train → Upload | Abort). One pass, no retries.
pub struct Pipeline<'a> {
    cfg: &'a AppConfig,
    store: Arc<dyn ObjectStore>,
    trainer: &'a dyn Trainer,
    run_name: String,
    stage: Mutex<PipelineStage>,
}

impl<'a> Pipeline<'a> {
    pub fn new(cfg: &'a AppConfig, store: Arc<dyn ObjectStore>, trainer: &'a dyn Trainer) -> Self {
        Self {
            cfg,
            store,
            trainer,
            run_name: format!("train-{}", Uuid::new_v4().simple()),
            stage: Mutex::new(PipelineStage::Pending),
        }
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage.lock().map(|s| *s).unwrap_or(PipelineStage::Failed)
    }

    fn enter(&self, next: PipelineStage) {
        if let Ok(mut s) = self.stage.lock() {
            info!(from = ?*s, to = ?next, run = %self.run_name, "pipeline stage");
            *s = next;
        }
    }

    pub async fn run(&self) -> Result<PipelineOutcome, PipelineError> {
        let result = self.run_stages().await;
        match &result {
            Ok(_) => self.enter(PipelineStage::Done),
            Err(PipelineError::ValidationGate { report }) => {
                warn!(report = %report.display(), "pipeline aborted by validation gate");
                self.enter(PipelineStage::Aborted);
            }
            Err(e) => {
                error!(error = %e, "pipeline failed");
                self.enter(PipelineStage::Failed);
            }
        }
        result
    }

    async fn run_stages(&self) -> Result<PipelineOutcome, PipelineError> {
        let cfg = self.cfg;

        self.enter(PipelineStage::Ingesting);
        let ingestion = ingest(
            self.store.clone(),
            &cfg.s3_bucket,
            &cfg.s3_prefix,
            cfg.data_dir.clone(),
        )
        .await?;

        self.enter(PipelineStage::Validating);
        let validation = validate_dataset(cfg.validation_config(&ingestion.dataset)).await?;
        if !validation.validation_status {
            return Err(PipelineError::ValidationGate {
                report: validation.validation_report,
            });
        }

        self.enter(PipelineStage::Training);
        let training_cfg = cfg.training_config(&ingestion.dataset, validation.validation_status, &self.run_name);
        let training = ModelTrainer::new(training_cfg, self.trainer).initiate().await?;

        self.enter(PipelineStage::Uploading);
        let (model, model_record) = upload_model(
            self.store.clone(),
            &training,
            &cfg.upload_bucket,
            &cfg.upload_prefix,
            &self.run_name,
            &cfg.training_artifacts_dir(),
        )
        .await?;
        info!("Model uploaded to {}", model.uri);

        Ok(PipelineOutcome {
            run_name: self.run_name.clone(),
            ingestion,
            validation,
            training,
            model,
            model_record,
        })
    }
}
