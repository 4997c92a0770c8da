use dataset::{validate_and_persist, ReportError, TracingLog, ValidationArtifact, ValidationConfig};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ValidationStageError {
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("validation task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Runs the dataset checks on a blocking thread and persists the report.
/// A failing dataset is still `Ok`; only persisting the report can fail.
pub async fn validate_dataset(config: ValidationConfig) -> Result<ValidationArtifact, ValidationStageError> {
    info!(dataset = %config.dataset.display(), "data validation started");

    let artifact = tokio::task::spawn_blocking(move || validate_and_persist(&config, &TracingLog)).await??;

    info!(
        status = artifact.validation_status,
        report = %artifact.validation_report.display(),
        "data validation completed"
    );
    Ok(artifact)
}
