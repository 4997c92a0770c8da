use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::{ValidationConfig, REPORT_FILE};
use crate::log::ValidationLog;
use crate::validator::{CheckResults, DatasetValidator, Findings};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot create artifacts directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write validation report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read validation report {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Ser(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub validation_status: bool,
    pub folder_structure_ok: bool,
    pub image_extensions_ok: bool,
    pub images_ok: bool,
    pub annotations_ok: bool,
    pub image_label_mapping_ok: bool,
    pub data_yaml_ok: bool,
    pub total_images: u64,
    pub valid_images: u64,
    pub total_annotations: u64,
    pub invalid_image_extensions: Vec<PathBuf>,
    pub missing_annotation_files: Vec<PathBuf>,
    pub invalid_annotation_files: Vec<PathBuf>,
}

impl ValidationReport {
    pub fn new(checks: CheckResults, findings: Findings) -> Self {
        Self {
            validation_status: checks.all_passed(),
            folder_structure_ok: checks.folder_structure_ok,
            image_extensions_ok: checks.image_extensions_ok,
            images_ok: checks.images_ok,
            annotations_ok: checks.annotations_ok,
            image_label_mapping_ok: checks.image_label_mapping_ok,
            data_yaml_ok: checks.data_yaml_ok,
            total_images: findings.total_images,
            valid_images: findings.valid_images,
            total_annotations: findings.total_annotations,
            invalid_image_extensions: findings.invalid_image_extensions,
            missing_annotation_files: findings.missing_annotation_files,
            invalid_annotation_files: findings.invalid_annotation_files,
        }
    }
}

/// What the pipeline gets back from a validation run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationArtifact {
    pub validation_report: PathBuf,
    pub validation_status: bool,
}

/// Writes `<artifacts_dir>/validation_report.json`, creating the directory.
pub fn write_report(report: &ValidationReport, artifacts_dir: &Path) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(artifacts_dir).map_err(|source| ReportError::CreateDir {
        path: artifacts_dir.to_path_buf(),
        source,
    })?;

    let path = artifacts_dir.join(REPORT_FILE);
    let bytes = serde_json::to_vec_pretty(report)?;
    std::fs::write(&path, bytes).map_err(|source| ReportError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

pub fn read_report(path: &Path) -> Result<ValidationReport, ReportError> {
    let bytes = std::fs::read(path).map_err(|source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Validates the dataset and persists the report. Only persisting can fail.
pub fn validate_and_persist(
    config: &ValidationConfig,
    log: &dyn ValidationLog,
) -> Result<ValidationArtifact, ReportError> {
    let report = DatasetValidator::new(config, log).validate();

    let path = write_report(&report, &config.artifacts_dir).inspect_err(|e| {
        log.error(&format!("Error in data validation: {e}"));
    })?;
    log.info(&format!("Validation report saved to: {}", path.display()));

    Ok(ValidationArtifact {
        validation_report: path,
        validation_status: report.validation_status,
    })
}
