//! The six dataset checks and their aggregation into a [`ValidationReport`].
//!
//! Every check reports instead of raising: a missing directory, a corrupt
//! image or a malformed label line turns into `false` plus a log line, so one
//! bad file never stops the scan of the rest of the dataset.

use std::path::{Path, PathBuf};

use image::Limits;
use thiserror::Error;
use walkdir::WalkDir;

use crate::annotation::parse_annotation_line;
use crate::layout::{label_path_for, ValidationConfig, LABEL_EXTENSION};
use crate::log::ValidationLog;
use crate::report::ValidationReport;
use crate::schema::check_schema_file;

/// Unexpected failure inside a check. Never leaves the validator; it is
/// logged and the check evaluates to `false`.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("failed while traversing {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Per-run accumulator. Created fresh by every [`DatasetValidator::validate`] call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Findings {
    pub total_images: u64,
    pub valid_images: u64,
    pub total_annotations: u64,
    pub invalid_image_extensions: Vec<PathBuf>,
    pub missing_annotation_files: Vec<PathBuf>,
    pub invalid_annotation_files: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckResults {
    pub folder_structure_ok: bool,
    pub image_extensions_ok: bool,
    pub images_ok: bool,
    pub annotations_ok: bool,
    pub image_label_mapping_ok: bool,
    pub data_yaml_ok: bool,
}

impl CheckResults {
    pub fn all_passed(&self) -> bool {
        self.folder_structure_ok
            && self.image_extensions_ok
            && self.images_ok
            && self.annotations_ok
            && self.image_label_mapping_ok
            && self.data_yaml_ok
    }
}

pub struct DatasetValidator<'a> {
    config: &'a ValidationConfig,
    log: &'a dyn ValidationLog,
}

impl<'a> DatasetValidator<'a> {
    pub fn new(config: &'a ValidationConfig, log: &'a dyn ValidationLog) -> Self {
        Self { config, log }
    }

    pub fn config(&self) -> &ValidationConfig {
        self.config
    }

    /// Runs all six checks in order and builds the report. Every check runs
    /// even when an earlier one failed.
    pub fn validate(&self) -> ValidationReport {
        self.log.info("Data validation started");
        let mut findings = Findings::default();

        let checks = CheckResults {
            folder_structure_ok: self.check_folder_structure(),
            image_extensions_ok: self.check_image_extensions(&mut findings),
            images_ok: self.check_image_files(&mut findings),
            annotations_ok: self.check_annotations(&mut findings),
            image_label_mapping_ok: self.check_image_label_pairs(&mut findings),
            data_yaml_ok: self.check_data_yaml(),
        };

        let report = ValidationReport::new(checks, findings);
        if report.validation_status {
            self.log.info("Data validation completed: all checks passed");
        } else {
            self.log.error("Data validation completed with failures");
        }
        report
    }

    /// `<root>/<split>/{images,labels}` for every split, in declared order.
    /// Stops at the first missing directory.
    pub fn check_folder_structure(&self) -> bool {
        self.log.info("Validating folder structure");
        for split in &self.config.splits {
            let dirs = [
                self.config.split_dir(split),
                self.config.images_dir(split),
                self.config.labels_dir(split),
            ];
            for dir in dirs {
                self.log.info(&format!("Checking directory: {}", dir.display()));
                if !dir.is_dir() {
                    self.log.error(&format!("Missing directory: {}", dir.display()));
                    return false;
                }
            }
        }
        self.log.info("Folder structure validation passed");
        true
    }

    pub fn check_image_extensions(&self, findings: &mut Findings) -> bool {
        self.log.info("Validating image extensions");
        let mut valid = true;

        for split in &self.config.splits {
            valid &= self.guarded("image extension validation", || {
                let mut ok = true;
                for img in files_under(&self.config.images_dir(split))? {
                    if !self.config.is_supported_extension(&img) {
                        self.log.error(&format!("Invalid image extension found: {}", img.display()));
                        findings.invalid_image_extensions.push(img);
                        ok = false;
                    }
                }
                Ok(ok)
            });
        }

        self.log_outcome("Image extension validation", valid);
        valid
    }

    /// Decodes every file under `images/`. Counters accumulate over all splits.
    pub fn check_image_files(&self, findings: &mut Findings) -> bool {
        self.log.info("Validating image files");
        let mut valid = true;

        for split in &self.config.splits {
            valid &= self.guarded("image file validation", || {
                let images = files_under(&self.config.images_dir(split))?;
                findings.total_images += images.len() as u64;

                let mut ok = true;
                for img in images {
                    match verify_image(&img, Limits::no_limits()) {
                        Ok(()) => findings.valid_images += 1,
                        Err(e) => {
                            self.log.error(&format!("Corrupted image file found: {}: {e}", img.display()));
                            ok = false;
                        }
                    }
                }
                Ok(ok)
            });
        }

        self.log_outcome("Image file validation", valid);
        valid
    }

    /// Every line of every `*.txt` under `labels/` must be a valid
    /// annotation record. A failing file is listed once.
    pub fn check_annotations(&self, findings: &mut Findings) -> bool {
        self.log.info("Validating annotation files");
        let mut valid = true;

        for split in &self.config.splits {
            valid &= self.guarded("annotation file validation", || {
                let labels: Vec<PathBuf> = files_under(&self.config.labels_dir(split))?
                    .into_iter()
                    .filter(|p| p.extension().is_some_and(|e| e == LABEL_EXTENSION))
                    .collect();
                findings.total_annotations += labels.len() as u64;

                let mut ok = true;
                for label in labels {
                    if !self.label_file_ok(&label) {
                        findings.invalid_annotation_files.push(label);
                        ok = false;
                    }
                }
                Ok(ok)
            });
        }

        self.log_outcome("Annotation file validation", valid);
        valid
    }

    pub fn check_image_label_pairs(&self, findings: &mut Findings) -> bool {
        self.log.info("Validating image label pairs");
        let mut valid = true;

        for split in &self.config.splits {
            valid &= self.guarded("image label pair validation", || {
                let images_dir = self.config.images_dir(split);
                let labels_dir = self.config.labels_dir(split);

                let mut ok = true;
                for img in files_under(&images_dir)? {
                    let label = label_path_for(&images_dir, &labels_dir, &img);
                    if !label.is_file() {
                        self.log.error(&format!("Missing annotation file for image: {}", img.display()));
                        findings.missing_annotation_files.push(img);
                        ok = false;
                    }
                }
                Ok(ok)
            });
        }

        self.log_outcome("Image label pair validation", valid);
        valid
    }

    pub fn check_data_yaml(&self) -> bool {
        let path = self.config.schema_path();
        self.log.info(&format!("Validating {}", path.display()));

        match check_schema_file(&path, &self.config.required_schema_keys) {
            Ok(()) => {
                self.log.info("Schema file validation passed");
                true
            }
            Err(e) => {
                self.log.error(&e.to_string());
                false
            }
        }
    }

    fn label_file_ok(&self, label: &Path) -> bool {
        let text = match std::fs::read_to_string(label) {
            Ok(t) => t,
            Err(e) => {
                self.log.error(&format!("Cannot read annotation file {}: {e}", label.display()));
                return false;
            }
        };

        let mut ok = true;
        for (i, line) in text.lines().enumerate() {
            if let Err(defect) = parse_annotation_line(line) {
                self.log.error(&format!(
                    "Invalid annotation in file {} line {}: {defect}",
                    label.display(),
                    i + 1
                ));
                ok = false;
            }
        }
        ok
    }

    fn guarded<F>(&self, what: &str, check: F) -> bool
    where
        F: FnOnce() -> Result<bool, CheckError>,
    {
        match check() {
            Ok(ok) => ok,
            Err(e) => {
                self.log.error(&format!("Error during {what}: {e}"));
                false
            }
        }
    }

    fn log_outcome(&self, what: &str, valid: bool) {
        if valid {
            self.log.info(&format!("{what} passed"));
        } else {
            self.log.error(&format!("{what} failed"));
        }
    }
}

/// Regular files below `dir`, recursively, in file-name order.
fn files_under(dir: &Path) -> Result<Vec<PathBuf>, CheckError> {
    let mut out = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| CheckError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            out.push(entry.into_path());
        }
    }
    Ok(out)
}

/// Full decode. The checks pass `Limits::no_limits()` so large but valid
/// images are not reported as corrupted.
fn verify_image(path: &Path, limits: Limits) -> Result<(), image::ImageError> {
    let mut reader = image::ImageReader::open(path)?.with_guessed_format()?;
    reader.limits(limits);
    reader.decode()?;
    Ok(())
}
