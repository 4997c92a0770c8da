mod config;
mod ingestion;
mod logging;
mod pipeline;
mod store_exec;
mod trainer;
mod upload;
mod validation;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::{bail, Result};
use objstore::{LocalObjectStore, ObjectStore};
use tracing::info;

use crate::config::AppConfig;
use crate::pipeline::Pipeline;
use crate::trainer::UltralyticsTrainer;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cfg = AppConfig::from_env()?;
    let (_log_guard, log_file) = logging::init_tracing(&cfg.log_dir)?;
    info!(log_file = %log_file.display(), "logging initialised");

    // --- Startup health checks (fail fast) ---
    startup_checks(&cfg)?;

    // --- S3 (MinIO) --- filesystem-backed until the SDK lands
    let store: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(&cfg.object_store_root));
    let trainer = UltralyticsTrainer::new(&cfg.trainer_bin);

    let pipeline = Pipeline::new(&cfg, store, &trainer);
    info!(run = pipeline.run_name(), "training pipeline started");

    let outcome = pipeline.run().await?;
    info!(
        run = %outcome.run_name,
        uri = %outcome.model.uri,
        record = %outcome.model_record.display(),
        "training pipeline finished"
    );
    Ok(())
}

fn startup_checks(cfg: &AppConfig) -> Result<()> {
    check_object_store(cfg)?;
    info!(root = %cfg.object_store_root.display(), "object store: ok");
    Ok(())
}

fn check_object_store(cfg: &AppConfig) -> Result<()> {
    if !cfg.object_store_root.is_dir() {
        bail!(
            "OBJECT_STORE_ROOT {} is not a directory",
            cfg.object_store_root.display()
        );
    }
    for bucket in [&cfg.s3_bucket, &cfg.upload_bucket] {
        if !cfg.object_store_root.join(bucket).is_dir() {
            bail!("bucket {bucket} not found under {}", cfg.object_store_root.display());
        }
    }
    Ok(())
}
