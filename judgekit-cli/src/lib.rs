//! # judgekit-cli
//!
//! Command-line runner for judgekit evaluations.
//!
//! ```text
//! judgekit --data-path data/translation.json --enable-bleu-rouge \
//!     --base-url http://localhost:8000/v1 -m meta-llama/Llama-3.2-3B-Instruct
//! ```
//!
//! The task is inferred from the data file name. The report is written to
//! `{save_dir}/{task}_results.json` and a summary is printed to stdout.

pub mod cli;
pub mod config;

pub use cli::{Cli, LogFormatArg};
pub use config::{BackendSettings, FileSettings, Settings};

use anyhow::{Context, Result};
use judgekit_eval::{Pipeline, Report, Task};
use judgekit_model::OpenAiCompatibleClient;
use std::path::PathBuf;
use std::sync::Arc;

/// Run one evaluation as described by the command line.
pub async fn run(cli: Cli) -> Result<PathBuf> {
    let settings = Settings::resolve(&cli)?;
    judgekit_telemetry::init_with_format("judgekit", settings.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    // Task and option checks happen before any backend is contacted
    let task = Task::from_data_path(&settings.data_path)?;
    settings.evaluation.validate(task)?;

    let client = OpenAiCompatibleClient::new(
        settings.backend.client_config(&settings.evaluation.judge_model),
    )
    .context("Failed to create judge backend")?
    .with_retry_config(settings.backend.retry.clone());

    tracing::info!(
        %task,
        model = %settings.evaluation.judge_model,
        base_url = %settings.backend.base_url,
        data = %settings.data_path.display(),
        "Starting evaluation"
    );

    let pipeline = Pipeline::from_config(settings.evaluation.clone(), Arc::new(client))?;
    let report: Report = pipeline
        .run_file(&settings.data_path)
        .await
        .with_context(|| format!("Evaluation of {} failed", settings.data_path.display()))?;

    let path = report.save(&settings.save_dir)?;
    println!("{}", report.format_summary());
    println!("Evaluation complete. Results saved to {}", path.display());
    Ok(path)
}
