//! Settings layering: built-in defaults, then the TOML file, then environment
//! variables and flags (clap resolves those two).

use crate::cli::Cli;
use anyhow::{Context, Result};
use judgekit_eval::EvaluationConfig;
use judgekit_model::{DEFAULT_BASE_URL, OpenAiCompatibleConfig, RetryConfig};
use judgekit_telemetry::LogFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SAVE_DIR: &str = "./results";

/// Layout of the `--config` TOML file
///
/// ```toml
/// save_dir = "./results"
///
/// [evaluation]
/// judge_model = "meta-llama/Llama-3.2-3B-Instruct"
/// max_parse_retries = 1
///
/// [backend]
/// base_url = "http://localhost:8000/v1"
/// timeout_secs = 60
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub save_dir: Option<PathBuf>,
    pub evaluation: EvaluationConfig,
    pub backend: BackendSettings,
}

impl FileSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}

/// Connection settings for the judge server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: 60,
            retry: RetryConfig::default(),
        }
    }
}

impl BackendSettings {
    pub fn client_config(&self, model: &str) -> OpenAiCompatibleConfig {
        let mut config = OpenAiCompatibleConfig::new(model)
            .with_base_url(&self.base_url)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key);
        }
        config
    }
}

/// Fully resolved settings for one invocation
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_path: PathBuf,
    pub save_dir: PathBuf,
    pub evaluation: EvaluationConfig,
    pub backend: BackendSettings,
    pub log_format: LogFormat,
}

impl Settings {
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileSettings::load(path)?,
            None => FileSettings::default(),
        };
        Ok(Self::layer(cli, file))
    }

    fn layer(cli: &Cli, file: FileSettings) -> Self {
        let FileSettings { save_dir, mut evaluation, mut backend } = file;

        if let Some(model) = &cli.model {
            evaluation.judge_model = model.clone();
        }
        if cli.enable_bleu_rouge {
            evaluation.enable_similarity = true;
        }
        if let Some(dir) = &cli.prompt_dir {
            evaluation.prompt_dir = Some(dir.clone());
        }
        if let Some(concurrency) = cli.concurrency {
            evaluation.concurrency = concurrency;
        }
        if let Some(url) = &cli.base_url {
            backend.base_url = url.clone();
        }
        if let Some(key) = &cli.api_key {
            backend.api_key = Some(key.clone());
        }
        if let Some(secs) = cli.timeout_secs {
            backend.timeout_secs = secs;
            evaluation.judge.timeout_secs = secs;
        }

        Self {
            data_path: cli.data_path.clone(),
            save_dir: cli
                .save_dir
                .clone()
                .or(save_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_DIR)),
            evaluation,
            backend,
            log_format: cli.log_format.into(),
        }
    }
}
