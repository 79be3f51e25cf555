use clap::{Parser, ValueEnum};
use judgekit_telemetry::LogFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "judgekit", version)]
#[command(about = "Evaluate tasks using an LLM as judge", long_about = None)]
pub struct Cli {
    /// Judge model name [default: meta-llama/Llama-3.2-3B-Instruct]
    #[arg(short, long, env = "JUDGEKIT_MODEL")]
    pub model: Option<String>,

    /// JSON data file named after its task: review.json or translation.json
    #[arg(long, short_alias = 'd', alias = "data", env = "JUDGEKIT_DATA_PATH")]
    pub data_path: PathBuf,

    /// Directory to save evaluation results [default: ./results]
    #[arg(long, env = "JUDGEKIT_SAVE_DIR")]
    pub save_dir: Option<PathBuf>,

    /// Compute BLEU and ROUGE scores (translation task only)
    #[arg(long, env = "JUDGEKIT_ENABLE_BLEU_ROUGE")]
    pub enable_bleu_rouge: bool,

    /// TOML settings file
    #[arg(long, env = "JUDGEKIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the OpenAI-compatible judge server
    #[arg(long, env = "JUDGEKIT_BASE_URL")]
    pub base_url: Option<String>,

    /// API key for the judge server, if it needs one
    #[arg(long, env = "JUDGEKIT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Seconds to wait for each judge reply
    #[arg(long, env = "JUDGEKIT_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Directory with prompt overrides ({task}.txt, {task}.user.txt)
    #[arg(long, env = "JUDGEKIT_PROMPT_DIR")]
    pub prompt_dir: Option<PathBuf>,

    /// Instances judged concurrently
    #[arg(long, env = "JUDGEKIT_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormatArg::Pretty, env = "JUDGEKIT_LOG_FORMAT")]
    pub log_format: LogFormatArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}
