//! Command-line and environment configuration.
//!
//! Every flag falls back to an environment variable; `main` loads a `.env`
//! file first so local runs can keep credentials out of the shell history.

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use std::{path::PathBuf, time::Duration};

use crate::classify::RetryPolicy;

/// Which tabular files a pipeline writes for each country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Parquet,
    Both,
}

impl OutputFormat {
    pub fn csv(&self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Both)
    }

    pub fn parquet(&self) -> bool {
        matches!(self, OutputFormat::Parquet | OutputFormat::Both)
    }
}

/// Provider connection and model settings.
#[derive(Debug, Clone, Args)]
pub struct LlmConfig {
    /// API key for the chat-completions endpoint (GROQ_API_KEY is also read)
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "LLM_MODEL", default_value = "openai/gpt-oss-120b")]
    pub model: String,

    /// OpenAI-compatible base URL; `chat/completions` is appended
    #[arg(
        long,
        env = "LLM_BASE_URL",
        default_value = "https://api.groq.com/openai/v1/"
    )]
    pub base_url: String,

    #[arg(long, env = "LLM_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,

    #[arg(long, env = "LLM_MAX_TOKENS", default_value_t = 1000)]
    pub max_tokens: u32,

    /// Business the reviews are about
    #[arg(long, env = "SUBJECT_NAME", default_value = "Lyca Mobile")]
    pub subject: String,
}

impl LlmConfig {
    /// The configured key, or `GROQ_API_KEY` as a fallback.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.trim().to_string());
        }
        match std::env::var("GROQ_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => bail!("no API key: set LLM_API_KEY (or GROQ_API_KEY) or pass --api-key"),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Attempt bound and delays around each classification call.
#[derive(Debug, Clone, Args)]
pub struct RetryArgs {
    #[arg(long, env = "CLASSIFY_MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: usize,

    /// Pause after a successful call
    #[arg(long, env = "CLASSIFY_PACING_DELAY_MS", default_value_t = 500)]
    pub pacing_delay_ms: u64,

    /// Pause after a failed attempt before the next one
    #[arg(long, env = "CLASSIFY_BACKOFF_DELAY_MS", default_value_t = 1500)]
    pub backoff_delay_ms: u64,
}

impl RetryArgs {
    pub fn policy(&self) -> Result<RetryPolicy> {
        if self.max_attempts == 0 {
            bail!("--max-attempts must be at least 1");
        }
        Ok(RetryPolicy {
            max_attempts: self.max_attempts,
            pacing_delay: Duration::from_millis(self.pacing_delay_ms),
            backoff_delay: Duration::from_millis(self.backoff_delay_ms),
        })
    }
}

#[derive(Debug, Clone, Args)]
pub struct CleanConfig {
    /// Directory of raw export CSV files
    #[arg(long, env = "CLEAN_INPUT_DIR", default_value = "raw")]
    pub input_dir: PathBuf,

    /// Directory for `<country>_cleaned.*`
    #[arg(long, env = "CLEAN_OUTPUT_DIR", default_value = "cleaned")]
    pub output_dir: PathBuf,

    #[arg(long, env = "OUTPUT_FORMAT", value_enum, default_value = "both")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct ClassifyConfig {
    /// Directory of normalized per-country CSV files
    #[arg(long, env = "CLASSIFY_INPUT_DIR", default_value = "cleaned")]
    pub input_dir: PathBuf,

    /// Directory for `<country>_classified.*` and `<country>_skipped.csv`
    #[arg(long, env = "CLASSIFY_OUTPUT_DIR", default_value = "classified")]
    pub output_dir: PathBuf,

    /// Ledger of completed countries, used to resume interrupted runs
    #[arg(long, env = "HISTORY_DIR", default_value = "history")]
    pub history_dir: PathBuf,

    #[arg(long, env = "OUTPUT_FORMAT", value_enum, default_value = "both")]
    pub format: OutputFormat,

    /// Reclassify countries the ledger marks as completed
    #[arg(long, default_value_t = false)]
    pub force: bool,

    #[command(flatten)]
    pub llm: LlmConfig,

    #[command(flatten)]
    pub retry: RetryArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_flags() {
        assert!(OutputFormat::Both.csv() && OutputFormat::Both.parquet());
        assert!(OutputFormat::Csv.csv() && !OutputFormat::Csv.parquet());
        assert!(!OutputFormat::Parquet.csv() && OutputFormat::Parquet.parquet());
    }

    #[test]
    fn retry_args_build_policy() {
        let args = RetryArgs {
            max_attempts: 3,
            pacing_delay_ms: 500,
            backoff_delay_ms: 1500,
        };
        let policy = args.policy().unwrap();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.pacing_delay, Duration::from_millis(500));
        assert_eq!(policy.backoff_delay, Duration::from_millis(1500));
        assert!(policy.backoff_delay > policy.pacing_delay);

        let zero = RetryArgs {
            max_attempts: 0,
            ..args
        };
        assert!(zero.policy().is_err());
    }

    #[test]
    fn explicit_api_key_wins() {
        let cfg = LlmConfig {
            api_key: Some(" sk-test ".into()),
            model: "m".into(),
            base_url: "http://localhost/".into(),
            timeout_secs: 5,
            max_tokens: 100,
            subject: "Acme".into(),
        };
        assert_eq!(cfg.resolve_api_key().unwrap(), "sk-test");
    }
}
