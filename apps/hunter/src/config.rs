use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Candidate profile document, re-read on every run.
    pub profile_path: PathBuf,
    /// Scouting child program. Defaults to the `scout` binary next to ours.
    pub scout_bin: Option<PathBuf>,
    pub scout_max_results: usize,
    /// Unset means stages run until they finish.
    pub stage_timeout: Option<Duration>,
    pub llm_max_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Config {
            anthropic_api_key: require(&lookup, "ANTHROPIC_API_KEY")?,
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            profile_path: lookup("PROFILE_PATH")
                .unwrap_or_else(|| "data/master_resume.md".to_string())
                .into(),
            scout_bin: lookup("SCOUT_BIN").map(PathBuf::from),
            scout_max_results: parse_or(&lookup, "SCOUT_MAX_RESULTS", 3)?,
            stage_timeout: lookup("STAGE_TIMEOUT_SECS")
                .map(|v| parse_value::<u64>("STAGE_TIMEOUT_SECS", &v))
                .transpose()?
                .map(Duration::from_secs),
            llm_max_attempts: parse_or(&lookup, "LLM_MAX_ATTEMPTS", 1)?,
        })
    }
}

pub(crate) fn require(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

pub(crate) fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => parse_value(key, &value),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value '{value}'"))
}
