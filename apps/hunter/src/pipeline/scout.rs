//! Scouting stage runner.
//!
//! The browser-automation capability runs its own event loop and cannot be
//! re-entered from ours, so it lives in a separate OS process (the `scout`
//! binary). Protocol: the canonical keyword is the single positional
//! argument; on success the child prints exactly one line of JSON (an array
//! of listings) on stdout and exits 0. Diagnostics go to stderr only.

use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use crate::models::ListingRecord;
use crate::pipeline::error::{PipelineError, Stage};
use crate::pipeline::extractor::{extract, Shape};

/// Environment variable through which the child learns the result cap.
pub const MAX_RESULTS_ENV: &str = "SCOUT_MAX_RESULTS";

/// Canonical search keywords, checked in order as case-insensitive
/// substrings. Anything unmatched is searched verbatim.
const KEYWORD_VOCABULARY: &[(&str, &str)] = &[
    ("machine learning", "Machine Learning"),
    ("data science", "Data Science"),
    ("backend", "Backend"),
    ("ai", "Artificial Intelligence"),
];

/// The scouting stage as seen by the orchestrator.
#[async_trait]
pub trait ListingScout: Send + Sync {
    async fn scout(&self, query: &str) -> Result<Vec<ListingRecord>, PipelineError>;
}

/// Maps informal query text to a canonical keyword so near-duplicate queries
/// drive the fetch capability the same way.
pub fn normalize_query(query: &str) -> String {
    let lowered = query.to_lowercase();

    KEYWORD_VOCABULARY
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, keyword)| keyword.to_string())
        .unwrap_or_else(|| query.trim().to_string())
}

/// Runs the `scout` child process and validates what it prints.
#[derive(Debug, Clone)]
pub struct ScoutRunner {
    program: PathBuf,
    args: Vec<String>,
    max_results: usize,
    timeout: Option<Duration>,
}

impl ScoutRunner {
    pub fn new(program: impl Into<PathBuf>, max_results: usize) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            max_results: max_results.max(1),
            timeout: None,
        }
    }

    /// Arguments placed before the keyword (e.g. an interpreter's script path).
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Kill the child and fail the stage when it runs longer than `timeout`.
    /// `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The `scout` binary installed next to the running executable.
    pub fn sibling_binary() -> anyhow::Result<PathBuf> {
        let current = std::env::current_exe().context("Failed to locate current executable")?;
        Ok(current.with_file_name(format!("scout{}", std::env::consts::EXE_SUFFIX)))
    }

    async fn run_child(&self, keyword: &str) -> Result<Output, PipelineError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(keyword)
            .env(MAX_RESULTS_ENV, self.max_results.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command
            .spawn()
            .map_err(|e| PipelineError::StageProcessFailure {
                status: "spawn failed".to_string(),
                diagnostics: format!("{}: {e}", self.program.display()),
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| PipelineError::StageTimeout {
                    stage: Stage::Scouting,
                    after_secs: limit.as_secs(),
                })?,
            None => child.wait_with_output().await,
        };

        waited.map_err(|e| PipelineError::StageProcessFailure {
            status: "wait failed".to_string(),
            diagnostics: e.to_string(),
        })
    }

    fn interpret(&self, query: &str, output: Output) -> Result<Vec<ListingRecord>, PipelineError> {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            // Prefer stderr; fall back to stdout for children that report there.
            let diagnostics = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(PipelineError::StageProcessFailure {
                status: output.status.to_string(),
                diagnostics,
            });
        }

        if stdout.trim().is_empty() {
            return Err(PipelineError::MalformedOutput {
                stage: Stage::Scouting,
                detail: "scouting process exited cleanly but printed nothing".to_string(),
                raw: stderr.into_owned(),
            });
        }

        let payload_lines = stdout.lines().filter(|l| !l.trim().is_empty()).count();
        if payload_lines > 1 {
            warn!("Scouting process printed {payload_lines} lines; expected exactly one");
        }

        let value =
            extract(&stdout, Shape::Array).map_err(|e| PipelineError::malformed(Stage::Scouting, e))?;

        let mut listings: Vec<ListingRecord> =
            serde_json::from_value(value).map_err(|e| PipelineError::MalformedOutput {
                stage: Stage::Scouting,
                detail: format!("listing records are invalid: {e}"),
                raw: stdout.to_string(),
            })?;

        if listings.is_empty() {
            return Err(PipelineError::NoResultsFound {
                query: query.to_string(),
            });
        }

        if listings.len() > self.max_results {
            warn!(
                "Scouting returned {} listings; keeping the first {}",
                listings.len(),
                self.max_results
            );
            listings.truncate(self.max_results);
        }

        Ok(listings)
    }
}

#[async_trait]
impl ListingScout for ScoutRunner {
    async fn scout(&self, query: &str) -> Result<Vec<ListingRecord>, PipelineError> {
        let keyword = normalize_query(query);
        info!(
            "Scouting \"{keyword}\" (query \"{query}\", up to {} listings)",
            self.max_results
        );

        let output = self.run_child(&keyword).await?;
        let listings = self.interpret(query, output)?;

        info!("Scouting found {} listings", listings.len());
        Ok(listings)
    }
}
