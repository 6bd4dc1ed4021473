use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::llm_client::LlmError;
use crate::pipeline::extractor::ExtractError;

/// The three pipeline stages, used to tag where a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Scouting,
    Ranking,
    Tailoring,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Scouting => "scouting",
            Stage::Ranking => "ranking",
            Stage::Tailoring => "tailoring",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every way a run can fail. All of them are fatal for the run.
///
/// `Display` is the user-facing reason. Raw capability text and child
/// diagnostics live in fields and are reachable through `diagnostics()`,
/// which is meant for operator logs only.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Candidate profile document is missing or empty")]
    MissingProfile {
        stage: Stage,
        path: PathBuf,
        reason: String,
    },

    #[error("Scouting process failed ({status})")]
    StageProcessFailure { status: String, diagnostics: String },

    #[error("The {stage} stage returned malformed output: {detail}")]
    MalformedOutput {
        stage: Stage,
        detail: String,
        raw: String,
    },

    #[error("No listings found for \"{query}\"")]
    NoResultsFound { query: String },

    #[error("Ranking failed: {reason}")]
    RankingFailed { reason: String, raw: Option<String> },

    #[error("The {stage} stage could not reach the judgment service")]
    Judgment {
        stage: Stage,
        #[source]
        source: LlmError,
    },

    #[error("The {stage} stage timed out after {after_secs}s")]
    StageTimeout { stage: Stage, after_secs: u64 },
}

impl PipelineError {
    pub fn malformed(stage: Stage, err: ExtractError) -> Self {
        PipelineError::MalformedOutput {
            stage,
            detail: err.to_string(),
            raw: err.raw().to_string(),
        }
    }

    /// The stage the failure originated in.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::MissingProfile { stage, .. }
            | PipelineError::MalformedOutput { stage, .. }
            | PipelineError::Judgment { stage, .. }
            | PipelineError::StageTimeout { stage, .. } => *stage,
            PipelineError::StageProcessFailure { .. } | PipelineError::NoResultsFound { .. } => {
                Stage::Scouting
            }
            PipelineError::RankingFailed { .. } => Stage::Ranking,
        }
    }

    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::MissingProfile { .. } => "MISSING_PROFILE",
            PipelineError::StageProcessFailure { .. } => "STAGE_PROCESS_FAILURE",
            PipelineError::MalformedOutput { .. } => "MALFORMED_OUTPUT",
            PipelineError::NoResultsFound { .. } => "NO_RESULTS_FOUND",
            PipelineError::RankingFailed { .. } => "RANKING_FAILED",
            PipelineError::Judgment { .. } => "JUDGMENT_UNAVAILABLE",
            PipelineError::StageTimeout { .. } => "STAGE_TIMEOUT",
        }
    }

    /// Raw context for operator logs. Never shown to end users.
    pub fn diagnostics(&self) -> Option<String> {
        match self {
            PipelineError::MissingProfile { path, reason, .. } => {
                Some(format!("{}: {reason}", path.display()))
            }
            PipelineError::StageProcessFailure { diagnostics, .. } => Some(diagnostics.clone()),
            PipelineError::MalformedOutput { raw, .. } => Some(raw.clone()),
            PipelineError::RankingFailed { raw, .. } => raw.clone(),
            PipelineError::Judgment { source, .. } => Some(source.to_string()),
            PipelineError::NoResultsFound { .. } | PipelineError::StageTimeout { .. } => None,
        }
    }
}
