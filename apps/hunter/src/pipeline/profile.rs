use std::path::PathBuf;

use tracing::debug;

use crate::pipeline::error::{PipelineError, Stage};

/// The candidate profile document (a resume in markdown or plain text).
///
/// Read fresh on every `load`; nothing is cached between stages or runs.
#[derive(Debug, Clone)]
pub struct ProfileDocument {
    path: PathBuf,
}

impl ProfileDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the whole document for `stage`. An unreadable or blank document
    /// is `MissingProfile`.
    pub async fn load(&self, stage: Stage) -> Result<String, PipelineError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| PipelineError::MissingProfile {
                stage,
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        if text.trim().is_empty() {
            return Err(PipelineError::MissingProfile {
                stage,
                path: self.path.clone(),
                reason: "document is empty".to_string(),
            });
        }

        debug!("Loaded profile for {stage} ({} bytes)", text.len());
        Ok(text)
    }
}
