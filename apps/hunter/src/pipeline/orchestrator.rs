//! Pipeline orchestrator: one strictly sequential run per query.
//!
//! START → SCOUTING → RANKING → TAILORING → DONE, and any stage failure goes
//! straight to FAILED carrying that stage's error. No retries, no partial
//! results, no parallel work. Only the best match is tailored.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::llm_client::{JudgmentCapability, LlmClient};
use crate::models::{PipelineResult, RankedListingRecord, RankedListings};
use crate::pipeline::error::{PipelineError, Stage};
use crate::pipeline::profile::ProfileDocument;
use crate::pipeline::ranking::rank_listings;
use crate::pipeline::scout::{ListingScout, ScoutRunner};
use crate::pipeline::tailoring::tailor_application;

/// Runners-up reported next to the best match.
pub const MAX_ALTERNATIVES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Scouting,
    Ranking,
    Tailoring,
    Done,
    Failed,
}

impl PipelineState {
    fn advance(&mut self, next: PipelineState) {
        info!("Pipeline {:?} -> {:?}", self, next);
        *self = next;
    }
}

/// Everything a run needs, injected once and shared by concurrent runs.
#[derive(Clone)]
pub struct Pipeline {
    scout: Arc<dyn ListingScout>,
    judge: Arc<dyn JudgmentCapability>,
    profile: ProfileDocument,
    stage_timeout: Option<Duration>,
}

impl Pipeline {
    pub fn new(
        scout: Arc<dyn ListingScout>,
        judge: Arc<dyn JudgmentCapability>,
        profile: ProfileDocument,
    ) -> Self {
        Self {
            scout,
            judge,
            profile,
            stage_timeout: None,
        }
    }

    /// Bounds the ranking and tailoring stages. Scouting enforces its own
    /// limit on the child process.
    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Wires the production capabilities from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let scout_bin = match &config.scout_bin {
            Some(path) => path.clone(),
            None => ScoutRunner::sibling_binary()?,
        };
        let scout = ScoutRunner::new(scout_bin, config.scout_max_results)
            .with_timeout(config.stage_timeout);
        let judge = LlmClient::new(config.anthropic_api_key.clone(), config.llm_max_attempts)?;

        Ok(Self::new(
            Arc::new(scout),
            Arc::new(judge),
            ProfileDocument::new(&config.profile_path),
        )
        .with_stage_timeout(config.stage_timeout))
    }

    pub async fn run(&self, query: &str) -> Result<PipelineResult, PipelineError> {
        self.run_with_id(Uuid::new_v4(), query).await
    }

    /// Runs the pipeline under a caller-chosen id, which tags every log line.
    pub async fn run_with_id(
        &self,
        run_id: Uuid,
        query: &str,
    ) -> Result<PipelineResult, PipelineError> {
        let span = tracing::info_span!("pipeline_run", %run_id);

        async move {
            let mut state = PipelineState::Start;
            match self.execute(query, &mut state).await {
                Ok(result) => {
                    state.advance(PipelineState::Done);
                    Ok(result)
                }
                Err(err) => {
                    error!(
                        stage = %err.stage(),
                        code = err.code(),
                        diagnostics = err.diagnostics().as_deref().unwrap_or(""),
                        "Pipeline failed: {err}"
                    );
                    state.advance(PipelineState::Failed);
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        query: &str,
        state: &mut PipelineState,
    ) -> Result<PipelineResult, PipelineError> {
        state.advance(PipelineState::Scouting);
        let listings = self.scout.scout(query).await?;

        state.advance(PipelineState::Ranking);
        let profile = self.profile.load(Stage::Ranking).await?;
        let ranked = self
            .bounded(
                Stage::Ranking,
                rank_listings(self.judge.as_ref(), &listings, query, &profile),
            )
            .await?;
        let (best_match, alternatives) = select_candidates(ranked)?;
        info!(
            "Best match: \"{}\" at {} ({}), {} alternatives",
            best_match.listing.title,
            best_match.listing.company,
            best_match.match_score,
            alternatives.len()
        );

        state.advance(PipelineState::Tailoring);
        let profile = self.profile.load(Stage::Tailoring).await?;
        let tailored_package = self
            .bounded(
                Stage::Tailoring,
                tailor_application(self.judge.as_ref(), &best_match.listing, query, &profile),
            )
            .await?;

        Ok(PipelineResult {
            best_match,
            tailored_package,
            alternatives,
        })
    }

    async fn bounded<T>(
        &self,
        stage: Stage,
        work: impl Future<Output = Result<T, PipelineError>>,
    ) -> Result<T, PipelineError> {
        match self.stage_timeout {
            None => work.await,
            Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| {
                PipelineError::StageTimeout {
                    stage,
                    after_secs: limit.as_secs(),
                }
            })?,
        }
    }
}

/// Splits a ranking into the best match and up to `MAX_ALTERNATIVES`
/// runners-up. Duplicates of the best listing are skipped.
pub fn select_candidates(
    ranked: RankedListings,
) -> Result<(RankedListingRecord, Vec<RankedListingRecord>), PipelineError> {
    let mut records = ranked.into_inner().into_iter();

    let best = records.next().ok_or_else(|| PipelineError::RankingFailed {
        reason: "ranking produced no candidates".to_string(),
        raw: None,
    })?;

    let alternatives = records
        .filter(|record| record.listing != best.listing)
        .take(MAX_ALTERNATIVES)
        .collect();

    Ok((best, alternatives))
}
