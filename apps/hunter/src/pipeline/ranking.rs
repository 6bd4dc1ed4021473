//! Ranking stage: scores every scouted listing against the candidate profile.
//!
//! The judgment is asked to sort its answer, but its order is never trusted:
//! the records are re-sorted locally through `RankedListings`.

use tracing::{info, warn};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::JudgmentCapability;
use crate::models::{ListingRecord, RankedListingRecord, RankedListings, MAX_MATCH_SCORE};
use crate::pipeline::error::{PipelineError, Stage};
use crate::pipeline::extractor::{extract, Shape};
use crate::pipeline::prompts::{fill, RANKING_PROMPT_TEMPLATE, RANKING_SYSTEM};

const RANKING_TEMPERATURE: f32 = 0.2;

/// Scores `listings` for `query` against `profile` and returns them highest first.
pub async fn rank_listings(
    judge: &dyn JudgmentCapability,
    listings: &[ListingRecord],
    query: &str,
    profile: &str,
) -> Result<RankedListings, PipelineError> {
    if listings.is_empty() {
        return Err(PipelineError::RankingFailed {
            reason: "there are no listings to rank".to_string(),
            raw: None,
        });
    }

    let prompt = build_ranking_prompt(listings, query, profile)?;
    let system = format!("{RANKING_SYSTEM} {JSON_ONLY_SYSTEM}");

    let raw = judge
        .judge(&prompt, &system, RANKING_TEMPERATURE)
        .await
        .map_err(|source| PipelineError::Judgment {
            stage: Stage::Ranking,
            source,
        })?;

    let value = extract(&raw, Shape::Array).map_err(|e| PipelineError::malformed(Stage::Ranking, e))?;

    let records: Vec<RankedListingRecord> =
        serde_json::from_value(value).map_err(|e| PipelineError::RankingFailed {
            reason: format!("ranked records are invalid: {e}"),
            raw: Some(raw.clone()),
        })?;

    validate_ranked(&records, listings.len(), &raw)?;

    if !RankedListings::is_non_increasing(&records) {
        warn!("Judgment returned ranking out of order; re-sorting locally");
    }

    let ranked = RankedListings::from_unordered(records);
    info!(
        "Ranked {} listings (top score {})",
        ranked.as_slice().len(),
        ranked.as_slice()[0].match_score
    );

    Ok(ranked)
}

fn validate_ranked(
    records: &[RankedListingRecord],
    expected: usize,
    raw: &str,
) -> Result<(), PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::RankingFailed {
            reason: "judgment returned an empty ranking".to_string(),
            raw: Some(raw.to_string()),
        });
    }

    if let Some(record) = records.iter().find(|r| r.match_score > MAX_MATCH_SCORE) {
        return Err(PipelineError::RankingFailed {
            reason: format!(
                "match_score {} for \"{}\" is outside 0-{MAX_MATCH_SCORE}",
                record.match_score, record.listing.title
            ),
            raw: Some(raw.to_string()),
        });
    }

    if records.len() != expected {
        warn!(
            "Judgment ranked {} listings but {} were submitted",
            records.len(),
            expected
        );
    }

    Ok(())
}

fn build_ranking_prompt(
    listings: &[ListingRecord],
    query: &str,
    profile: &str,
) -> Result<String, PipelineError> {
    let jobs_json =
        serde_json::to_string_pretty(listings).map_err(|e| PipelineError::RankingFailed {
            reason: format!("failed to serialize listings: {e}"),
            raw: None,
        })?;

    Ok(fill(
        RANKING_PROMPT_TEMPLATE,
        &[
            ("user_query", query),
            ("resume_text", profile),
            ("jobs_json", jobs_json.as_str()),
        ],
    ))
}
