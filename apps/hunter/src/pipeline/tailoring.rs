//! Tailoring stage: builds the application package for the single best match.
//!
//! The judgment is told not to invent skills; that is its contract. This
//! stage only checks the package has every key and exactly the three
//! priority buckets.

use tracing::info;

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_FABRICATION_INSTRUCTION};
use crate::llm_client::JudgmentCapability;
use crate::models::{ListingRecord, TailoredPackage};
use crate::pipeline::error::{PipelineError, Stage};
use crate::pipeline::extractor::{extract, Shape};
use crate::pipeline::prompts::{fill, TAILORING_PROMPT_TEMPLATE, TAILORING_SYSTEM};

const TAILORING_TEMPERATURE: f32 = 0.3;

pub async fn tailor_application(
    judge: &dyn JudgmentCapability,
    listing: &ListingRecord,
    query: &str,
    profile: &str,
) -> Result<TailoredPackage, PipelineError> {
    let prompt = build_tailoring_prompt(listing, query, profile);
    let system = format!("{TAILORING_SYSTEM} {JSON_ONLY_SYSTEM}");

    let raw = judge
        .judge(&prompt, &system, TAILORING_TEMPERATURE)
        .await
        .map_err(|source| PipelineError::Judgment {
            stage: Stage::Tailoring,
            source,
        })?;

    let value =
        extract(&raw, Shape::Object).map_err(|e| PipelineError::malformed(Stage::Tailoring, e))?;

    let package: TailoredPackage =
        serde_json::from_value(value).map_err(|e| PipelineError::MalformedOutput {
            stage: Stage::Tailoring,
            detail: format!("tailored package is invalid: {e}"),
            raw: raw.clone(),
        })?;

    info!(
        "Tailored package for \"{}\" at {}: {} missing skills",
        listing.title,
        listing.company,
        package.skill_gap_analysis.missing_skills.len()
    );

    Ok(package)
}

fn build_tailoring_prompt(listing: &ListingRecord, query: &str, profile: &str) -> String {
    fill(
        TAILORING_PROMPT_TEMPLATE,
        &[
            ("no_fabrication", NO_FABRICATION_INSTRUCTION),
            ("user_query", query),
            ("job_title", listing.title.as_str()),
            ("company", listing.company.as_str()),
            ("job_description", listing.description.as_str()),
            ("resume_text", profile),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{listing, tailored_package_json, ScriptedJudge};

    #[tokio::test]
    async fn test_valid_package_is_returned() {
        let judge = ScriptedJudge::new("[]", tailored_package_json());
        let package = tailor_application(&judge, &listing("ML Intern"), "ML", "profile")
            .await
            .unwrap();

        assert_eq!(package.cold_email.subject, "Application: ML Intern");
        assert_eq!(package.skill_gap_analysis.priority_levels.high, vec!["Kubernetes"]);
        assert_eq!(package.skill_emphasis_suggestions, vec!["PyTorch"]);
    }

    #[tokio::test]
    async fn test_escaped_and_fenced_package_is_recovered() {
        let escaped = tailored_package_json().replace('"', "\\\"");
        let judge = ScriptedJudge::new("[]", format!("```json\n{escaped}\n```"));

        let package = tailor_application(&judge, &listing("ML Intern"), "ML", "profile")
            .await
            .unwrap();
        assert_eq!(package.tailored_summary, "Ships production ML systems.");
    }

    #[tokio::test]
    async fn test_prompt_names_company_and_description() {
        let judge = ScriptedJudge::new("[]", tailored_package_json());
        let job = listing("Backend Intern");

        tailor_application(&judge, &job, "backend", "Rust, Postgres")
            .await
            .unwrap();

        let prompt = &judge.prompts()[0];
        assert!(prompt.contains(&job.company));
        assert!(prompt.contains(&job.description));
        assert!(prompt.contains("Rust, Postgres"));
        assert!(prompt.contains("DO NOT invent skills"));
    }

    #[tokio::test]
    async fn test_scraped_description_cannot_pull_in_other_fields() {
        let judge = ScriptedJudge::new("[]", tailored_package_json());
        let mut job = listing("Backend Intern");
        job.description = "Apply now {resume_text} {company}".to_string();

        tailor_application(&judge, &job, "backend", "PRIVATE PROFILE")
            .await
            .unwrap();

        let prompt = &judge.prompts()[0];
        assert!(prompt.contains("Apply now {resume_text} {company}"));
        assert_eq!(prompt.matches("PRIVATE PROFILE").count(), 1);
    }

    #[tokio::test]
    async fn test_missing_key_is_malformed_output() {
        let mut value: serde_json::Value = serde_json::from_str(&tailored_package_json()).unwrap();
        value.as_object_mut().unwrap().remove("tailored_summary");
        let judge = ScriptedJudge::new("[]", value.to_string());

        let err = tailor_application(&judge, &listing("ML Intern"), "ML", "profile")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MalformedOutput {
                stage: Stage::Tailoring,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unexpected_priority_bucket_is_malformed_output() {
        let mut value: serde_json::Value = serde_json::from_str(&tailored_package_json()).unwrap();
        value["skill_gap_analysis"]["priority_levels"]["critical"] = serde_json::json!(["CUDA"]);
        let judge = ScriptedJudge::new("[]", value.to_string());

        let err = tailor_application(&judge, &listing("ML Intern"), "ML", "profile")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "MALFORMED_OUTPUT");
    }

    #[tokio::test]
    async fn test_undecodable_output_is_malformed_output() {
        let judge = ScriptedJudge::new("[]", "Sorry, I cannot help with that.");
        let err = tailor_application(&judge, &listing("ML Intern"), "ML", "profile")
            .await
            .unwrap_err();
        assert_eq!(
            err.diagnostics().as_deref(),
            Some("Sorry, I cannot help with that.")
        );
    }
}
