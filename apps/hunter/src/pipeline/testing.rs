//! Fakes shared by the pipeline unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm_client::{JudgmentCapability, LlmError};
use crate::models::ListingRecord;
use crate::pipeline::error::PipelineError;
use crate::pipeline::prompts::RANKING_SYSTEM;
use crate::pipeline::scout::ListingScout;

pub fn listing(title: &str) -> ListingRecord {
    ListingRecord {
        title: title.to_string(),
        company: format!("{title} Labs"),
        description: format!("Join us as {title}. Python and PyTorch required."),
        source_url: format!("https://jobs.example/{title}"),
    }
}

pub fn tailored_package_json() -> String {
    serde_json::json!({
        "skill_gap_analysis": {
            "missing_skills": ["Kubernetes", "Go"],
            "priority_levels": {
                "high": ["Kubernetes"],
                "medium": [],
                "low": ["Go"]
            },
            "learning_recommendations": ["Deploy a model server on a local cluster"]
        },
        "cold_email": {
            "subject": "Application: ML Intern",
            "body": "Dear hiring team, I built a retrieval pipeline in production."
        },
        "tailored_summary": "Ships production ML systems.",
        "skill_emphasis_suggestions": ["PyTorch"]
    })
    .to_string()
}

/// Answers ranking calls with one script and tailoring calls with another,
/// recording every prompt it receives.
pub struct ScriptedJudge {
    ranking: String,
    tailoring: String,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedJudge {
    pub fn new(ranking: impl Into<String>, tailoring: impl Into<String>) -> Self {
        Self {
            ranking: ranking.into(),
            tailoring: tailoring.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }

    pub fn tailoring_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(system, _)| !is_ranking(system))
            .count()
    }
}

fn is_ranking(system: &str) -> bool {
    system.starts_with(RANKING_SYSTEM)
}

#[async_trait]
impl JudgmentCapability for ScriptedJudge {
    async fn judge(
        &self,
        prompt: &str,
        system: &str,
        _temperature: f32,
    ) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));

        if is_ranking(system) {
            Ok(self.ranking.clone())
        } else {
            Ok(self.tailoring.clone())
        }
    }
}

/// Scouting stand-in that skips the child process.
pub enum FakeScout {
    Listings(Vec<ListingRecord>),
    ProcessFailure(String),
}

#[async_trait]
impl ListingScout for FakeScout {
    async fn scout(&self, query: &str) -> Result<Vec<ListingRecord>, PipelineError> {
        match self {
            FakeScout::Listings(listings) if listings.is_empty() => {
                Err(PipelineError::NoResultsFound {
                    query: query.to_string(),
                })
            }
            FakeScout::Listings(listings) => Ok(listings.clone()),
            FakeScout::ProcessFailure(diagnostics) => Err(PipelineError::StageProcessFailure {
                status: "exit status: 1".to_string(),
                diagnostics: diagnostics.clone(),
            }),
        }
    }
}
