/// Fetch capability: a hosted browser-automation agent driven over HTTP.
///
/// Only the `scout` binary talks to it. The server never does; it sees the
/// result through the child process protocol in `pipeline::scout`.
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{parse_or, require};
use crate::models::ListingRecord;
use crate::pipeline::extractor::{extract, Shape};
use crate::pipeline::prompts::fill;

pub mod prompts;

use prompts::SCOUT_TASK_TEMPLATE;

const DEFAULT_API_URL: &str = "https://api.browser-use.com/api/v1";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Browsing task {task_id} ended with status '{status}'")]
    TaskFailed { task_id: String, status: String },

    #[error("Browsing task {task_id} still running after {polls} polls")]
    PollsExhausted { task_id: String, polls: u32 },
}

/// Runs one natural-language browsing task and returns the agent's final
/// text. `None` means the agent finished without a final result.
#[async_trait]
pub trait ListingFetcher: Send + Sync {
    async fn run_task(&self, task: &str) -> Result<Option<String>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub api_key: String,
    pub api_url: String,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl FetchConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        Ok(FetchConfig {
            api_key: require(&lookup, "BROWSER_USE_API_KEY")?,
            api_url: lookup("BROWSER_USE_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            poll_interval: Duration::from_secs(parse_or(&lookup, "BROWSER_USE_POLL_SECS", 2)?),
            max_polls: parse_or(&lookup, "BROWSER_USE_MAX_POLLS", 300)?,
        })
    }
}

#[derive(Debug, Serialize)]
struct RunTaskRequest<'a> {
    task: &'a str,
}

#[derive(Debug, Deserialize)]
struct RunTaskResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TaskStatusResponse {
    status: String,
    #[serde(default)]
    output: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum TaskProgress {
    Pending,
    Finished(Option<String>),
    Failed(String),
}

impl TaskStatusResponse {
    fn progress(self) -> TaskProgress {
        match self.status.as_str() {
            "finished" => TaskProgress::Finished(self.output.filter(|o| !o.trim().is_empty())),
            "failed" | "stopped" => TaskProgress::Failed(self.status),
            _ => TaskProgress::Pending,
        }
    }
}

/// Client for the hosted browser-agent task API.
#[derive(Clone)]
pub struct BrowserTaskClient {
    client: Client,
    config: FetchConfig,
}

impl BrowserTaskClient {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self { client, config })
    }

    async fn create_task(&self, task: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .post(format!("{}/run-task", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .json(&RunTaskRequest { task })
            .send()
            .await?;

        let created: RunTaskResponse = check(response).await?.json().await?;
        Ok(created.id)
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatusResponse, FetchError> {
        let response = self
            .client
            .get(format!("{}/task/{task_id}", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(FetchError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ListingFetcher for BrowserTaskClient {
    async fn run_task(&self, task: &str) -> Result<Option<String>, FetchError> {
        let task_id = self.create_task(task).await?;
        info!("Browsing task {task_id} created");

        for poll in 1..=self.config.max_polls {
            tokio::time::sleep(self.config.poll_interval).await;

            let status = self.task_status(&task_id).await?;
            debug!("Browsing task {task_id} poll {poll}: {}", status.status);

            match status.progress() {
                TaskProgress::Pending => continue,
                TaskProgress::Finished(output) => return Ok(output),
                TaskProgress::Failed(status) => return Err(FetchError::TaskFailed { task_id, status }),
            }
        }

        Err(FetchError::PollsExhausted {
            task_id,
            polls: self.config.max_polls,
        })
    }
}

pub fn build_scout_task(keyword: &str, max_results: usize) -> String {
    fill(
        SCOUT_TASK_TEMPLATE,
        &[
            ("keyword", keyword),
            ("max_results", max_results.to_string().as_str()),
        ],
    )
}

/// Drives one scouting task for `keyword` and validates the listings it returns.
pub async fn scout_listings(
    fetcher: &dyn ListingFetcher,
    keyword: &str,
    max_results: usize,
) -> anyhow::Result<Vec<ListingRecord>> {
    let task = build_scout_task(keyword, max_results);

    let Some(raw) = fetcher.run_task(&task).await? else {
        bail!("Scout did not return final result.");
    };

    let value = match extract(&raw, Shape::Array) {
        Ok(value) => value,
        Err(err) => {
            warn!("Raw scout output: {raw}");
            return Err(anyhow::Error::new(err).context("Scout returned malformed JSON"));
        }
    };

    let mut listings: Vec<ListingRecord> =
        serde_json::from_value(value).context("Scout returned invalid listing records")?;

    if listings.len() > max_results {
        listings.truncate(max_results);
    }

    info!("Scout collected {} listings for \"{keyword}\"", listings.len());
    Ok(listings)
}
