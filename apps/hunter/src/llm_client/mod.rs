/// LLM Client: the judgment capability behind the ranking and tailoring stages.
///
/// Stages never talk to the Anthropic API directly. They receive a
/// `&dyn JudgmentCapability`, which `LlmClient` implements and tests fake.
///
/// Model: claude-sonnet-4-5 (hardcoded so ranking stays reproducible across deploys)
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for every judgment call.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Opaque judgment service: takes a prompt, returns free text that was asked
/// to be structured but is not guaranteed to be.
#[async_trait]
pub trait JudgmentCapability: Send + Sync {
    async fn judge(&self, prompt: &str, system: &str, temperature: f32)
        -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Anthropic Messages API client.
///
/// `max_attempts` defaults to 1 (no retry). Raising it retries 429 and 5xx
/// responses and transport errors with exponential backoff.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_url: String,
    api_key: String,
    max_attempts: u32,
}

/// Outcome of one failed request: whether another attempt may help.
enum AttemptError {
    Retryable(LlmError),
    Fatal(LlmError),
}

impl LlmClient {
    pub fn new(api_key: String, max_attempts: u32) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            api_url: ANTHROPIC_API_URL.to_string(),
            api_key,
            max_attempts: max_attempts.max(1),
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[cfg(test)]
    fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    pub async fn call(
        &self,
        prompt: &str,
        system: &str,
        temperature: f32,
    ) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut attempt = 1;
        loop {
            match self.send_once(&request_body).await {
                Ok(response) => return Ok(response),
                Err(AttemptError::Retryable(err)) if attempt < self.max_attempts => {
                    // Exponential backoff: 1s, 2s, 4s
                    let delay =
                        std::time::Duration::from_millis(1000 * (1 << (attempt - 1).min(4)));
                    warn!(
                        "LLM call attempt {attempt} failed ({err}), retrying after {}ms...",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(AttemptError::Retryable(err) | AttemptError::Fatal(err)) => return Err(err),
            }
        }
    }

    async fn send_once(&self, body: &AnthropicRequest<'_>) -> Result<LlmResponse, AttemptError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| AttemptError::Retryable(LlmError::Http(e)))?;

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            return Err(AttemptError::Retryable(LlmError::Api {
                status: status.as_u16(),
                message: body,
            }));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AttemptError::Fatal(LlmError::Api {
                status: status.as_u16(),
                message,
            }));
        }

        let llm_response: LlmResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::Fatal(LlmError::Http(e)))?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }
}

#[async_trait]
impl JudgmentCapability for LlmClient {
    async fn judge(
        &self,
        prompt: &str,
        system: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let response = self.call(prompt, system, temperature).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        if text.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(text.to_string())
    }
}
