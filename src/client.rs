//! Generation-service client
//!
//! The service is an OpenAI-style chat-completions endpoint reached over
//! HTTPS. The client is an explicit value passed into the orchestrator, not
//! a process-wide handle, and the [`Generate`] trait is the seam tests script
//! against.

use crate::util::truncate;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default endpoint (OpenRouter-compatible; any chat-completions URL works).
pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Rate limit retry configuration
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_SECS: u64 = 2;
const BACKOFF_MULTIPLIER: u64 = 2;

/// One generation call: system instruction + user prompt in, raw text out.
pub trait Generate {
    fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

/// HTTP client for the generation service.
pub struct GenerationClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GenerationClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Generate for GenerationClient {
    /// Call the service once, with automatic backoff on rate limits. Any
    /// other failure (network, timeout, bad payload) comes back as an error
    /// for the caller to absorb as a failed call; never retried here.
    async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            max_tokens,
            stream: false,
        };

        let mut retry_count = 0;
        loop {
            let response = self
                .http
                .post(&self.endpoint)
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            let text = response.text().await?;

            if status.is_success() {
                let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
                    anyhow!("Failed to parse service response: {}\n{}", e, truncate(&text, 500))
                })?;
                let content = parsed
                    .choices
                    .first()
                    .map(|c| c.message.content.clone())
                    .unwrap_or_default();
                if content.is_empty() {
                    return Err(anyhow!("Service returned an empty completion"));
                }
                return Ok(content);
            }

            if status.as_u16() == 429 && retry_count < MAX_RETRIES {
                retry_count += 1;
                let backoff =
                    INITIAL_BACKOFF_SECS * BACKOFF_MULTIPLIER.pow(retry_count - 1);
                eprintln!(
                    "  Rate limited. Retrying in {}s (attempt {}/{})",
                    backoff, retry_count, MAX_RETRIES
                );
                tokio::time::sleep(Duration::from_secs(backoff)).await;
                continue;
            }

            return Err(match status.as_u16() {
                401 => anyhow!("Invalid API key. Check OPENROUTER_API_KEY / OPENAI_API_KEY."),
                429 => anyhow!("Rate limited after {} retries. Try again later.", retry_count),
                500..=599 => anyhow!(
                    "Service error ({}). The endpoint may be temporarily unavailable.",
                    status
                ),
                _ => anyhow!("API error {}: {}", status, truncate(&text, 200)),
            });
        }
    }
}
