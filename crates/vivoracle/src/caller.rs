//! Chat-completion caller with a model fallback queue
//!
//! One call walks `[override, ...fallback_models]` up to `max_attempts`
//! times. A rate limit, a non-2xx status or a reply without parsable JSON
//! moves on to the next model; a timeout ends the whole call at once.

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::InferenceConfig;
use crate::error::CallError;
use crate::extract::parse_first_object;

/// Parsed reply and the model that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    /// First JSON object found in the completion text
    pub value: Value,

    /// Model identifier that answered
    pub model: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Result of a single request to a single model
enum Attempt {
    Parsed(Value),
    Rejected,
    TimedOut,
}

/// Issues chat-completion requests on behalf of the pipeline stages
#[derive(Debug, Clone)]
pub struct ModelCaller {
    client: reqwest::Client,
    config: InferenceConfig,
}

impl ModelCaller {
    /// Create a caller
    pub fn new(config: InferenceConfig) -> Result<Self, CallError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }

    /// Settings in use
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Models tried, in order, for a call with the given override
    pub fn model_list(&self, model_override: Option<&str>) -> Vec<String> {
        model_override
            .map(str::to_string)
            .into_iter()
            .chain(self.config.fallback_models.iter().cloned())
            .collect()
    }

    /// Send `system` + `user` and return the first parsable JSON object
    pub async fn call(
        &self,
        system: &str,
        user: &str,
        model_override: Option<&str>,
        max_tokens: Option<u32>,
    ) -> Result<ModelReply, CallError> {
        let models = self.model_list(model_override);
        let max_tokens = max_tokens.unwrap_or(self.config.max_tokens);
        let attempts = self.config.max_attempts.max(1);

        for attempt in 0..attempts {
            if attempt > 0 {
                info!("Retrying after backoff (attempt {})", attempt + 1);
                tokio::time::sleep(Duration::from_millis(self.config.backoff_ms)).await;
            }

            for model in &models {
                match self.attempt(model, system, user, max_tokens).await {
                    Attempt::Parsed(value) => {
                        return Ok(ModelReply {
                            value,
                            model: model.clone(),
                        })
                    }
                    Attempt::Rejected => continue,
                    Attempt::TimedOut => {
                        warn!("Model {}: request timed out, abandoning call", model);
                        return Err(CallError::TimedOut {
                            model: model.clone(),
                            timeout_ms: self.config.timeout_ms,
                        });
                    }
                }
            }
        }

        Err(CallError::Exhausted {
            attempts,
            models: models.len(),
        })
    }

    async fn attempt(&self, model: &str, system: &str, user: &str, max_tokens: u32) -> Attempt {
        let body = ChatRequest {
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            model,
            temperature: self.config.temperature,
            max_tokens,
        };

        let deadline = Duration::from_millis(self.config.timeout_ms);
        match tokio::time::timeout(deadline, self.request_text(&body)).await {
            Err(_) => Attempt::TimedOut,
            Ok(Err(e)) => {
                warn!("Model {} error: {}", model, e);
                Attempt::Rejected
            }
            Ok(Ok((status, text))) => Self::interpret(model, status, &text),
        }
    }

    async fn request_text(&self, body: &ChatRequest<'_>) -> Result<(StatusCode, String), reqwest::Error> {
        let response = self
            .client
            .post(self.config.completions_url())
            .header(AUTHORIZATION, format!("Bearer {}", self.config.token))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }

    fn interpret(model: &str, status: StatusCode, text: &str) -> Attempt {
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Model {} rate limited (429), trying next model. {}", model, preview(text, 120));
            return Attempt::Rejected;
        }
        if !status.is_success() {
            warn!("Model {} returned {}: {}", model, status.as_u16(), preview(text, 300));
            return Attempt::Rejected;
        }

        let content = match serde_json::from_str::<ChatResponse>(text) {
            Ok(response) => response
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default(),
            Err(e) => {
                warn!("Model {}: undecodable completion body: {}", model, e);
                return Attempt::Rejected;
            }
        };
        info!("Model {}: got {} chars of content", model, content.len());

        match parse_first_object(&content) {
            Some(value) => Attempt::Parsed(value),
            None => {
                warn!("Model {}: no JSON in response. Raw start: {}", model, preview(&content, 200));
                Attempt::Rejected
            }
        }
    }
}

fn preview(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
