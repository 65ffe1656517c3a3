//! Inference and sprite-pipeline settings

use serde::{Deserialize, Serialize};

/// Default chat-completion API base
pub const DEFAULT_API_BASE: &str = "https://models.github.ai/inference";

/// Default fallback queue
pub const DEFAULT_FALLBACK_MODELS: &[&str] = &["openai/gpt-4o-mini"];

/// Default preferred model for the structure stage
pub const DEFAULT_STRUCTURE_MODEL: &str = "openai/gpt-4o";

/// Default per-attempt deadline in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 28_000;

/// Default number of passes over the model list
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Default pause between passes in milliseconds
pub const DEFAULT_BACKOFF_MS: u64 = 3_000;

/// Default completion budget
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Chat-completion endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Base URL; `/chat/completions` is appended
    pub api_base: String,

    /// Bearer token
    #[serde(skip_serializing)]
    pub token: String,

    /// Models tried in order after any override
    pub fallback_models: Vec<String>,

    /// Preferred model for the structure stage
    pub structure_model: String,

    /// Per-attempt wall-clock deadline in milliseconds
    pub timeout_ms: u64,

    /// Passes over the model list
    pub max_attempts: u32,

    /// Pause between passes in milliseconds
    pub backoff_ms: u64,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion budget when a stage does not set its own
    pub max_tokens: u32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: String::new(),
            fallback_models: DEFAULT_FALLBACK_MODELS.iter().map(|s| s.to_string()).collect(),
            structure_model: DEFAULT_STRUCTURE_MODEL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_ms: DEFAULT_BACKOFF_MS,
            temperature: 0.4,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl InferenceConfig {
    /// Full chat-completions URL
    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api_base.is_empty() {
            return Err("Inference API base cannot be empty".to_string());
        }
        if self.fallback_models.is_empty() {
            return Err("Fallback model queue cannot be empty".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("Inference timeout must be greater than zero".to_string());
        }
        if self.max_attempts == 0 {
            return Err("Inference attempts must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Sprite pipeline limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteConfig {
    /// Canvas edge length in cells
    pub canvas_size: usize,

    /// Longest accepted prompt in characters
    pub max_prompt_chars: usize,

    /// Fewest shapes a structure reply may contain
    pub min_shapes: usize,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            canvas_size: vivraster::DEFAULT_CANVAS_SIZE,
            max_prompt_chars: 100,
            min_shapes: 3,
        }
    }
}

impl SpriteConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.canvas_size == 0 || self.canvas_size > 256 {
            return Err(format!("Canvas size must be 1..=256, got {}", self.canvas_size));
        }
        if self.max_prompt_chars == 0 {
            return Err("Prompt limit must be greater than zero".to_string());
        }
        Ok(())
    }
}
