//! vivoracle - Sprite Generation
//!
//! Chat-completion model caller with fallback queue, timeouts and retries,
//! and the five-stage pipeline (describe → structure → colour → motion →
//! animate) that turns a prompt into a rasterized sprite.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Chat-completion caller
pub mod caller;

/// Inference and pipeline settings
pub mod config;

/// Error types
pub mod error;

/// JSON extraction from completion text
pub mod extract;

/// Generation pipeline
pub mod pipeline;

/// Stage system prompts
pub mod prompts;

pub use caller::{ModelCaller, ModelReply};
pub use config::{InferenceConfig, SpriteConfig};
pub use error::{CallError, PipelineError, PipelineResult};
pub use extract::{first_json_object, parse_first_object};
pub use pipeline::{AnimatedSprite, AnimationRequest, GeneratedSprite, MotionPlan, SpritePipeline};
