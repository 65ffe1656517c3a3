//! Five-stage sprite generation pipeline
//!
//! `generate` runs describe and structure concurrently, then colour, then
//! rasterizes a single frame. `animate` runs motion and then animate, and
//! renders three frames. Only the structure stage can fail a request; every
//! later stage degrades to a deterministic fallback.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use vivraster::{
    animate, decode_shapes, distinct_roles, rasterize, static_frames, summarize_shapes, Frame,
    OffsetMap, Palette, Shape, ANIMATION_FRAMES, DEFAULT_PRIMARY_COLOUR,
};

use crate::caller::ModelCaller;
use crate::config::SpriteConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::prompts;

/// Roles used for colouring when the structure reply names none
pub const DEFAULT_ROLES: &[&str] = &["outline", "body", "accent"];

/// `model` reported for a subject planned as static
pub const STATIC_MODEL: &str = "static";

/// `model` reported when the animate stage failed
pub const STATIC_FALLBACK_MODEL: &str = "static-fallback";

/// Subject used when an animation request has no name
pub const DEFAULT_SUBJECT: &str = "creature";

const DESCRIBE_TOKENS: u32 = 512;
const COLOUR_TOKENS: u32 = 512;
const MOTION_TOKENS: u32 = 256;
const ANIMATE_TOKENS: u32 = 512;

/// Output of [`SpritePipeline::generate`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSprite {
    /// Rasterized static frame
    pub frame: Frame,
    /// Colours for the roles the shapes use
    pub palette: Palette,
    /// Shapes in painting order
    pub shapes: Vec<Shape>,
    /// Part list from the describe stage, or the prompt itself
    pub description: String,
    /// Dominant colour of the subject
    pub primary_colour: String,
    /// Model that produced the shapes
    pub model: String,
}

/// Input of [`SpritePipeline::animate`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnimationRequest {
    /// Palette returned by `generate`
    #[serde(default)]
    pub palette: Option<Palette>,

    /// Shapes returned by `generate`; malformed entries are dropped
    #[serde(default, deserialize_with = "vivraster::deserialize_shapes")]
    pub shapes: Vec<Shape>,

    /// Description returned by `generate`
    #[serde(default)]
    pub description: Option<String>,

    /// Subject name
    #[serde(default)]
    pub name: Option<String>,
}

/// Output of [`SpritePipeline::animate`]
#[derive(Debug, Clone, Serialize)]
pub struct AnimatedSprite {
    /// Animation frames, identical when the sprite is static
    pub frames: [Frame; ANIMATION_FRAMES],
    /// Model that produced the offsets, or a static marker
    pub model: String,
}

/// Result of the motion stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MotionPlan {
    /// Nothing moves
    Static,
    /// `"part: verb"` entries
    Moving(Vec<String>),
}

/// Shapes and roles from the structure stage
#[derive(Debug, Clone)]
struct Structure {
    shapes: Vec<Shape>,
    declared_roles: Vec<String>,
    model: String,
}

/// Runs the generation stages against a [`ModelCaller`]
#[derive(Debug, Clone)]
pub struct SpritePipeline {
    caller: ModelCaller,
    config: SpriteConfig,
    structure_prompt: String,
}

impl SpritePipeline {
    /// Create a pipeline
    pub fn new(caller: ModelCaller, config: SpriteConfig) -> Self {
        let canvas = format!("{0}x{0}", config.canvas_size);
        let structure_prompt = prompts::STRUCTURE.replace("32x32", &canvas);
        Self {
            caller,
            config,
            structure_prompt,
        }
    }

    /// Pipeline limits
    pub fn config(&self) -> &SpriteConfig {
        &self.config
    }

    /// Turn a free-text prompt into a static sprite
    pub async fn generate(&self, prompt: &str) -> PipelineResult<GeneratedSprite> {
        let prompt = self.validate_prompt(prompt)?;

        info!("Describe + structure in parallel for \"{}\"", prompt);
        let (description, structure) = tokio::join!(self.describe(prompt), self.structure(prompt));

        let description = description.unwrap_or_else(|| prompt.to_string());
        let structure = structure?;

        let roles = role_list(&structure.shapes, &structure.declared_roles);
        let (palette, primary_colour) = self.colour(prompt, &roles).await;
        let frame = rasterize(&palette, &structure.shapes, self.config.canvas_size);

        Ok(GeneratedSprite {
            frame,
            palette,
            shapes: structure.shapes,
            description,
            primary_colour,
            model: structure.model,
        })
    }

    /// Render the idle animation of a previously generated sprite
    pub async fn animate(&self, request: &AnimationRequest) -> PipelineResult<AnimatedSprite> {
        let palette = request
            .palette
            .as_ref()
            .ok_or_else(|| PipelineError::InvalidSprite("missing palette".to_string()))?;
        if request.shapes.len() < self.config.min_shapes {
            return Err(PipelineError::InvalidSprite(format!(
                "{} shape(s), need at least {}",
                request.shapes.len(),
                self.config.min_shapes
            )));
        }

        let subject = non_empty(request.name.as_deref()).unwrap_or(DEFAULT_SUBJECT);
        let description = non_empty(request.description.as_deref()).unwrap_or(subject);
        let size = self.config.canvas_size;

        let motions = match self.motion(subject, description).await {
            MotionPlan::Static => {
                info!("Motion: \"{}\" is static, no animation", subject);
                return Ok(AnimatedSprite {
                    frames: static_frames(palette, &request.shapes, size),
                    model: STATIC_MODEL.to_string(),
                });
            }
            MotionPlan::Moving(motions) => motions,
        };

        match self.offsets(&motions, &request.shapes).await {
            Some((offsets, model)) => {
                info!("Animate: {} shape(s) move", offsets.len());
                Ok(AnimatedSprite {
                    frames: animate(palette, &request.shapes, &offsets, size),
                    model,
                })
            }
            None => {
                warn!("Animate stage failed, returning static frames");
                Ok(AnimatedSprite {
                    frames: static_frames(palette, &request.shapes, size),
                    model: STATIC_FALLBACK_MODEL.to_string(),
                })
            }
        }
    }

    fn validate_prompt<'a>(&self, prompt: &'a str) -> PipelineResult<&'a str> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(PipelineError::InvalidPrompt("prompt is empty".to_string()));
        }
        let chars = prompt.chars().count();
        if chars > self.config.max_prompt_chars {
            return Err(PipelineError::InvalidPrompt(format!(
                "prompt is {} characters, limit is {}",
                chars, self.config.max_prompt_chars
            )));
        }
        Ok(prompt)
    }

    async fn describe(&self, prompt: &str) -> Option<String> {
        let reply = self
            .caller
            .call(prompts::DESCRIBE, &format!("Describe: {prompt}"), None, Some(DESCRIBE_TOKENS))
            .await;
        match reply {
            Ok(reply) => {
                let description = parse_description(&reply.value);
                if description.is_none() {
                    warn!("Describe: reply had no parts, using the prompt");
                }
                description
            }
            Err(e) => {
                warn!("Describe stage failed, using the prompt: {}", e);
                None
            }
        }
    }

    async fn structure(&self, prompt: &str) -> PipelineResult<Structure> {
        let preferred = Some(self.caller.config().structure_model.as_str()).filter(|m| !m.is_empty());
        let reply = self
            .caller
            .call(&self.structure_prompt, &format!("Subject: {prompt}"), preferred, None)
            .await
            .map_err(PipelineError::StructureUnavailable)?;

        let (shapes, declared_roles) = parse_structure(&reply.value);
        if shapes.len() < self.config.min_shapes {
            warn!("Structure: {} returned {} usable shape(s)", reply.model, shapes.len());
            return Err(PipelineError::TooFewShapes {
                found: shapes.len(),
                minimum: self.config.min_shapes,
            });
        }

        info!("Structure: {} shapes from {}", shapes.len(), reply.model);
        Ok(Structure {
            shapes,
            declared_roles,
            model: reply.model,
        })
    }

    async fn colour(&self, subject: &str, roles: &[String]) -> (Palette, String) {
        info!("Colour: {} role(s)", roles.len());
        let message = format!("Subject: {subject}\nRoles: {}", roles.join(", "));
        let reply = self
            .caller
            .call(prompts::COLOUR, &message, None, Some(COLOUR_TOKENS))
            .await;

        match reply.ok().and_then(|r| parse_palette(&r.value, roles)) {
            Some(chosen) => chosen,
            None => {
                warn!("Colour stage failed, using fallback palette");
                (Palette::fallback(roles), DEFAULT_PRIMARY_COLOUR.to_string())
            }
        }
    }

    async fn motion(&self, subject: &str, description: &str) -> MotionPlan {
        info!("Motion plan for \"{}\"", subject);
        let message = format!("Subject: {subject}\nDescription:\n{description}");
        match self
            .caller
            .call(prompts::MOTION, &message, None, Some(MOTION_TOKENS))
            .await
        {
            Ok(reply) => parse_motion(&reply.value),
            Err(e) => {
                warn!("Motion stage failed, treating as static: {}", e);
                MotionPlan::Static
            }
        }
    }

    async fn offsets(&self, motions: &[String], shapes: &[Shape]) -> Option<(OffsetMap, String)> {
        info!("Animate: {} moving part(s)", motions.len());
        let message = format!(
            "Motion plan:\n{}\n\nShapes:\n{}",
            motions.join("\n"),
            summarize_shapes(shapes)
        );
        let reply = self
            .caller
            .call(prompts::ANIMATE, &message, None, Some(ANIMATE_TOKENS))
            .await
            .ok()?;
        let offsets = parse_offsets(&reply.value, shapes.len())?;
        Some((offsets, reply.model))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Parts from a describe reply, one per line
pub fn parse_description(value: &Value) -> Option<String> {
    let parts = string_list(&value["parts"]);
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// Shapes and declared roles from a structure reply
pub fn parse_structure(value: &Value) -> (Vec<Shape>, Vec<String>) {
    (decode_shapes(&value["shapes"]), string_list(&value["roles"]))
}

/// Roles the colour stage is asked about: those the shapes use, else the
/// declared ones, else [`DEFAULT_ROLES`]
pub fn role_list(shapes: &[Shape], declared: &[String]) -> Vec<String> {
    let used = distinct_roles(shapes);
    if !used.is_empty() {
        return used;
    }
    if !declared.is_empty() {
        return declared.to_vec();
    }
    DEFAULT_ROLES.iter().map(|s| s.to_string()).collect()
}

/// Palette and primary colour from a colour reply, covering exactly `roles`
pub fn parse_palette(value: &Value, roles: &[String]) -> Option<(Palette, String)> {
    let colours = value["colors"].as_object()?;
    let palette: Palette = colours
        .iter()
        .filter_map(|(role, colour)| Some((role.clone(), colour.as_str()?.to_string())))
        .collect();

    let primary = value["primaryColour"]
        .as_str()
        .or_else(|| value["primaryColor"].as_str())
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_PRIMARY_COLOUR)
        .to_string();

    Some((palette.restricted_to(roles), primary))
}

/// Motion plan from a motion reply; no motions or any `static` entry means static
pub fn parse_motion(value: &Value) -> MotionPlan {
    let motions = string_list(&value["motions"]);
    if motions.is_empty() || motions.iter().any(|m| m.to_lowercase().contains("static")) {
        MotionPlan::Static
    } else {
        MotionPlan::Moving(motions)
    }
}

/// Offsets from an animate reply; `None` unless `animated` is an array
pub fn parse_offsets(value: &Value, shape_count: usize) -> Option<OffsetMap> {
    let animated = &value["animated"];
    if !animated.is_array() {
        return None;
    }
    Some(OffsetMap::decode(animated, shape_count))
}
