//! vivraster - Sprite Rasterization
//!
//! Vector shape primitives, role palettes and the deterministic rasterizer
//! that turns them into square pixel frames, plus the delta engine that
//! derives animation frames from per-shape offsets.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Animation delta engine
pub mod animate;

/// Pixel grid output
pub mod frame;

/// Role → colour mapping
pub mod palette;

/// Primitive rasterization
pub mod raster;

/// Shape primitives
pub mod shape;

pub use animate::{animate, shifted_shapes, static_frames, Offset, OffsetMap, ShapeDelta, ANIMATION_FRAMES};
pub use frame::Frame;
pub use palette::{Palette, DEFAULT_PRIMARY_COLOUR, FALLBACK_HUES};
pub use raster::{rasterize, DEFAULT_CANVAS_SIZE};
pub use shape::{decode_shapes, deserialize_shapes, distinct_roles, summarize_shapes, Geometry, Point, Shape};
