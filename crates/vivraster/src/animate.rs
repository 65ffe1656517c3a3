//! Animation delta engine
//!
//! Turns a sparse map of per-shape offsets into translated copies of the
//! shape list, one per frame, and re-rasterizes each copy.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::frame::Frame;
use crate::palette::Palette;
use crate::raster::rasterize;
use crate::shape::Shape;

/// Frames in an animated sprite
pub const ANIMATION_FRAMES: usize = 3;

/// Per-frame translation `[dx, dy]`
pub type Offset = [f64; 2];

/// Offsets for one shape as returned by the animate stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDelta {
    /// Position of the shape in the shape list
    pub index: usize,

    /// One offset per frame
    pub offsets: Vec<Offset>,
}

/// Sparse shape-index → offsets mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffsetMap {
    offsets: BTreeMap<usize, Vec<Offset>>,
}

impl OffsetMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the offsets of the shape at `index`, replacing earlier ones
    pub fn insert(&mut self, index: usize, offsets: Vec<Offset>) {
        self.offsets.insert(index, offsets);
    }

    /// Decode an `animated` array, dropping malformed entries and indices
    /// that do not refer to one of `shape_count` shapes
    pub fn decode(value: &Value, shape_count: usize) -> Self {
        let mut map = Self::new();
        let Some(items) = value.as_array() else {
            return map;
        };

        for item in items {
            match ShapeDelta::deserialize(item) {
                Ok(delta) if delta.index < shape_count => map.insert(delta.index, delta.offsets),
                Ok(delta) => debug!("Dropping delta for missing shape {}", delta.index),
                Err(e) => debug!("Dropping malformed delta: {}", e),
            }
        }
        map
    }

    /// Offset of shape `index` in frame `frame`, if it moves in that frame
    pub fn get(&self, index: usize, frame: usize) -> Option<Offset> {
        self.offsets.get(&index)?.get(frame).copied()
    }

    /// Number of shapes with offsets
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// True when no shape moves
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

impl FromIterator<ShapeDelta> for OffsetMap {
    fn from_iter<I: IntoIterator<Item = ShapeDelta>>(iter: I) -> Self {
        let mut map = Self::new();
        for delta in iter {
            map.insert(delta.index, delta.offsets);
        }
        map
    }
}

/// The shape list as it appears in `frame`
///
/// Shapes without an offset for that frame are cloned unchanged, so static
/// parts never drift.
pub fn shifted_shapes(shapes: &[Shape], offsets: &OffsetMap, frame: usize) -> Vec<Shape> {
    shapes
        .iter()
        .enumerate()
        .map(|(i, shape)| match offsets.get(i, frame) {
            Some([dx, dy]) => shape.translated(dx, dy),
            None => shape.clone(),
        })
        .collect()
}

/// Render every animation frame
pub fn animate(
    palette: &Palette,
    shapes: &[Shape],
    offsets: &OffsetMap,
    size: usize,
) -> [Frame; ANIMATION_FRAMES] {
    std::array::from_fn(|frame| rasterize(palette, &shifted_shapes(shapes, offsets, frame), size))
}

/// Three copies of the static rasterization
pub fn static_frames(palette: &Palette, shapes: &[Shape], size: usize) -> [Frame; ANIMATION_FRAMES] {
    let base = rasterize(palette, shapes, size);
    std::array::from_fn(|_| base.clone())
}
