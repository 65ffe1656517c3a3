//! Geometric shape primitives produced by the structure stage

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt::Write as _;
use tracing::debug;

/// A canvas coordinate pair `[x, y]`; (0,0) is top-left, X right, Y down
pub type Point = [f64; 2];

/// Geometry of a single primitive, tagged by `"type"` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    /// Axis-aligned rectangle covering `w`×`h` cells from `(x, y)`
    Rect {
        /// Left edge
        x: f64,
        /// Top edge
        y: f64,
        /// Width in cells
        w: f64,
        /// Height in cells
        h: f64,
    },

    /// Filled ellipse centred on `(cx, cy)`
    Ellipse {
        /// Centre X
        cx: f64,
        /// Centre Y
        cy: f64,
        /// Horizontal radius
        rx: f64,
        /// Vertical radius
        ry: f64,
    },

    /// Filled triangle
    Triangle {
        /// The three vertices
        points: [Point; 3],
    },

    /// One-pixel-wide line between two endpoints
    Line {
        /// Start X
        x1: f64,
        /// Start Y
        y1: f64,
        /// End X
        x2: f64,
        /// End Y
        y2: f64,
    },

    /// Explicit list of cells
    Pixels {
        /// Cells to paint
        coords: Vec<Point>,
    },
}

/// A primitive plus the semantic role used for colour lookup and motion matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Geometry, flattened so the wire form is `{"type":"rect","x":..,"role":..}`
    #[serde(flatten)]
    pub geometry: Geometry,

    /// Semantic label such as `outline` or `eye_white`
    #[serde(default, deserialize_with = "nullable_string")]
    pub role: String,

    /// Literal colour or palette key used when the role has no palette entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Shape {
    /// Create a shape with a role and no literal colour
    pub fn new(geometry: Geometry, role: impl Into<String>) -> Self {
        Self {
            geometry,
            role: role.into(),
            color: None,
        }
    }

    /// Short name of the geometry variant
    pub fn kind(&self) -> &'static str {
        match self.geometry {
            Geometry::Rect { .. } => "rect",
            Geometry::Ellipse { .. } => "ellipse",
            Geometry::Triangle { .. } => "triangle",
            Geometry::Line { .. } => "line",
            Geometry::Pixels { .. } => "pixels",
        }
    }

    /// Return a copy moved by `(dx, dy)`; `self` is left untouched
    ///
    /// Rectangles move their origin, ellipses their centre, and triangles,
    /// lines and pixel lists move every coordinate.
    #[must_use]
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let shift = |p: &Point| [p[0] + dx, p[1] + dy];
        let geometry = match &self.geometry {
            Geometry::Rect { x, y, w, h } => Geometry::Rect {
                x: x + dx,
                y: y + dy,
                w: *w,
                h: *h,
            },
            Geometry::Ellipse { cx, cy, rx, ry } => Geometry::Ellipse {
                cx: cx + dx,
                cy: cy + dy,
                rx: *rx,
                ry: *ry,
            },
            Geometry::Triangle { points } => Geometry::Triangle {
                points: [shift(&points[0]), shift(&points[1]), shift(&points[2])],
            },
            Geometry::Line { x1, y1, x2, y2 } => Geometry::Line {
                x1: x1 + dx,
                y1: y1 + dy,
                x2: x2 + dx,
                y2: y2 + dy,
            },
            Geometry::Pixels { coords } => Geometry::Pixels {
                coords: coords.iter().map(shift).collect(),
            },
        };

        Self {
            geometry,
            role: self.role.clone(),
            color: self.color.clone(),
        }
    }

    /// One-line description used as model input, e.g. `[3] rect (1,2) 4×5 role=body`
    pub fn summary(&self, index: usize) -> String {
        match &self.geometry {
            Geometry::Rect { x, y, w, h } => {
                format!("[{index}] rect ({x},{y}) {w}×{h} role={}", self.role)
            }
            Geometry::Ellipse { cx, cy, rx, ry } => {
                format!("[{index}] ellipse ({cx},{cy}) r={rx}×{ry} role={}", self.role)
            }
            Geometry::Triangle { points } => {
                format!("[{index}] triangle {} role={}", format_points(points), self.role)
            }
            Geometry::Line { x1, y1, x2, y2 } => {
                format!("[{index}] line ({x1},{y1})→({x2},{y2}) role={}", self.role)
            }
            Geometry::Pixels { coords } => {
                format!("[{index}] pixels ×{} role={}", coords.len(), self.role)
            }
        }
    }
}

fn format_points(points: &[Point]) -> String {
    let mut out = String::from("[");
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "[{},{}]", p[0], p[1]);
    }
    out.push(']');
    out
}

/// Decode a JSON array of shapes, dropping entries that do not describe a valid primitive
///
/// Anything other than an array decodes to an empty list.
pub fn decode_shapes(value: &Value) -> Vec<Shape> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match Shape::deserialize(item) {
            Ok(shape) => Some(shape),
            Err(e) => {
                debug!("Dropping shape {}: {}", index, e);
                None
            }
        })
        .collect()
}

/// `deserialize_with` adapter that decodes a shape array leniently, see [`decode_shapes`]
pub fn deserialize_shapes<'de, D>(deserializer: D) -> Result<Vec<Shape>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decode_shapes(&value))
}

/// Distinct roles in first-appearance order, skipping empty roles
pub fn distinct_roles(shapes: &[Shape]) -> Vec<String> {
    let mut roles: Vec<String> = Vec::new();
    for shape in shapes {
        if !shape.role.is_empty() && !roles.iter().any(|r| r == &shape.role) {
            roles.push(shape.role.clone());
        }
    }
    roles
}

/// Multi-line summary of a whole shape list, one [`Shape::summary`] per line
pub fn summarize_shapes(shapes: &[Shape]) -> String {
    shapes
        .iter()
        .enumerate()
        .map(|(i, s)| s.summary(i))
        .collect::<Vec<_>>()
        .join("\n")
}
