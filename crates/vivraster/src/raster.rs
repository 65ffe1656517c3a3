//! Painter's-algorithm rasterizer
//!
//! Shapes are painted in list order onto an empty grid, and a later shape
//! overwrites any cell an earlier one already coloured. That is how an
//! `outline` shape painted first ends up as a border once a slightly
//! smaller `body` covers its interior.

use std::ops::RangeInclusive;
use tracing::debug;

use crate::frame::Frame;
use crate::palette::Palette;
use crate::shape::{Geometry, Point, Shape};

/// Default canvas edge length
pub const DEFAULT_CANVAS_SIZE: usize = 32;

/// Smallest radius used in the ellipse distance test
const MIN_RADIUS: f64 = 0.5;

/// Barycentric slack so edge cells are not lost to rounding
const TRIANGLE_EPSILON: f64 = -0.01;

/// Triangles with a smaller doubled area are treated as degenerate
const DEGENERATE_AREA: f64 = 0.001;

/// Lines with an endpoint beyond this magnitude are skipped
const LINE_COORD_LIMIT: f64 = 65_536.0;

/// Rasterize `shapes` onto a `size`×`size` frame
///
/// Shapes whose colour cannot be resolved from `palette` are skipped.
pub fn rasterize(palette: &Palette, shapes: &[Shape], size: usize) -> Frame {
    let mut frame = Frame::new(size);

    for shape in shapes {
        let Some(colour) = palette.resolve(shape) else {
            debug!("Skipping {} with role '{}': no colour", shape.kind(), shape.role);
            continue;
        };

        match &shape.geometry {
            Geometry::Rect { x, y, w, h } => paint_rect(&mut frame, *x, *y, *w, *h, colour),
            Geometry::Ellipse { cx, cy, rx, ry } => {
                paint_ellipse(&mut frame, *cx, *cy, *rx, *ry, colour)
            }
            Geometry::Triangle { points } => paint_triangle(&mut frame, points, colour),
            Geometry::Line { x1, y1, x2, y2 } => paint_line(&mut frame, *x1, *y1, *x2, *y2, colour),
            Geometry::Pixels { coords } => {
                for [x, y] in coords {
                    frame.paint(*x, *y, colour);
                }
            }
        }
    }

    frame
}

/// Offsets `0..extent` along one axis that can land on the grid when added to `origin`
fn visible_steps(origin: f64, extent: f64, size: usize) -> std::ops::Range<i64> {
    if !origin.is_finite() || !extent.is_finite() {
        return 0..0;
    }
    // Bounds stay in f64 until clamped to `[0, extent]`, so the casts cannot overflow
    let extent = extent.max(0.0).ceil();
    let start = ((-origin).floor() - 1.0).clamp(0.0, extent) as i64;
    let end = ((size as f64 - origin).ceil() + 1.0).clamp(0.0, extent) as i64;
    start..end.max(start)
}

/// Integer cells in `[lo, hi]` clipped to the grid
fn clipped(lo: f64, hi: f64, size: usize) -> RangeInclusive<i64> {
    let lo = lo.floor().max(0.0) as i64;
    let hi = hi.ceil().min(size as f64 - 1.0) as i64;
    lo..=hi
}

fn paint_rect(frame: &mut Frame, x: f64, y: f64, w: f64, h: f64, colour: &str) {
    let size = frame.size();
    for dy in visible_steps(y, h, size) {
        for dx in visible_steps(x, w, size) {
            frame.paint(x + dx as f64, y + dy as f64, colour);
        }
    }
}

fn paint_ellipse(frame: &mut Frame, cx: f64, cy: f64, rx: f64, ry: f64, colour: &str) {
    let size = frame.size();
    let safe_rx = rx.max(MIN_RADIUS);
    let safe_ry = ry.max(MIN_RADIUS);

    for py in clipped(cy - ry, cy + ry, size) {
        for px in clipped(cx - rx, cx + rx, size) {
            let ndx = (px as f64 - cx) / safe_rx;
            let ndy = (py as f64 - cy) / safe_ry;
            if ndx * ndx + ndy * ndy <= 1.0 {
                frame.paint(px as f64, py as f64, colour);
            }
        }
    }
}

/// Integer Bresenham between rounded endpoints
fn paint_line(frame: &mut Frame, x1: f64, y1: f64, x2: f64, y2: f64, colour: &str) {
    if [x1, y1, x2, y2]
        .iter()
        .any(|v| !v.is_finite() || v.abs() > LINE_COORD_LIMIT)
    {
        debug!("Skipping line with out-of-range endpoints");
        return;
    }

    let (mut x, mut y) = (x1.round() as i64, y1.round() as i64);
    let (x2, y2) = (x2.round() as i64, y2.round() as i64);
    let adx = (x2 - x).abs();
    let ady = (y2 - y).abs();
    let sx = if x < x2 { 1 } else { -1 };
    let sy = if y < y2 { 1 } else { -1 };
    let mut err = adx - ady;

    for _ in 0..=(adx + ady) {
        frame.paint(x as f64, y as f64, colour);
        if x == x2 && y == y2 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -ady {
            err -= ady;
            x += sx;
        }
        if e2 < adx {
            err += adx;
            y += sy;
        }
    }
}

/// Bounding-box scan with a barycentric membership test
fn paint_triangle(frame: &mut Frame, points: &[Point; 3], colour: &str) {
    let [p0, p1, p2] = points;
    let d = (p1[1] - p2[1]) * (p0[0] - p2[0]) + (p2[0] - p1[0]) * (p0[1] - p2[1]);
    if !d.is_finite() || d.abs() < DEGENERATE_AREA {
        return;
    }

    let size = frame.size();
    let min_x = p0[0].min(p1[0]).min(p2[0]);
    let max_x = p0[0].max(p1[0]).max(p2[0]);
    let min_y = p0[1].min(p1[1]).min(p2[1]);
    let max_y = p0[1].max(p1[1]).max(p2[1]);

    for py in clipped(min_y, max_y, size) {
        for px in clipped(min_x, max_x, size) {
            let (fx, fy) = (px as f64, py as f64);
            let a = ((p1[1] - p2[1]) * (fx - p2[0]) + (p2[0] - p1[0]) * (fy - p2[1])) / d;
            let b = ((p2[1] - p0[1]) * (fx - p2[0]) + (p0[0] - p2[0]) * (fy - p2[1])) / d;
            let c = 1.0 - a - b;
            if a >= TRIANGLE_EPSILON && b >= TRIANGLE_EPSILON && c >= TRIANGLE_EPSILON {
                frame.paint(fx, fy, colour);
            }
        }
    }
}
