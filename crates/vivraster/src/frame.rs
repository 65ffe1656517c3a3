//! Square grid of optional colours

use serde::ser::{Serialize, SerializeSeq, Serializer};

/// A `size`×`size` grid where each cell is a colour or empty
///
/// Serializes as an array of rows, each an array of colour strings or `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    size: usize,
    cells: Vec<Option<String>>,
}

impl Frame {
    /// Create an empty frame
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// Edge length in cells
    pub fn size(&self) -> usize {
        self.size
    }

    /// Colour at `(x, y)`, or `None` when empty or out of bounds
    pub fn get(&self, x: usize, y: usize) -> Option<&str> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.cells[y * self.size + x].as_deref()
    }

    /// Paint the cell containing `(x, y)`; coordinates off the grid are ignored
    pub fn paint(&mut self, x: f64, y: f64, colour: &str) {
        let (fx, fy) = (x.floor(), y.floor());
        let limit = self.size as f64;
        if !(fx >= 0.0 && fx < limit && fy >= 0.0 && fy < limit) {
            return;
        }
        let index = fy as usize * self.size + fx as usize;
        self.cells[index] = Some(colour.to_string());
    }

    /// Rows from top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Option<String>]> {
        // chunks(0) panics, and an empty frame has no rows anyway
        self.cells.chunks(self.size.max(1)).take(self.size)
    }

    /// Number of non-empty cells
    pub fn painted_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

impl Serialize for Frame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.size))?;
        for row in self.rows() {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}
