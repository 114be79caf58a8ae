use std::collections::BTreeMap;

use crate::error::DrawError;
use crate::types::{Pixel, GRID_SIZE};

/// Square grid of optional pixels.
///
/// Only painted cells are stored. Cells are keyed by `(y, x)` so iteration is
/// row-major, and a stored pixel is always found under its own coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    size: u16,
    cells: BTreeMap<(u16, u16), Pixel>,
}

impl PixelGrid {
    pub fn new() -> Self {
        Self::with_size(GRID_SIZE)
    }

    pub fn with_size(size: u16) -> Self {
        Self {
            size,
            cells: BTreeMap::new(),
        }
    }

    pub fn size(&self) -> u16 {
        self.size
    }

    /// Converts signed client coordinates into grid indices.
    pub fn index(&self, x: i64, y: i64) -> Result<(u16, u16), DrawError> {
        let size = i64::from(self.size);
        if (0..size).contains(&x) && (0..size).contains(&y) {
            Ok((x as u16, y as u16))
        } else {
            Err(DrawError::OutOfBounds { x, y })
        }
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Pixel> {
        self.cells.get(&(y, x))
    }

    /// Stores `pixel` at its own coordinates, returning the pixel it replaced.
    pub fn set(&mut self, pixel: Pixel) -> Result<Option<Pixel>, DrawError> {
        let (x, y) = self.index(i64::from(pixel.x), i64::from(pixel.y))?;
        Ok(self.cells.insert((y, x), pixel))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pixel> + '_ {
        self.cells.values()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Default for PixelGrid {
    fn default() -> Self {
        Self::new()
    }
}
