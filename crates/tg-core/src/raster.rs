//! Character-cell raster produced by diagram renderers.

use std::fmt;

/// A fixed-size grid of character cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    cells: Vec<char>,
    width: usize,
    height: usize,
}

impl RasterImage {
    /// Create a blank raster.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![' '; width.saturating_mul(height)],
            width,
            height,
        }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<char> {
        self.index(x, y).map(|index| self.cells[index])
    }

    /// Set one cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, ch: char) {
        if let Some(index) = self.index(x, y) {
            self.cells[index] = ch;
        }
    }

    /// Write `text` left to right starting at `(x, y)`.
    pub fn set_str(&mut self, x: usize, y: usize, text: &str) {
        for (offset, ch) in text.chars().enumerate() {
            self.set(x + offset, y, ch);
        }
    }

    /// Rows with trailing blanks removed.
    #[must_use]
    pub fn rows(&self) -> Vec<String> {
        if self.width == 0 {
            return vec![String::new(); self.height];
        }
        self.cells
            .chunks(self.width)
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect()
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|ch| *ch == ' ')
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }
}

impl fmt::Display for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (y, row) in self.rows().iter().enumerate() {
            if y > 0 {
                writeln!(f)?;
            }
            f.write_str(row)?;
        }
        Ok(())
    }
}
