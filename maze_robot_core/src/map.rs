use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::{Color, Point};

/// Errors produced while parsing a text maze.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("Map string is empty")]
    Empty,
    #[error("Map has zero width")]
    ZeroWidth,
    #[error("Scale must be at least 1")]
    ZeroScale,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    InconsistentWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Unknown map character '{symbol}' at position ({x}, {y})")]
    UnknownSymbol { symbol: char, x: usize, y: usize },
    #[error("Multiple start positions ('S') found")]
    MultipleStarts,
    #[error("Map of {width}x{height} characters at scale {scale} is too large")]
    TooLarge {
        width: usize,
        height: usize,
        scale: usize,
    },
}

/// A generic 2D grid structure.
///
/// Stores elements of type `T` in a flat vector using row-major order.
/// Provides methods for accessing and modifying elements via (x, y) coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

/// A maze bitmap.
pub type Raster = Grid<Color>;

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default values.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Self
    where
        T: Default + Clone,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        Grid {
            width,
            height,
            cells: vec![T::default(); size],
        }
    }

    /// Creates a new grid with the specified dimensions, filled by a generator function.
    ///
    /// The generator function `f` takes `(x, y)` coordinates and returns the value for that cell.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn from_generator<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        let mut cells = Vec::with_capacity(size);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Grid {
            width,
            height,
            cells,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Converts (x, y) coordinates to a flat vector index.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    #[inline]
    pub fn coords_to_index(&self, x: usize, y: usize) -> Option<usize> {
        if self.is_valid(x, y) {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Checks if the given coordinates are within the grid boundaries.
    #[inline]
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Sets every cell of the rectangle starting at `(x, y)` with the given size.
    /// Cells falling outside the grid are skipped.
    pub fn fill_rect(&mut self, x: usize, y: usize, width: usize, height: usize, value: T)
    where
        T: Clone,
    {
        for row in y..y.saturating_add(height).min(self.height) {
            for col in x..x.saturating_add(width).min(self.width) {
                let index = row * self.width + col;
                self.cells[index] = value.clone();
            }
        }
    }
}

/// Allows indexing the grid using `(usize, usize)` coordinates for immutable access.
impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: (usize, usize)) -> &Self::Output {
        let (x, y) = index;
        match self.coords_to_index(x, y) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                x, y, self.width, self.height
            ),
        }
    }
}

/// Allows indexing the grid using `(usize, usize)` coordinates for mutable access.
impl<T> IndexMut<(usize, usize)> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        let (x, y) = index;
        let width = self.width;
        let height = self.height;
        match self.coords_to_index(x, y) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                x, y, width, height
            ),
        }
    }
}

/// Read-only access to maze pixels.
///
/// `color_at` is only ever called with `0 <= px < width` and `0 <= py < height`;
/// callers reject anything outside that range themselves.
pub trait PixelSource {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn color_at(&self, px: u32, py: u32) -> Color;
}

impl PixelSource for Raster {
    fn width(&self) -> f64 {
        self.width as f64
    }

    fn height(&self) -> f64 {
        self.height as f64
    }

    fn color_at(&self, px: u32, py: u32) -> Color {
        self[(px as usize, py as usize)]
    }
}

impl<T: PixelSource + ?Sized> PixelSource for &T {
    fn width(&self) -> f64 {
        (**self).width()
    }

    fn height(&self) -> f64 {
        (**self).height()
    }

    fn color_at(&self, px: u32, py: u32) -> Color {
        (**self).color_at(px, py)
    }
}

/// Parses a text maze into a raster.
///
/// `#` is a wall, `.` is path and `S` is a path cell marking where the robot
/// starts. Every character becomes a `scale` x `scale` block of pixels.
/// Returns the raster and, if an `S` was present, the top-left pixel of its block.
pub fn load_raster_from_string(
    map_string: &str,
    scale: usize,
) -> Result<(Raster, Option<Point>), MapError> {
    if scale == 0 {
        return Err(MapError::ZeroScale);
    }
    let lines: Vec<&str> = map_string.trim().lines().map(str::trim).collect();
    if lines.is_empty() {
        return Err(MapError::Empty);
    }

    let width = lines[0].chars().count();
    if width == 0 {
        return Err(MapError::ZeroWidth);
    }
    let height = lines.len();
    let (pixel_width, pixel_height) = width
        .checked_mul(scale)
        .zip(height.checked_mul(scale))
        .filter(|(w, h)| w.checked_mul(*h).is_some())
        .ok_or(MapError::TooLarge {
            width,
            height,
            scale,
        })?;

    let mut walls = Grid::<bool>::new(width, height);
    let mut start = None;

    for (y, line) in lines.iter().enumerate() {
        let found = line.chars().count();
        if found != width {
            return Err(MapError::InconsistentWidth {
                row: y,
                expected: width,
                found,
            });
        }
        for (x, symbol) in line.chars().enumerate() {
            match symbol {
                '#' => walls[(x, y)] = true,
                '.' => {}
                'S' => {
                    if start.is_some() {
                        return Err(MapError::MultipleStarts);
                    }
                    start = Some(Point::new((x * scale) as f64, (y * scale) as f64));
                }
                symbol => return Err(MapError::UnknownSymbol { symbol, x, y }),
            }
        }
    }

    let raster = Grid::from_generator(pixel_width, pixel_height, |x, y| {
        if walls[(x / scale, y / scale)] {
            Color::BLACK
        } else {
            Color::WHITE
        }
    });

    Ok((raster, start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_map_row_major() {
        let grid = Grid::<u8>::new(3, 2);
        assert_eq!(grid.coords_to_index(2, 1), Some(5));
        assert_eq!(grid.coords_to_index(3, 0), None);
        assert!(grid.is_valid(0, 1));
        assert!(!grid.is_valid(0, 2));
    }

    #[test]
    fn fill_rect_clips_to_grid() {
        let mut grid = Grid::<u8>::new(4, 4);
        grid.fill_rect(2, 2, 5, 5, 1);
        assert_eq!(grid[(3, 3)], 1);
        assert_eq!(grid[(2, 2)], 1);
        assert_eq!(grid[(1, 3)], 0);
    }

    #[test]
    fn loader_scales_symbols_into_pixels() {
        let (raster, start) = load_raster_from_string("#S#\n#.#\n", 2).unwrap();

        assert_eq!(raster.width(), 6);
        assert_eq!(raster.height(), 4);
        assert_eq!(start, Some(Point::new(2.0, 0.0)));
        assert_eq!(raster[(0, 0)], Color::BLACK);
        assert_eq!(raster[(2, 0)], Color::WHITE);
        assert_eq!(raster[(3, 3)], Color::WHITE);
        assert_eq!(raster[(5, 3)], Color::BLACK);
        assert_eq!(raster.color_at(3, 1), Color::WHITE);
    }

    #[test]
    fn loader_reports_malformed_maps() {
        assert_eq!(load_raster_from_string("", 1), Err(MapError::Empty));
        assert_eq!(load_raster_from_string("#.", 0), Err(MapError::ZeroScale));
        assert_eq!(
            load_raster_from_string("##\n#", 1),
            Err(MapError::InconsistentWidth {
                row: 1,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            load_raster_from_string("#x", 1),
            Err(MapError::UnknownSymbol {
                symbol: 'x',
                x: 1,
                y: 0
            })
        );
        assert_eq!(
            load_raster_from_string("SS", 1),
            Err(MapError::MultipleStarts)
        );
    }

    #[test]
    fn oversized_maps_are_rejected() {
        assert_eq!(
            load_raster_from_string("S.\n..", usize::MAX / 2),
            Err(MapError::TooLarge {
                width: 2,
                height: 2,
                scale: usize::MAX / 2
            })
        );
        assert!(matches!(
            load_raster_from_string("S..", usize::MAX),
            Err(MapError::TooLarge { .. })
        ));
    }

    #[test]
    fn fill_rect_saturates_at_the_edge() {
        let mut grid = Grid::<u8>::new(2, 2);
        grid.fill_rect(1, 1, usize::MAX, usize::MAX, 3);
        assert_eq!(grid[(1, 1)], 3);
        assert_eq!(grid[(0, 0)], 0);
    }

    #[test]
    fn maps_without_start_marker_load() {
        let (raster, start) = load_raster_from_string("..\n..", 1).unwrap();
        assert_eq!(start, None);
        assert_eq!(PixelSource::width(&raster), 2.0);
    }
}
