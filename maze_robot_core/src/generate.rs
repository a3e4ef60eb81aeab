//! Seeded maze bitmaps for headless runs.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Color, Point,
    map::{Grid, Raster},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    #[error("Maze needs at least one column and one row, got {columns}x{rows}")]
    Empty { columns: usize, rows: usize },
    #[error("Corridors and walls must be at least one pixel wide")]
    ZeroThickness,
    #[error("Maze of {columns}x{rows} cells does not fit in memory")]
    TooLarge { columns: usize, rows: usize },
}

/// Shape of a generated maze. Sizes are in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub columns: usize,
    pub rows: usize,
    pub corridor: usize,
    /// Keep this at least as large as the robot, otherwise the corner check
    /// lets the robot straddle walls.
    pub wall: usize,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            columns: 8,
            rows: 6,
            corridor: 30,
            wall: 20,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedMaze {
    pub raster: Raster,
    /// Top-left pixel of the entrance, where the robot should be placed.
    pub start: Point,
}

/// Builds a perfect maze with a recursive backtracker.
///
/// The entrance is cut into the top border above the first cell and the exit
/// into the left border beside the bottom-left cell.
pub fn generate_maze(config: &GeneratorConfig) -> Result<GeneratedMaze, GenerateError> {
    let GeneratorConfig {
        columns,
        rows,
        corridor,
        wall,
        seed,
    } = *config;
    if columns == 0 || rows == 0 {
        return Err(GenerateError::Empty { columns, rows });
    }
    if corridor == 0 || wall == 0 {
        return Err(GenerateError::ZeroThickness);
    }

    let dimensions = corridor
        .checked_add(wall)
        .and_then(|pitch| {
            let span = |cells: usize| cells.checked_mul(pitch)?.checked_add(wall);
            Some((pitch, span(columns)?, span(rows)?))
        })
        .filter(|&(_, width, height)| width.checked_mul(height).is_some());
    let Some((pitch, width, height)) = dimensions else {
        return Err(GenerateError::TooLarge { columns, rows });
    };
    let origin = |(c, r): (usize, usize)| (wall + c * pitch, wall + r * pitch);

    let mut raster = Grid::from_generator(width, height, |_, _| Color::BLACK);
    let carve_cell = |raster: &mut Raster, cell| {
        let (x, y) = origin(cell);
        raster.fill_rect(x, y, corridor, corridor, Color::WHITE);
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let mut visited = Grid::<bool>::new(columns, rows);
    let mut stack = vec![(0, 0)];
    visited[(0, 0)] = true;
    carve_cell(&mut raster, (0, 0));

    while let Some(&(c, r)) = stack.last() {
        let mut candidates = Vec::with_capacity(4);
        if r > 0 {
            candidates.push((c, r - 1));
        }
        if c + 1 < columns {
            candidates.push((c + 1, r));
        }
        if r + 1 < rows {
            candidates.push((c, r + 1));
        }
        if c > 0 {
            candidates.push((c - 1, r));
        }
        candidates.retain(|&cell| !visited[cell]);

        if candidates.is_empty() {
            stack.pop();
            continue;
        }

        let next = candidates[rng.random_range(0..candidates.len())];
        visited[next] = true;
        carve_cell(&mut raster, next);

        // knock out the wall between the two cells
        let (x, y) = origin((c.min(next.0), r.min(next.1)));
        if next.1 == r {
            raster.fill_rect(x + corridor, y, wall, corridor, Color::WHITE);
        } else {
            raster.fill_rect(x, y + corridor, corridor, wall, Color::WHITE);
        }
        stack.push(next);
    }

    raster.fill_rect(wall, 0, corridor, wall, Color::WHITE);
    let (_, exit_y) = origin((0, rows - 1));
    raster.fill_rect(0, exit_y, wall, corridor, Color::WHITE);

    Ok(GeneratedMaze {
        raster,
        start: Point::new(wall as f64, 0.0),
    })
}
