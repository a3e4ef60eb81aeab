//! Entrance and exit discovery along the maze border.

use serde::{Deserialize, Serialize};

use crate::{Color, Point, map::PixelSource};

/// How matching border pixels are turned into a start and an exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderPolicy {
    /// The first two matching pixels in scan order.
    #[default]
    FirstPixels,
    /// The first pixel of each of the first two contiguous openings.
    FirstOpenings,
}

/// The entrance and exit found on the border. Either may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Border {
    pub start: Option<Point>,
    pub exit: Option<Point>,
}

impl Border {
    fn record(&mut self, point: Point) -> bool {
        match self.start {
            None => self.start = Some(point),
            // corners are scanned twice
            Some(start) if start == point => {}
            Some(_) => {
                self.exit = Some(point);
                return true;
            }
        }
        false
    }
}

/// Yields the border lines in scan order: top row, bottom row, left column,
/// right column. Each line is a list of pixel coordinates.
fn border_lines(width: u32, height: u32) -> [Vec<(u32, u32)>; 4] {
    let bottom = height - 1;
    let right = width - 1;
    [
        (0..width).map(|x| (x, 0)).collect(),
        (0..width).map(|x| (x, bottom)).collect(),
        (0..height).map(|y| (0, y)).collect(),
        (0..height).map(|y| (right, y)).collect(),
    ]
}

/// Splits one border line into runs of consecutive matching pixels, each
/// given as its first and last pixel.
fn runs(line: &[(u32, u32)], matches: impl Fn((u32, u32)) -> bool) -> Vec<[(u32, u32); 2]> {
    let mut runs: Vec<[(u32, u32); 2]> = Vec::new();
    let mut inside = false;
    for &pixel in line {
        if !matches(pixel) {
            inside = false;
            continue;
        }
        match runs.last_mut() {
            Some(run) if inside => run[1] = pixel,
            _ => runs.push([pixel, pixel]),
        }
        inside = true;
    }
    runs
}

/// Scans the border of `pixels` for pixels matching `path_color`.
pub fn find_entrance_and_exit<P: PixelSource + ?Sized>(
    pixels: &P,
    path_color: Color,
    policy: BorderPolicy,
) -> Border {
    let mut border = Border::default();
    let width = pixels.width() as u32;
    let height = pixels.height() as u32;
    if width == 0 || height == 0 {
        return border;
    }

    let matches = |(x, y): (u32, u32)| pixels.color_at(x, y) == path_color;
    let is_corner = |(x, y): (u32, u32)| (x == 0 || x == width - 1) && (y == 0 || y == height - 1);
    // corners covered by openings on lines already scanned
    let mut open_corners: Vec<(u32, u32)> = Vec::new();

    for line in border_lines(width, height) {
        match policy {
            BorderPolicy::FirstPixels => {
                for &(x, y) in line.iter().filter(|&&pixel| matches(pixel)) {
                    if border.record(Point::new(x as f64, y as f64)) {
                        return border;
                    }
                }
            }
            BorderPolicy::FirstOpenings => {
                for [first, last] in runs(&line, matches) {
                    let corners: Vec<_> =
                        [first, last].into_iter().filter(|&p| is_corner(p)).collect();
                    // a gap wrapping around a corner was counted on an earlier line
                    let continues = corners.iter().any(|c| open_corners.contains(c));
                    open_corners.extend(corners);
                    if !continues && border.record(Point::new(first.0 as f64, first.1 as f64)) {
                        return border;
                    }
                }
            }
        }
    }

    border
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Grid, Raster};

    fn walled(width: usize, height: usize, openings: &[(usize, usize)]) -> Raster {
        let mut raster = Grid::from_generator(width, height, |_, _| Color::BLACK);
        for &(x, y) in openings {
            raster[(x, y)] = Color::WHITE;
        }
        raster
    }

    #[test]
    fn top_row_is_scanned_before_left_column() {
        let raster = walled(6, 6, &[(0, 3), (4, 0)]);
        let border = find_entrance_and_exit(&raster, Color::WHITE, BorderPolicy::FirstPixels);

        assert_eq!(border.start, Some(Point::new(4.0, 0.0)));
        assert_eq!(border.exit, Some(Point::new(0.0, 3.0)));
    }

    #[test]
    fn bottom_row_is_scanned_before_columns() {
        let raster = walled(6, 6, &[(5, 2), (1, 5), (0, 1)]);
        let border = find_entrance_and_exit(&raster, Color::WHITE, BorderPolicy::FirstPixels);

        assert_eq!(border.start, Some(Point::new(1.0, 5.0)));
        assert_eq!(border.exit, Some(Point::new(0.0, 1.0)));
    }

    #[test]
    fn matches_beyond_the_second_are_ignored() {
        let raster = walled(6, 6, &[(1, 0), (2, 0), (3, 0), (0, 2)]);
        let border = find_entrance_and_exit(&raster, Color::WHITE, BorderPolicy::FirstPixels);

        assert_eq!(border.start, Some(Point::new(1.0, 0.0)));
        assert_eq!(border.exit, Some(Point::new(2.0, 0.0)));
    }

    #[test]
    fn single_match_leaves_exit_unset() {
        let raster = walled(5, 5, &[(2, 4)]);
        let border = find_entrance_and_exit(&raster, Color::WHITE, BorderPolicy::FirstPixels);

        assert_eq!(border.start, Some(Point::new(2.0, 4.0)));
        assert_eq!(border.exit, None);
    }

    #[test]
    fn corner_pixel_is_recorded_once() {
        let raster = walled(5, 5, &[(0, 0)]);
        let border = find_entrance_and_exit(&raster, Color::WHITE, BorderPolicy::FirstPixels);

        assert_eq!(border.start, Some(Point::new(0.0, 0.0)));
        assert_eq!(border.exit, None);
    }

    #[test]
    fn openings_collapse_contiguous_runs() {
        let raster = walled(8, 8, &[(2, 0), (3, 0), (4, 0), (0, 5), (0, 6)]);

        let pixels = find_entrance_and_exit(&raster, Color::WHITE, BorderPolicy::FirstPixels);
        assert_eq!(pixels.exit, Some(Point::new(3.0, 0.0)));

        let openings = find_entrance_and_exit(&raster, Color::WHITE, BorderPolicy::FirstOpenings);
        assert_eq!(openings.start, Some(Point::new(2.0, 0.0)));
        assert_eq!(openings.exit, Some(Point::new(0.0, 5.0)));
    }

    #[test]
    fn opening_wrapping_a_corner_counts_once() {
        let mut openings: Vec<(usize, usize)> = (56..60).map(|x| (x, 0)).collect();
        openings.extend((1..3).map(|y| (59, y)));
        openings.extend((40..45).map(|y| (59, y)));
        let raster = walled(60, 60, &openings);

        let border = find_entrance_and_exit(&raster, Color::WHITE, BorderPolicy::FirstOpenings);
        assert_eq!(border.start, Some(Point::new(56.0, 0.0)));
        assert_eq!(border.exit, Some(Point::new(59.0, 40.0)));
    }

    #[test]
    fn opening_ending_on_an_earlier_corner_counts_once() {
        // gap runs up the left column into the bottom-left corner, which the
        // bottom row scan reaches first
        let mut openings: Vec<(usize, usize)> = (0..3).map(|x| (x, 9)).collect();
        openings.extend((6..9).map(|y| (0, y)));
        openings.push((9, 4));
        let raster = walled(10, 10, &openings);

        let border = find_entrance_and_exit(&raster, Color::WHITE, BorderPolicy::FirstOpenings);
        assert_eq!(border.start, Some(Point::new(0.0, 9.0)));
        assert_eq!(border.exit, Some(Point::new(9.0, 4.0)));
    }

    #[test]
    fn empty_raster_has_no_border() {
        let raster: Raster = Grid::new(0, 0);
        let border = find_entrance_and_exit(&raster, Color::WHITE, BorderPolicy::FirstPixels);
        assert_eq!(border, Border::default());
    }
}
