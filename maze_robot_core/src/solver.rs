use std::collections::HashSet;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    Color, Point,
    border::{Border, BorderPolicy, find_entrance_and_exit},
    map::PixelSource,
    sink::PositionSink,
};

/// Grid pitch of the search, in pixels.
pub const STEP_SIZE: f64 = 10.0;
/// Side of the robot's square footprint, in pixels.
pub const ROBOT_SIZE: f64 = 20.0;
/// Default tick period of the driving clock, in milliseconds.
pub const SOLVE_SPEED_MS: u64 = 100;

/// Errors raised while setting up a solver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    #[error("Initial position ({x}, {y}) lies outside the {width}x{height} maze")]
    StartOutOfBounds {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    #[error("Invalid solver configuration: {0}")]
    InvalidConfig(String),
}

/// Tunables of the traversal engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub step_size: f64,
    pub robot_size: f64,
    pub border_policy: BorderPolicy,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            step_size: STEP_SIZE,
            robot_size: ROBOT_SIZE,
            border_policy: BorderPolicy::FirstPixels,
        }
    }
}

impl SolverConfig {
    fn validate(&self) -> Result<(), SolverError> {
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(SolverError::InvalidConfig(format!(
                "step size must be positive, got {}",
                self.step_size
            )));
        }
        if !(self.robot_size.is_finite() && self.robot_size >= 0.0) {
            return Err(SolverError::InvalidConfig(format!(
                "robot size must not be negative, got {}",
                self.robot_size
            )));
        }
        Ok(())
    }
}

/// Where the solver is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveState {
    Idle,
    Solving,
    /// The path stack emptied before the exit was found.
    Stuck,
    Reached,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Moved into a fresh cell.
    Advanced(Point),
    /// Dropped the current cell. Carries the cell moved back to, or `None`
    /// when the path is now empty.
    Backtracked(Option<Point>),
    Reached,
    Stuck,
}

impl Event {
    /// Whether the driving clock should stop after this event.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Reached | Event::Stuck)
    }
}

/// Depth-first maze solver for a square robot moving over a bitmap.
///
/// The solver is purely reactive: an external clock calls [`MazeSolver::tick`]
/// and every committed move is mirrored to the position sink.
pub struct MazeSolver<P, S> {
    pixels: P,
    sink: S,
    config: SolverConfig,
    width: f64,
    height: f64,
    position: Point,
    path_color: Color,
    border: Border,
    path: Vec<Point>,
    visited: HashSet<Point>,
    state: SolveState,
}

impl<P: PixelSource, S: PositionSink> MazeSolver<P, S> {
    /// Places the robot at `initial`, samples the path color under it and
    /// looks for the maze entrance and exit.
    pub fn new(
        pixels: P,
        sink: S,
        initial: Point,
        config: SolverConfig,
    ) -> Result<Self, SolverError> {
        config.validate()?;
        let width = pixels.width();
        let height = pixels.height();
        if !in_raster(initial, width, height) {
            return Err(SolverError::StartOutOfBounds {
                x: initial.x,
                y: initial.y,
                width,
                height,
            });
        }

        let path_color = pixels.color_at(initial.x as u32, initial.y as u32);
        let border = find_entrance_and_exit(&pixels, path_color, config.border_policy);
        match (border.start, border.exit) {
            (Some(start), Some(exit)) => debug!("Entrance at {:?}, exit at {:?}", start, exit),
            _ => warn!("Maze border has no discoverable exit"),
        }

        Ok(MazeSolver {
            pixels,
            sink,
            config,
            width,
            height,
            position: initial,
            path_color,
            border,
            path: Vec::new(),
            visited: HashSet::new(),
            state: SolveState::Idle,
        })
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn path_color(&self) -> Color {
        self.path_color
    }

    pub fn start_point(&self) -> Option<Point> {
        self.border.start
    }

    pub fn exit_point(&self) -> Option<Point> {
        self.border.exit
    }

    pub fn state(&self) -> SolveState {
        self.state
    }

    pub fn is_solving(&self) -> bool {
        self.state == SolveState::Solving
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// The current search path; the last entry is the robot's cell.
    pub fn path(&self) -> &[Point] {
        &self.path
    }

    pub fn visited(&self) -> &HashSet<Point> {
        &self.visited
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Begins a depth-first solve from the robot's current position.
    ///
    /// Does nothing while a solve is already running. Without a known exit
    /// the solver goes straight to [`SolveState::Stuck`].
    pub fn solve_maze(&mut self) -> SolveState {
        if self.is_solving() {
            return self.state;
        }
        if self.border.exit.is_none() {
            warn!("Cannot solve: maze has no discoverable exit");
            self.state = SolveState::Stuck;
            return self.state;
        }

        self.path.clear();
        self.visited.clear();
        self.path.push(self.position);
        self.visited.insert(self.position);
        self.state = SolveState::Solving;
        info!("Solving from {:?}", self.position);
        self.state
    }

    /// Advances the solve by one clock tick.
    ///
    /// Returns `None` when no solve is running, so a finished solve never
    /// moves the robot again.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.is_solving() {
            return None;
        }
        if self.is_at_exit() {
            info!("Exit reached at {:?}", self.position);
            self.state = SolveState::Reached;
            return Some(Event::Reached);
        }
        Some(self.step())
    }

    /// One depth-first step: push the first open neighbor, or pop back.
    pub fn step(&mut self) -> Event {
        let Some(&current) = self.path.last() else {
            warn!("Path exhausted without reaching the exit");
            self.state = SolveState::Stuck;
            return Event::Stuck;
        };

        if let Some(next) = self.first_unvisited_neighbor(current) {
            self.path.push(next);
            self.visited.insert(next);
            self.move_to(next);
            debug!("Advanced to {:?}", next);
            return Event::Advanced(next);
        }

        self.path.pop();
        let back = self.path.last().copied();
        if let Some(previous) = back {
            self.move_to(previous);
        }
        debug!("Backtracked to {:?}", back);
        Event::Backtracked(back)
    }

    /// Moves the robot by the given offsets if the target is a valid position.
    ///
    /// Returns whether the move was applied. Refused while a solve is running.
    pub fn move_by(&mut self, dx: f64, dy: f64) -> bool {
        if self.is_solving() {
            debug!("Ignoring manual move while solving");
            return false;
        }
        let target = self.position.offset(dx, dy);
        if !self.is_valid_move(target.x, target.y) {
            return false;
        }
        self.move_to(target);
        true
    }

    /// Whether the robot's footprint fits at `(new_x, new_y)`.
    ///
    /// Only the four corners of the footprint are sampled.
    pub fn is_valid_move(&self, new_x: f64, new_y: f64) -> bool {
        let size = self.config.robot_size;
        if new_x < 0.0
            || new_x > self.width - size
            || new_y < 0.0
            || new_y > self.height - size
        {
            return false;
        }

        self.is_path_available(new_x, new_y)
            && self.is_path_available(new_x + size, new_y)
            && self.is_path_available(new_x, new_y + size)
            && self.is_path_available(new_x + size, new_y + size)
    }

    /// Whether the robot is within one step of the exit on both axes.
    pub fn is_at_exit(&self) -> bool {
        let Some(exit) = self.border.exit else {
            return false;
        };
        (self.position.x - exit.x).abs() < self.config.step_size
            && (self.position.y - exit.y).abs() < self.config.step_size
    }

    fn is_path_available(&self, x: f64, y: f64) -> bool {
        if !in_raster(Point::new(x, y), self.width, self.height) {
            return false;
        }
        self.pixels.color_at(x as u32, y as u32) == self.path_color
    }

    fn first_unvisited_neighbor(&self, p: Point) -> Option<Point> {
        let step = self.config.step_size;
        // up, right, down, left
        [(0.0, -step), (step, 0.0), (0.0, step), (-step, 0.0)]
            .into_iter()
            .map(|(dx, dy)| p.offset(dx, dy))
            .find(|n| self.is_valid_move(n.x, n.y) && !self.visited.contains(n))
    }

    fn move_to(&mut self, p: Point) {
        self.position = p;
        self.sink.set_position(p);
    }
}

fn in_raster(p: Point, width: f64, height: f64) -> bool {
    p.x >= 0.0 && p.x < width && p.y >= 0.0 && p.y < height
}
