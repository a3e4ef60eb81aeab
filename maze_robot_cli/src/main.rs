use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use log::{info, trace, warn};
use maze_robot_core::{
    Point,
    border::BorderPolicy,
    generate::{GeneratorConfig, generate_maze},
    map::{Raster, load_raster_from_string},
    sink::PositionSink,
    solver::{Event, MazeSolver, ROBOT_SIZE, SOLVE_SPEED_MS, STEP_SIZE, SolveState, SolverConfig},
};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Text maze to load ('#' wall, '.' path, 'S' robot start). A maze is generated when omitted
    #[arg(short, long, value_name = "MAP_FILE")]
    map: Option<PathBuf>,

    /// Pixels per map character
    #[arg(long, default_value_t = 10)]
    scale: usize,

    /// JSON run configuration. Flags given on the command line take precedence
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Generated maze width in cells
    #[arg(long)]
    columns: Option<usize>,

    /// Generated maze height in cells
    #[arg(long)]
    rows: Option<usize>,

    /// Seed for the maze generator
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    step_size: Option<f64>,

    #[arg(long)]
    robot_size: Option<f64>,

    /// Tick period in milliseconds
    #[arg(long)]
    speed_ms: Option<u64>,

    /// How the entrance and exit are picked from the border
    #[arg(long, value_enum)]
    border: Option<BorderArg>,

    /// Manual moves applied before solving, one step each (e.g. "down,right" or "d,r")
    #[arg(long, value_delimiter = ',')]
    moves: Vec<Move>,

    /// Give up after this many ticks
    #[arg(long, default_value_t = 100_000)]
    max_ticks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BorderArg {
    Pixels,
    Openings,
}

impl From<BorderArg> for BorderPolicy {
    fn from(arg: BorderArg) -> Self {
        match arg {
            BorderArg::Pixels => BorderPolicy::FirstPixels,
            BorderArg::Openings => BorderPolicy::FirstOpenings,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// Unit offsets, scaled by the step size when applied.
    fn delta(self) -> (f64, f64) {
        match self {
            Move::Up => (0.0, -1.0),
            Move::Down => (0.0, 1.0),
            Move::Left => (-1.0, 0.0),
            Move::Right => (1.0, 0.0),
        }
    }
}

impl FromStr for Move {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "u" | "up" => Ok(Move::Up),
            "d" | "down" => Ok(Move::Down),
            "l" | "left" => Ok(Move::Left),
            "r" | "right" => Ok(Move::Right),
            other => Err(anyhow!("Invalid move: {}", other)),
        }
    }
}

/// Settings that can come from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct RunConfig {
    step_size: f64,
    robot_size: f64,
    border_policy: BorderPolicy,
    solve_speed_ms: u64,
    generator: GeneratorConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            step_size: STEP_SIZE,
            robot_size: ROBOT_SIZE,
            // bitmap entrances are wider than one pixel
            border_policy: BorderPolicy::FirstOpenings,
            solve_speed_ms: SOLVE_SPEED_MS,
            generator: GeneratorConfig::default(),
        }
    }
}

impl RunConfig {
    fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: RunConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn apply_args(&mut self, args: &Args) {
        if let Some(step_size) = args.step_size {
            self.step_size = step_size;
        }
        if let Some(robot_size) = args.robot_size {
            self.robot_size = robot_size;
        }
        if let Some(border) = args.border {
            self.border_policy = border.into();
        }
        if let Some(speed_ms) = args.speed_ms {
            self.solve_speed_ms = speed_ms;
        }
        if let Some(columns) = args.columns {
            self.generator.columns = columns;
        }
        if let Some(rows) = args.rows {
            self.generator.rows = rows;
        }
        if let Some(seed) = args.seed {
            self.generator.seed = seed;
        }
    }

    fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            step_size: self.step_size,
            robot_size: self.robot_size,
            border_policy: self.border_policy,
        }
    }
}

/// Logs every committed position and counts them.
#[derive(Debug, Default)]
struct LogSink {
    moves: usize,
}

impl PositionSink for LogSink {
    fn set_position(&mut self, position: Point) {
        self.moves += 1;
        trace!("Robot at ({}, {})", position.x, position.y);
    }
}

struct App {
    solver: MazeSolver<Raster, LogSink>,
    tick_rate: Duration,
    ticks: usize,
    backtracks: usize,
}

impl App {
    fn new(solver: MazeSolver<Raster, LogSink>, tick_rate: Duration) -> Self {
        App {
            solver,
            tick_rate,
            ticks: 0,
            backtracks: 0,
        }
    }

    /// Applies scripted manual moves, one step size each.
    fn apply_moves(&mut self, moves: &[Move]) {
        let step = self.solver.config().step_size;
        for &m in moves {
            let (dx, dy) = m.delta();
            if !self.solver.move_by(dx * step, dy * step) {
                warn!("Move {:?} from {:?} is blocked", m, self.solver.position());
            }
        }
    }

    /// Handles one step of the solve. Returns whether the clock should keep running.
    fn tick(&mut self) -> bool {
        let Some(event) = self.solver.tick() else {
            return false;
        };
        self.ticks += 1;
        if let Event::Backtracked(_) = event {
            self.backtracks += 1;
        }
        !event.is_terminal()
    }
}

/// Loads the maze and the robot's initial position.
fn load_maze(args: &Args, config: &RunConfig) -> Result<(Raster, Point)> {
    match &args.map {
        Some(map_file) => {
            let text = fs::read_to_string(map_file)
                .with_context(|| format!("Failed to read map file {}", map_file.display()))?;
            let (raster, start) = load_raster_from_string(&text, args.scale)
                .with_context(|| format!("Failed to load map {}", map_file.display()))?;
            let start = start.ok_or_else(|| {
                anyhow!("Map {} has no start marker ('S')", map_file.display())
            })?;
            Ok((raster, start))
        }
        None => {
            let maze = generate_maze(&config.generator)?;
            info!(
                "Generated {}x{} maze with seed {}",
                config.generator.columns, config.generator.rows, config.generator.seed
            );
            Ok((maze.raster, maze.start))
        }
    }
}

/// Drives the solver on a fixed period until it stops or runs out of ticks.
fn run_app(app: &mut App, max_ticks: usize) -> SolveState {
    app.solver.solve_maze();
    let mut last_tick = Instant::now();

    while app.ticks < max_ticks {
        let timeout = app
            .tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        thread::sleep(timeout);
        last_tick = Instant::now();

        if !app.tick() {
            break;
        }
    }

    app.solver.state()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    config.apply_args(&args);

    let (raster, initial) = load_maze(&args, &config)?;
    info!(
        "Maze is {}x{} pixels, robot starts at ({}, {})",
        raster.width(),
        raster.height(),
        initial.x,
        initial.y
    );
    let solver = MazeSolver::new(raster, LogSink::default(), initial, config.solver_config())?;
    if let (Some(start), Some(exit)) = (solver.start_point(), solver.exit_point()) {
        info!("Entrance at ({}, {}), exit at ({}, {})", start.x, start.y, exit.x, exit.y);
    }

    let mut app = App::new(solver, Duration::from_millis(config.solve_speed_ms));
    app.apply_moves(&args.moves);

    let outcome = run_app(&mut app, args.max_ticks);
    let position = app.solver.position();
    match outcome {
        SolveState::Reached => {
            info!(
                "Exit reached at ({}, {}) after {} ticks ({} moves, {} backtracks)",
                position.x,
                position.y,
                app.ticks,
                app.solver.sink().moves,
                app.backtracks
            );
            Ok(())
        }
        SolveState::Stuck => bail!(
            "Robot got stuck at ({}, {}) after {} ticks without reaching the exit",
            position.x,
            position.y,
            app.ticks
        ),
        state => bail!("Gave up after {} ticks in state {:?}", app.ticks, state),
    }
}
