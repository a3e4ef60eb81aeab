use maze_robot_core::{
    border::BorderPolicy,
    generate::{GeneratorConfig, generate_maze},
    sink::RecordingSink,
    solver::{Event, MazeSolver, SolveState, SolverConfig},
};
use proptest::prelude::*;

const TICK_LIMIT: usize = 10_000;

fn openings() -> SolverConfig {
    SolverConfig {
        border_policy: BorderPolicy::FirstOpenings,
        ..SolverConfig::default()
    }
}

#[test]
fn default_generated_maze_is_solved() {
    let maze = generate_maze(&GeneratorConfig::default()).unwrap();
    let mut solver =
        MazeSolver::new(&maze.raster, RecordingSink::new(), maze.start, openings()).unwrap();
    solver.solve_maze();

    let mut last = None;
    for _ in 0..TICK_LIMIT {
        last = solver.tick();
        if last.is_none_or(|event| event.is_terminal()) {
            break;
        }
    }

    assert_eq!(last, Some(Event::Reached));
    assert!(solver.is_at_exit());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn generated_mazes_are_solved_through_valid_positions(
        seed in any::<u64>(),
        columns in 1usize..6,
        rows in 1usize..5,
    ) {
        let config = GeneratorConfig { columns, rows, seed, ..GeneratorConfig::default() };
        let maze = generate_maze(&config).unwrap();
        let mut solver =
            MazeSolver::new(&maze.raster, RecordingSink::new(), maze.start, openings()).unwrap();
        prop_assert!(solver.exit_point().is_some());
        solver.solve_maze();

        let mut reached = false;
        for _ in 0..TICK_LIMIT {
            let before = solver.visited().len();
            match solver.tick() {
                Some(Event::Reached) => {
                    reached = true;
                    break;
                }
                Some(Event::Stuck) | None => break,
                Some(_) => {}
            }
            let grown = solver.visited().len() - before;
            prop_assert!(grown <= 1);
        }

        prop_assert!(reached);
        prop_assert_eq!(solver.state(), SolveState::Reached);
        for p in &solver.sink().positions {
            prop_assert!(solver.is_valid_move(p.x, p.y));
        }

        let committed = solver.sink().positions.len();
        prop_assert_eq!(solver.tick(), None);
        prop_assert_eq!(solver.sink().positions.len(), committed);
    }

    #[test]
    fn manual_moves_never_commit_invalid_positions(
        seed in any::<u64>(),
        moves in prop::collection::vec((-30i32..=30, -30i32..=30), 1..40),
    ) {
        let config = GeneratorConfig { columns: 3, rows: 3, seed, ..GeneratorConfig::default() };
        let maze = generate_maze(&config).unwrap();
        let mut solver =
            MazeSolver::new(&maze.raster, RecordingSink::new(), maze.start, openings()).unwrap();

        for (dx, dy) in moves {
            let before = solver.position();
            let target = before.offset(dx as f64, dy as f64);
            let valid = solver.is_valid_move(target.x, target.y);
            prop_assert_eq!(solver.move_by(dx as f64, dy as f64), valid);
            let expected = if valid { target } else { before };
            prop_assert_eq!(solver.position(), expected);
        }
    }
}
