use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    map::PixelSource,
    sink::PositionSink,
    solver::{Event, MazeSolver, SolveState},
};

/// A solver that can be ticked and moved from different threads.
///
/// Every call holds one lock for its whole duration, so a tick and a manual
/// move never interleave.
pub struct SharedSolver<P, S> {
    inner: Arc<Mutex<MazeSolver<P, S>>>,
}

impl<P, S> Clone for SharedSolver<P, S> {
    fn clone(&self) -> Self {
        SharedSolver {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: PixelSource, S: PositionSink> SharedSolver<P, S> {
    pub fn new(solver: MazeSolver<P, S>) -> Self {
        SharedSolver {
            inner: Arc::new(Mutex::new(solver)),
        }
    }

    /// Locks the solver. A panic in another holder does not leave the solver
    /// half-updated, so a poisoned lock is recovered.
    pub fn lock(&self) -> MutexGuard<'_, MazeSolver<P, S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn solve_maze(&self) -> SolveState {
        self.lock().solve_maze()
    }

    pub fn tick(&self) -> Option<Event> {
        self.lock().tick()
    }

    pub fn move_by(&self, dx: f64, dy: f64) -> bool {
        self.lock().move_by(dx, dy)
    }

    pub fn state(&self) -> SolveState {
        self.lock().state()
    }
}
