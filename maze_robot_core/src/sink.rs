use crate::Point;

/// Receives the robot's position every time a move is committed.
///
/// Implementations must tolerate being handed the same position repeatedly.
pub trait PositionSink {
    fn set_position(&mut self, position: Point);
}

impl<F: FnMut(Point)> PositionSink for F {
    fn set_position(&mut self, position: Point) {
        self(position)
    }
}

/// Discards every position.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PositionSink for NullSink {
    fn set_position(&mut self, _position: Point) {}
}

/// Keeps every committed position in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub positions: Vec<Point>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<Point> {
        self.positions.last().copied()
    }
}

impl PositionSink for RecordingSink {
    fn set_position(&mut self, position: Point) {
        self.positions.push(position);
    }
}
