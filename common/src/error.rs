use crate::Point;
use thiserror::Error;

/// Failures raised when a board or configuration cannot be built.
///
/// Hitting a mine or winning are ordinary game states, not errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Board must be at least 1x1, got {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },
    #[error("Total mines ({mines}) must be less than the number of cells ({cells})")]
    TooManyMines { mines: usize, cells: usize },
    #[error("{0:?} is outside the board")]
    OutOfBounds(Point),
    #[error("Inconsistent board state: {0}")]
    InconsistentState(&'static str),
}

pub type Result<T> = core::result::Result<T, BoardError>;
