pub use board::*;
pub use config::*;
pub use error::*;
pub use game::*;
pub use runner::*;
pub use solver::*;

mod board;
mod config;
mod error;
mod game;
pub mod logging;
mod runner;
mod solver;

/// A `(row, col)` coordinate on the board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    pub const fn new(row: usize, col: usize) -> Self {
        Point { row, col }
    }

    /// All points within Chebyshev distance 1 that lie inside a `rows x cols` grid.
    pub fn neighbors(self, rows: usize, cols: usize) -> impl Iterator<Item = Point> {
        (-1..=1).flat_map(move |dr| {
            (-1..=1).filter_map(move |dc| {
                if dr == 0 && dc == 0 {
                    return None;
                }

                let nr = self.row as isize + dr;
                let nc = self.col as isize + dc;

                if nr >= 0 && nr < rows as isize && nc >= 0 && nc < cols as isize {
                    Some(Point {
                        row: nr as usize,
                        col: nc as usize,
                    })
                } else {
                    None
                }
            })
        })
    }
}

impl From<(usize, usize)> for Point {
    fn from((row, col): (usize, usize)) -> Self {
        Point { row, col }
    }
}
