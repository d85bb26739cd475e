use crate::{BoardError, Point, Result};
use serde::{Deserialize, Serialize};

/// Board geometry and mine count for a single game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub mines: usize,
}

impl GameConfig {
    pub fn new(rows: usize, cols: usize, mines: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(BoardError::InvalidDimensions { rows, cols });
        }
        let cells = rows
            .checked_mul(cols)
            .ok_or(BoardError::InvalidDimensions { rows, cols })?;
        if mines >= cells {
            return Err(BoardError::TooManyMines { mines, cells });
        }
        Ok(Self { rows, cols, mines })
    }

    pub const fn total_cells(&self) -> usize {
        self.rows * self.cols
    }

    pub const fn safe_cells(&self) -> usize {
        self.total_cells() - self.mines
    }

    /// Fraction of cells holding a mine, in `[0, 1)`.
    pub fn density(&self) -> f64 {
        self.mines as f64 / self.total_cells() as f64
    }
}

/// The classic difficulty presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Expert,
    ];

    pub const fn config(self) -> GameConfig {
        match self {
            Difficulty::Beginner => GameConfig {
                rows: 9,
                cols: 9,
                mines: 10,
            },
            Difficulty::Intermediate => GameConfig {
                rows: 16,
                cols: 16,
                mines: 40,
            },
            Difficulty::Expert => GameConfig {
                rows: 16,
                cols: 30,
                mines: 99,
            },
        }
    }
}

/// How the engine picks its very first cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Opener {
    /// First free corner: top-left, top-right, bottom-left, bottom-right.
    #[default]
    Corner,
    /// Uniformly random free cell.
    Random,
    /// A specific cell. Falls back to `Corner` if it is not free.
    Fixed(Point),
}

/// Which single-point deduction loop the solver runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Strategy {
    /// Double-set single point: undecided cells wait in an ambiguous set and
    /// are revisited once new flags appear.
    #[default]
    Dssp,
    /// Naive single point: each probed cell is judged once, right after it
    /// opens, and then forgotten.
    Nsp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SolverConfig {
    pub opener: Opener,
    pub strategy: Strategy,
}

impl SolverConfig {
    pub fn new(opener: Opener, strategy: Strategy) -> Self {
        Self { opener, strategy }
    }

    pub fn with_opener(opener: Opener) -> Self {
        Self {
            opener,
            ..Self::default()
        }
    }

    pub fn with_strategy(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }
}
