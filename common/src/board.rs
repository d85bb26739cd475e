use crate::{BoardError, GameConfig, Point, Result};
use itertools::iproduct;
use rand::{SeedableRng, rngs::SmallRng, seq::IteratorRandom};
use std::collections::{HashSet, VecDeque};

/// The visible state of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Cell {
    Hidden,
    Flagged,
    Revealed(u8), // The u8 is the number of adjacent mines.
}

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

impl GameState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, GameState::Won | GameState::Lost)
    }
}

/// What a single `open` did to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The game was over, or the cell was already revealed, flagged or off the board.
    NoChange,
    /// The cell and its flood-fill cascade, in reveal order.
    Revealed(Vec<Point>),
    HitMine,
    /// Like `Revealed`, and the last safe cell is now open.
    Won(Vec<Point>),
}

impl RevealOutcome {
    /// Cells newly revealed by the open.
    pub fn revealed(&self) -> &[Point] {
        match self {
            RevealOutcome::Revealed(points) | RevealOutcome::Won(points) => points,
            RevealOutcome::NoChange | RevealOutcome::HitMine => &[],
        }
    }
}

/// Grid geometry, mine layout and the reveal/flag state of one game.
///
/// Mines are placed lazily by the first `open`, which is never a mine. Boards
/// built with [`Board::with_mines`] or [`Board::with_state`] carry a fixed layout.
///
/// Deserialized boards go through the same checks as `with_state`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawBoard")]
pub struct Board {
    rows: usize,
    cols: usize,
    total_mines: usize,
    seed: u64,
    mines: HashSet<Point>,
    mines_placed: bool,
    revealed: HashSet<Point>,
    flagged: HashSet<Point>,
    state: GameState,
    triggered_mine: Option<Point>,
}

/// Field-for-field mirror of `Board`, deserialized before validation.
#[derive(serde::Deserialize)]
struct RawBoard {
    rows: usize,
    cols: usize,
    total_mines: usize,
    seed: u64,
    mines: HashSet<Point>,
    mines_placed: bool,
    revealed: HashSet<Point>,
    flagged: HashSet<Point>,
    state: GameState,
    triggered_mine: Option<Point>,
}

impl TryFrom<RawBoard> for Board {
    type Error = BoardError;

    fn try_from(raw: RawBoard) -> Result<Self> {
        let config = GameConfig::new(raw.rows, raw.cols, raw.total_mines)?;
        check_layout(config, &raw.mines, &raw.revealed, &raw.flagged)?;
        check_bounds(config, raw.triggered_mine)?;

        if raw.mines_placed && raw.mines.len() != raw.total_mines {
            return Err(BoardError::InconsistentState(
                "mine layout does not match the mine count",
            ));
        }
        if !raw.mines_placed && !(raw.mines.is_empty() && raw.revealed.is_empty()) {
            return Err(BoardError::InconsistentState(
                "cells are known before any mine was placed",
            ));
        }
        let loss_matches = match raw.triggered_mine {
            Some(p) => raw.state == GameState::Lost && raw.mines.contains(&p),
            None => raw.state != GameState::Lost,
        };
        if !loss_matches {
            return Err(BoardError::InconsistentState(
                "a lost game needs the mine that ended it",
            ));
        }

        let board = Board {
            rows: raw.rows,
            cols: raw.cols,
            total_mines: raw.total_mines,
            seed: raw.seed,
            mines: raw.mines,
            mines_placed: raw.mines_placed,
            revealed: raw.revealed,
            flagged: raw.flagged,
            state: raw.state,
            triggered_mine: raw.triggered_mine,
        };
        if (board.state == GameState::Won) != board.check_win() {
            return Err(BoardError::InconsistentState(
                "win state does not match the revealed cells",
            ));
        }
        Ok(board)
    }
}

fn check_bounds(config: GameConfig, points: impl IntoIterator<Item = Point>) -> Result<()> {
    match points
        .into_iter()
        .find(|p| p.row >= config.rows || p.col >= config.cols)
    {
        Some(p) => Err(BoardError::OutOfBounds(p)),
        None => Ok(()),
    }
}

/// Bounds and disjointness of the mine, reveal and flag sets.
fn check_layout(
    config: GameConfig,
    mines: &HashSet<Point>,
    revealed: &HashSet<Point>,
    flagged: &HashSet<Point>,
) -> Result<()> {
    check_bounds(config, mines.iter().chain(revealed).chain(flagged).copied())?;
    if !revealed.is_disjoint(flagged) {
        return Err(BoardError::InconsistentState(
            "a cell cannot be both revealed and flagged",
        ));
    }
    if !revealed.is_disjoint(mines) {
        return Err(BoardError::InconsistentState("a mine cannot be revealed"));
    }
    Ok(())
}

impl Board {
    /// A fresh board whose mines are placed on the first open using `seed`.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        let GameConfig { rows, cols, mines } =
            GameConfig::new(config.rows, config.cols, config.mines)?;
        Ok(Board {
            rows,
            cols,
            total_mines: mines,
            seed,
            mines: HashSet::new(),
            mines_placed: false,
            revealed: HashSet::new(),
            flagged: HashSet::new(),
            state: GameState::Playing,
            triggered_mine: None,
        })
    }

    /// A board with a known mine layout and nothing opened yet.
    pub fn with_mines(
        rows: usize,
        cols: usize,
        mines: impl IntoIterator<Item = Point>,
    ) -> Result<Self> {
        Self::with_state(rows, cols, mines, std::iter::empty(), std::iter::empty())
    }

    /// Restores a mid-game board, checking the reveal/flag invariants.
    pub fn with_state(
        rows: usize,
        cols: usize,
        mines: impl IntoIterator<Item = Point>,
        revealed: impl IntoIterator<Item = Point>,
        flagged: impl IntoIterator<Item = Point>,
    ) -> Result<Self> {
        let mines: HashSet<Point> = mines.into_iter().collect();
        let config = GameConfig::new(rows, cols, mines.len())?;
        let revealed: HashSet<Point> = revealed.into_iter().collect();
        let flagged: HashSet<Point> = flagged.into_iter().collect();
        check_layout(config, &mines, &revealed, &flagged)?;

        let mut board = Board {
            rows: config.rows,
            cols: config.cols,
            total_mines: config.mines,
            seed: 0,
            mines,
            mines_placed: true,
            revealed,
            flagged,
            state: GameState::Playing,
            triggered_mine: None,
        };
        if board.check_win() {
            board.state = GameState::Won;
        }
        Ok(board)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn config(&self) -> GameConfig {
        GameConfig {
            rows: self.rows,
            cols: self.cols,
            mines: self.total_mines,
        }
    }

    pub fn total_mines(&self) -> usize {
        self.total_mines
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// The mine that ended the game, if one did.
    pub fn triggered_mine(&self) -> Option<Point> {
        self.triggered_mine
    }

    /// Mine locations. Empty until the first open places them.
    pub fn mines(&self) -> &HashSet<Point> {
        &self.mines
    }

    pub fn mines_placed(&self) -> bool {
        self.mines_placed
    }

    pub fn revealed(&self) -> &HashSet<Point> {
        &self.revealed
    }

    pub fn flagged(&self) -> &HashSet<Point> {
        &self.flagged
    }

    pub fn is_revealed(&self, point: Point) -> bool {
        self.revealed.contains(&point)
    }

    pub fn is_flagged(&self, point: Point) -> bool {
        self.flagged.contains(&point)
    }

    /// Neither revealed nor flagged.
    pub fn is_free(&self, point: Point) -> bool {
        !self.revealed.contains(&point) && !self.flagged.contains(&point)
    }

    pub fn contains_mine(&self, point: Point) -> bool {
        self.mines.contains(&point)
    }

    pub fn in_bounds(&self, point: Point) -> bool {
        point.row < self.rows && point.col < self.cols
    }

    /// Mines not yet accounted for by a flag. Negative when over-flagged.
    pub fn mines_left(&self) -> isize {
        self.total_mines as isize - self.flagged.len() as isize
    }

    /// Every point on the board in row-major order.
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        iproduct!(0..self.rows, 0..self.cols).map(Point::from)
    }

    /// Points that are neither revealed nor flagged, in row-major order.
    pub fn free_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.points().filter(|&p| self.is_free(p))
    }

    pub fn neighbors(&self, point: Point) -> impl Iterator<Item = Point> + use<> {
        point.neighbors(self.rows, self.cols)
    }

    /// Number of mines around `point`, regardless of what has been revealed.
    pub fn adjacent_mine_count(&self, point: Point) -> u8 {
        self.neighbors(point)
            .filter(|n| self.mines.contains(n))
            .count() as u8
    }

    pub fn cell(&self, point: Point) -> Cell {
        if self.revealed.contains(&point) {
            Cell::Revealed(self.adjacent_mine_count(point))
        } else if self.flagged.contains(&point) {
            Cell::Flagged
        } else {
            Cell::Hidden
        }
    }

    /// The visible board, one row per inner vector.
    pub fn cells(&self) -> Vec<Vec<Cell>> {
        (0..self.rows)
            .map(|row| {
                (0..self.cols)
                    .map(|col| self.cell(Point { row, col }))
                    .collect()
            })
            .collect()
    }

    /// True when every safe cell has been revealed.
    pub fn check_win(&self) -> bool {
        self.revealed.len() == self.rows * self.cols - self.total_mines
    }

    /// Opens a cell, cascading through zero-count regions.
    ///
    /// Opening a mine is not an error: the board moves to `GameState::Lost`
    /// and `RevealOutcome::HitMine` is returned.
    pub fn open(&mut self, at: Point) -> RevealOutcome {
        if !self.in_bounds(at) {
            log::warn!("ignoring open outside the board at ({}, {})", at.row, at.col);
            return RevealOutcome::NoChange;
        }
        if self.state.is_terminal() || !self.is_free(at) {
            return RevealOutcome::NoChange;
        }

        if !self.mines_placed {
            self.place_mines(at);
        }

        if self.mines.contains(&at) {
            self.state = GameState::Lost;
            self.triggered_mine = Some(at);
            return RevealOutcome::HitMine;
        }

        let revealed = self.flood_fill_reveal(at);

        if self.check_win() {
            self.state = GameState::Won;
            RevealOutcome::Won(revealed)
        } else {
            RevealOutcome::Revealed(revealed)
        }
    }

    /// Adds or removes a flag. Returns whether anything changed.
    pub fn toggle_flag(&mut self, at: Point) -> bool {
        if self.state.is_terminal() || !self.in_bounds(at) || self.revealed.contains(&at) {
            return false;
        }
        if !self.flagged.remove(&at) {
            self.flagged.insert(at);
        }
        true
    }

    /// Places every mine anywhere except `safe`.
    fn place_mines(&mut self, safe: Point) {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        self.mines = self
            .points()
            .filter(|&p| p != safe)
            .choose_multiple(&mut rng, self.total_mines)
            .into_iter()
            .collect();
        self.mines_placed = true;
        log::debug!(
            "placed {} mines on a {}x{} board avoiding ({}, {})",
            self.mines.len(),
            self.rows,
            self.cols,
            safe.row,
            safe.col
        );
    }

    /// Reveals `start` and, breadth-first, every cell reachable through zero counts.
    fn flood_fill_reveal(&mut self, start: Point) -> Vec<Point> {
        let mut revealed_points = Vec::new();
        let mut queue = VecDeque::from([start]);
        let mut visited = HashSet::from([start]);

        while let Some(point) = queue.pop_front() {
            if !self.is_free(point) {
                continue;
            }

            self.revealed.insert(point);
            revealed_points.push(point);

            if self.adjacent_mine_count(point) == 0 {
                for neighbor in point.neighbors(self.rows, self.cols) {
                    if self.is_free(neighbor) && visited.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        revealed_points
    }
}
