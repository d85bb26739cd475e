use crate::{Board, GameState, Opener, Point, SolverConfig, Strategy};
use rand::{Rng, seq::IteratorRandom};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The phase the solver will execute on its next `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Queue a cell to open if the frontier is empty.
    #[default]
    Selecting,
    /// Open every queued cell, queuing neighbors proven safe. Under
    /// [`Strategy::Nsp`] forced mines are flagged here too.
    Probing,
    /// Re-examine ambiguous cells, flagging proven mines.
    Marking,
    /// No logical progress is possible; queue a guess.
    Stuck,
}

/// Result of a single `Solver::step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A phase ran and the game may continue.
    Continued,
    /// The board was already won or lost; nothing was done.
    Finished(GameState),
    /// No free cell is left to select while the board is still playing.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Phases executed.
    pub steps: usize,
    /// Cells selected without a proof of safety, excluding the opener.
    pub guesses: usize,
    pub state: GameState,
}

/// The solver's per-game working sets. Serializable so a display adapter can
/// keep a game going across calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverState {
    /// Cells known to be safe, waiting to be opened.
    pub frontier: HashSet<Point>,
    /// Opened cells whose neighborhood is not resolved yet.
    pub ambiguous: HashSet<Point>,
    pub phase: Phase,
    /// Whether the opener has been selected.
    pub opened: bool,
    pub guesses: usize,
}

/// Local counts around a revealed cell.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Neighborhood {
    /// Neighbors that are neither revealed nor flagged.
    unmarked: Vec<Point>,
    flagged: usize,
    mines: usize,
}

impl Neighborhood {
    fn of(board: &Board, point: Point) -> Self {
        let mut unmarked = Vec::new();
        let mut flagged = 0;
        for neighbor in board.neighbors(point) {
            if board.is_flagged(neighbor) {
                flagged += 1;
            } else if !board.is_revealed(neighbor) {
                unmarked.push(neighbor);
            }
        }
        Neighborhood {
            unmarked,
            flagged,
            mines: board.adjacent_mine_count(point) as usize,
        }
    }

    /// Every mine is flagged, so the rest are safe.
    fn all_free(&self) -> bool {
        self.flagged == self.mines
    }

    /// Flags plus unmarked cells account for every mine, so the unmarked are mines.
    fn all_marked(&self) -> bool {
        self.flagged + self.unmarked.len() == self.mines
    }
}

/// True when the flagged neighbors of `point` already account for all its mines.
pub fn is_all_free_neighbors(board: &Board, point: Point) -> bool {
    Neighborhood::of(board, point).all_free()
}

/// True when every neighbor of `point` that is not revealed must be a mine.
pub fn is_all_marked_neighbors(board: &Board, point: Point) -> bool {
    Neighborhood::of(board, point).all_marked()
}

/// Top-left, top-right, bottom-left, bottom-right; the first one still free.
fn free_corner(board: &Board) -> Option<Point> {
    let (last_row, last_col) = (board.rows() - 1, board.cols() - 1);
    [
        Point::new(0, 0),
        Point::new(0, last_col),
        Point::new(last_row, 0),
        Point::new(last_row, last_col),
    ]
    .into_iter()
    .find(|&corner| board.is_free(corner))
}

/// Single-point solver.
///
/// Keeps a frontier of cells proven safe and, for [`Strategy::Dssp`], a set of
/// ambiguous opened cells. Each `step` runs one phase: selecting a cell to open
/// when nothing is known, probing the frontier, or marking mines around
/// ambiguous cells. When marking stops making progress the solver guesses.
///
/// [`Strategy::Nsp`] judges each cell once as it opens and never marks, so it
/// goes straight from probing back to selecting.
#[derive(Debug, Clone)]
pub struct Solver<R> {
    state: SolverState,
    config: SolverConfig,
    rng: R,
}

impl<R: Rng> Solver<R> {
    pub fn new(rng: R) -> Self {
        Self::with_config(SolverConfig::default(), rng)
    }

    pub fn with_config(config: SolverConfig, rng: R) -> Self {
        Self::from_state(SolverState::default(), config, rng)
    }

    /// Resumes a game from previously saved working sets.
    pub fn from_state(state: SolverState, config: SolverConfig, rng: R) -> Self {
        Solver { state, config, rng }
    }

    pub fn state(&self) -> &SolverState {
        &self.state
    }

    pub fn into_state(self) -> SolverState {
        self.state
    }

    pub fn config(&self) -> SolverConfig {
        self.config
    }

    pub fn frontier(&self) -> &HashSet<Point> {
        &self.state.frontier
    }

    pub fn ambiguous(&self) -> &HashSet<Point> {
        &self.state.ambiguous
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn guesses(&self) -> usize {
        self.state.guesses
    }

    /// Clears the working sets for a new game.
    pub fn reset(&mut self) {
        self.state = SolverState::default();
    }

    /// Drives `board` until the game ends, no cell is left to select, or
    /// `budget` phases have run.
    pub fn run(&mut self, board: &mut Board, budget: Option<usize>) -> RunSummary {
        let mut steps = 0;
        while budget.is_none_or(|budget| steps < budget) {
            match self.step(board) {
                StepOutcome::Continued => steps += 1,
                StepOutcome::Finished(_) | StepOutcome::Exhausted => break,
            }
        }
        RunSummary {
            steps,
            guesses: self.state.guesses,
            state: board.state(),
        }
    }

    /// Executes the current phase once.
    pub fn step(&mut self, board: &mut Board) -> StepOutcome {
        if board.is_terminal() {
            return StepOutcome::Finished(board.state());
        }

        match self.state.phase {
            Phase::Selecting => self.select(board, false),
            Phase::Stuck => self.select(board, true),
            Phase::Probing => self.probe(board),
            Phase::Marking => self.mark(board),
        }
    }

    fn select(&mut self, board: &Board, stuck: bool) -> StepOutcome {
        if self.state.frontier.is_empty() {
            let Some(candidate) = self.choose(board) else {
                log::warn!("no free cell left to select on an unfinished board");
                return StepOutcome::Exhausted;
            };
            log::debug!(
                "selected ({}, {}){}",
                candidate.row,
                candidate.col,
                if stuck { " as a guess" } else { "" }
            );
            self.state.frontier.insert(candidate);
        }
        self.state.phase = Phase::Probing;
        StepOutcome::Continued
    }

    /// Picks a free cell: the configured opener first, then a free corner,
    /// then any free cell at random.
    fn choose(&mut self, board: &Board) -> Option<Point> {
        let first = !self.state.opened;
        let choice = match self.config.opener {
            Opener::Fixed(point) if first && board.in_bounds(point) && board.is_free(point) => {
                Some(point)
            }
            Opener::Random if first => board.free_points().choose(&mut self.rng),
            _ => free_corner(board).or_else(|| board.free_points().choose(&mut self.rng)),
        };

        if choice.is_some() {
            if first {
                self.state.opened = true;
            } else {
                self.state.guesses += 1;
            }
        }
        choice
    }

    fn probe(&mut self, board: &mut Board) -> StepOutcome {
        while let Some(&next) = self.state.frontier.iter().next() {
            self.state.frontier.remove(&next);

            let outcome = board.open(next);
            if board.is_terminal() {
                log::debug!("probe of ({}, {}) ended the game", next.row, next.col);
                break;
            }

            // Cells uncovered by a cascade get the same treatment as `next`.
            let examined = std::iter::once(next)
                .chain(outcome.revealed().iter().copied().filter(|&p| p != next));
            for point in examined {
                if !board.is_revealed(point) {
                    continue;
                }
                let hood = Neighborhood::of(board, point);
                if hood.all_free() {
                    self.state.frontier.extend(hood.unmarked);
                    continue;
                }
                match self.config.strategy {
                    Strategy::Dssp => {
                        self.state.ambiguous.insert(point);
                    }
                    Strategy::Nsp if hood.all_marked() => {
                        for mine in hood.unmarked {
                            board.toggle_flag(mine);
                        }
                    }
                    Strategy::Nsp => {}
                }
            }
        }

        self.state.phase = match self.config.strategy {
            Strategy::Dssp => Phase::Marking,
            Strategy::Nsp => Phase::Selecting,
        };
        StepOutcome::Continued
    }

    fn mark(&mut self, board: &mut Board) -> StepOutcome {
        // Every cell is judged against the flags as they stood at the start
        // of the pass; flags placed here only affect the next pass.
        let snapshot: Vec<Point> = self.state.ambiguous.iter().copied().collect();
        let mut mines = HashSet::new();
        let mut safe = HashSet::new();
        let mut resolved = Vec::new();

        for point in snapshot {
            let hood = Neighborhood::of(board, point);
            if hood.all_marked() {
                mines.extend(hood.unmarked);
                resolved.push(point);
            } else if hood.all_free() {
                safe.extend(hood.unmarked);
                resolved.push(point);
            }
        }

        for &mine in &mines {
            if !board.is_flagged(mine) {
                board.toggle_flag(mine);
            }
        }
        for point in &resolved {
            self.state.ambiguous.remove(point);
        }
        self.state.frontier.extend(safe);

        self.state.phase = if !self.state.frontier.is_empty() {
            Phase::Probing
        } else if self.state.ambiguous.is_empty() {
            Phase::Selecting
        } else if !resolved.is_empty() {
            Phase::Marking
        } else {
            Phase::Stuck
        };
        log::debug!(
            "marking resolved {} cells, flagged {}, next phase {:?}",
            resolved.len(),
            mines.len(),
            self.state.phase
        );
        StepOutcome::Continued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;
    use rand::{SeedableRng, rngs::SmallRng};

    fn p(row: usize, col: usize) -> Point {
        Point::new(row, col)
    }

    fn solver() -> Solver<SmallRng> {
        Solver::new(SmallRng::seed_from_u64(0))
    }

    #[test]
    fn test_is_all_free_neighbors() {
        let board = Board::with_state(5, 5, [p(1, 0)], [p(1, 1)], [p(1, 0)]).unwrap();
        assert!(is_all_free_neighbors(&board, p(0, 0)));

        let board = Board::with_state(5, 5, [p(1, 0)], [p(1, 1)], std::iter::empty()).unwrap();
        assert!(!is_all_free_neighbors(&board, p(0, 0)));
    }

    #[test]
    fn test_is_all_marked_neighbors() {
        let board =
            Board::with_state(5, 5, [p(1, 0)], [p(1, 1), p(0, 1)], std::iter::empty()).unwrap();
        assert!(is_all_marked_neighbors(&board, p(0, 0)));

        let board = Board::with_state(5, 5, [p(1, 0)], [p(1, 1)], std::iter::empty()).unwrap();
        assert!(!is_all_marked_neighbors(&board, p(0, 0)));
    }

    #[test]
    fn test_selects_first_free_corner() {
        let mut board = Board::with_state(
            5,
            5,
            [p(3, 3)],
            [p(1, 1), p(1, 2), p(2, 1)],
            [p(0, 0), p(1, 0)],
        )
        .unwrap();
        let mut solver = solver();
        assert_eq!(solver.step(&mut board), StepOutcome::Continued);
        assert_eq!(solver.frontier(), &HashSet::from([p(0, 4)]));
        assert_eq!(solver.phase(), Phase::Probing);
    }

    #[test]
    fn test_selects_random_cell_when_corners_taken() {
        let corners = [p(0, 0), p(0, 4), p(4, 0), p(4, 4)];
        let mut board = Board::with_state(5, 5, [p(2, 2)], corners, std::iter::empty()).unwrap();
        let mut solver = solver();
        solver.step(&mut board);

        let chosen = *solver.frontier().iter().next().unwrap();
        assert!(!corners.contains(&chosen));
        assert!(board.is_free(chosen));
    }

    #[test]
    fn test_fixed_and_random_openers() {
        let mut board = Board::with_mines(4, 4, [p(0, 0)]).unwrap();
        let config = SolverConfig::with_opener(Opener::Fixed(p(2, 1)));
        let mut solver = Solver::with_config(config, SmallRng::seed_from_u64(3));
        solver.step(&mut board);
        assert_eq!(solver.frontier(), &HashSet::from([p(2, 1)]));

        let mut board = Board::with_mines(4, 4, [p(0, 0)]).unwrap();
        let config = SolverConfig::with_opener(Opener::Random);
        let mut solver = Solver::with_config(config, SmallRng::seed_from_u64(3));
        solver.step(&mut board);
        assert_eq!(solver.frontier().len(), 1);
        assert_eq!(solver.guesses(), 0);
    }

    #[test]
    fn test_fixed_opener_falls_back_to_corner() {
        let mut board = Board::with_state(3, 3, [p(2, 2)], [p(1, 1)], std::iter::empty()).unwrap();
        let config = SolverConfig::with_opener(Opener::Fixed(p(1, 1)));
        let mut solver = Solver::with_config(config, SmallRng::seed_from_u64(0));
        solver.step(&mut board);
        assert_eq!(solver.frontier(), &HashSet::from([p(0, 0)]));
    }

    #[test]
    fn test_probe_queues_safe_neighbors_and_ambiguous_cells() {
        // (0, 0) touches one mine at (1, 1); nothing is flagged yet.
        let mut board = Board::with_mines(3, 3, [p(1, 1)]).unwrap();
        let mut solver = solver();
        solver.step(&mut board);
        solver.step(&mut board);

        assert!(board.is_revealed(p(0, 0)));
        assert!(solver.frontier().is_empty());
        assert_eq!(solver.ambiguous(), &HashSet::from([p(0, 0)]));
        assert_eq!(solver.phase(), Phase::Marking);
    }

    #[test]
    fn test_marking_flags_forced_mines() {
        // Revealed (0, 0) has exactly one hidden neighbor left, and it is the mine.
        let mut board = Board::with_state(
            3,
            3,
            [p(1, 1)],
            [p(0, 0), p(0, 1), p(1, 0)],
            std::iter::empty(),
        )
        .unwrap();
        let state = SolverState {
            ambiguous: HashSet::from([p(0, 0)]),
            phase: Phase::Marking,
            opened: true,
            ..SolverState::default()
        };
        let mut solver =
            Solver::from_state(state, SolverConfig::default(), SmallRng::seed_from_u64(0));

        solver.step(&mut board);
        assert!(board.is_flagged(p(1, 1)));
        assert!(solver.ambiguous().is_empty());
        assert_eq!(solver.phase(), Phase::Selecting);
    }

    #[test]
    fn test_marking_uses_flags_from_start_of_pass() {
        // (0, 0) forces the mine at (1, 1); (0, 2) only learns its other
        // neighbors are safe once that flag exists, which takes a second pass.
        let mut board = Board::with_state(
            3,
            3,
            [p(1, 1)],
            [p(0, 0), p(0, 1), p(1, 0), p(0, 2)],
            std::iter::empty(),
        )
        .unwrap();
        let state = SolverState {
            ambiguous: HashSet::from([p(0, 0), p(0, 2)]),
            phase: Phase::Marking,
            opened: true,
            ..SolverState::default()
        };
        let mut solver =
            Solver::from_state(state, SolverConfig::default(), SmallRng::seed_from_u64(0));

        solver.step(&mut board);
        assert!(board.is_flagged(p(1, 1)));
        assert_eq!(solver.ambiguous(), &HashSet::from([p(0, 2)]));
        assert!(solver.frontier().is_empty());
        assert_eq!(solver.phase(), Phase::Marking);

        solver.step(&mut board);
        assert!(solver.ambiguous().is_empty());
        assert_eq!(solver.frontier(), &HashSet::from([p(1, 2)]));
        assert_eq!(solver.phase(), Phase::Probing);
    }

    #[test]
    fn test_stuck_guess_prefers_free_corner() {
        // (0, 0) sees one mine among three hidden cells and nothing else is known.
        let mut board =
            Board::with_state(3, 3, [p(1, 1)], [p(0, 0)], std::iter::empty()).unwrap();
        let state = SolverState {
            ambiguous: HashSet::from([p(0, 0)]),
            phase: Phase::Marking,
            opened: true,
            ..SolverState::default()
        };
        let mut solver =
            Solver::from_state(state, SolverConfig::default(), SmallRng::seed_from_u64(0));

        solver.step(&mut board);
        assert_eq!(solver.phase(), Phase::Stuck);
        assert_eq!(solver.ambiguous(), &HashSet::from([p(0, 0)]));

        assert_eq!(solver.step(&mut board), StepOutcome::Continued);
        assert_eq!(solver.frontier(), &HashSet::from([p(0, 2)]));
        assert_eq!(solver.guesses(), 1);
        assert_eq!(solver.phase(), Phase::Probing);
    }

    #[test]
    fn test_stuck_guess_is_corner_for_every_seed() {
        for seed in 0..50 {
            let mut board =
                Board::with_state(3, 3, [p(1, 1)], [p(0, 0)], std::iter::empty()).unwrap();
            let state = SolverState {
                ambiguous: HashSet::from([p(0, 0)]),
                phase: Phase::Stuck,
                opened: true,
                ..SolverState::default()
            };
            let mut solver =
                Solver::from_state(state, SolverConfig::default(), SmallRng::seed_from_u64(seed));
            solver.step(&mut board);
            assert_eq!(solver.frontier(), &HashSet::from([p(0, 2)]));
        }
    }

    #[test]
    fn test_stuck_guess_is_random_once_corners_are_gone() {
        let corners = [p(0, 0), p(0, 2), p(2, 0), p(2, 2)];
        let mut board = Board::with_state(3, 3, [p(1, 1)], corners, std::iter::empty()).unwrap();
        let state = SolverState {
            phase: Phase::Stuck,
            opened: true,
            ..SolverState::default()
        };
        let mut solver =
            Solver::from_state(state, SolverConfig::default(), SmallRng::seed_from_u64(4));
        solver.step(&mut board);

        let chosen = *solver.frontier().iter().next().unwrap();
        assert!(!corners.contains(&chosen));
        assert!(board.is_free(chosen));
    }

    fn nsp_solver() -> Solver<SmallRng> {
        Solver::with_config(
            SolverConfig::with_strategy(Strategy::Nsp),
            SmallRng::seed_from_u64(0),
        )
    }

    #[test]
    fn test_nsp_selects_corner_or_random() {
        let mut board = Board::with_state(
            5,
            5,
            [p(3, 3)],
            [p(1, 1), p(1, 2), p(2, 1)],
            [p(0, 0), p(1, 0)],
        )
        .unwrap();
        let mut solver = nsp_solver();
        assert_eq!(solver.step(&mut board), StepOutcome::Continued);
        assert_eq!(solver.frontier(), &HashSet::from([p(0, 4)]));

        let corners = [p(0, 0), p(0, 4), p(4, 0), p(4, 4)];
        let mut board = Board::with_state(5, 5, [p(2, 2)], corners, std::iter::empty()).unwrap();
        let mut solver = nsp_solver();
        solver.step(&mut board);
        let chosen = *solver.frontier().iter().next().unwrap();
        assert!(!corners.contains(&chosen));
        assert!(board.is_free(chosen));
    }

    #[test]
    fn test_nsp_probe_flags_forced_mine_without_ambiguous_set() {
        // Opening (0, 0) leaves the mine at (1, 1) as its only hidden neighbor.
        let mut board = Board::with_state(
            3,
            3,
            [p(1, 1)],
            [p(0, 1), p(1, 0)],
            std::iter::empty(),
        )
        .unwrap();
        let state = SolverState {
            frontier: HashSet::from([p(0, 0)]),
            phase: Phase::Probing,
            opened: true,
            ..SolverState::default()
        };
        let config = SolverConfig::with_strategy(Strategy::Nsp);
        let mut solver = Solver::from_state(state, config, SmallRng::seed_from_u64(0));

        assert_eq!(solver.step(&mut board), StepOutcome::Continued);
        assert!(board.is_revealed(p(0, 0)));
        assert!(board.is_flagged(p(1, 1)));
        assert!(solver.ambiguous().is_empty());
        assert!(solver.frontier().is_empty());
        assert_eq!(solver.phase(), Phase::Selecting);
    }

    #[test]
    fn test_dssp_probe_defers_the_same_mine_to_marking() {
        let mut board = Board::with_state(
            3,
            3,
            [p(1, 1)],
            [p(0, 1), p(1, 0)],
            std::iter::empty(),
        )
        .unwrap();
        let state = SolverState {
            frontier: HashSet::from([p(0, 0)]),
            phase: Phase::Probing,
            opened: true,
            ..SolverState::default()
        };
        let mut solver =
            Solver::from_state(state, SolverConfig::default(), SmallRng::seed_from_u64(0));

        solver.step(&mut board);
        assert!(!board.is_flagged(p(1, 1)));
        assert_eq!(solver.ambiguous(), &HashSet::from([p(0, 0)]));
        assert_eq!(solver.phase(), Phase::Marking);
    }

    #[test]
    fn test_nsp_never_marks_and_finishes() {
        for seed in 0..20 {
            let mut board = Board::new(GameConfig::new(9, 9, 10).unwrap(), seed).unwrap();
            let config = SolverConfig::with_strategy(Strategy::Nsp);
            let mut solver = Solver::with_config(config, SmallRng::seed_from_u64(seed));
            loop {
                assert_ne!(solver.phase(), Phase::Marking);
                match solver.step(&mut board) {
                    StepOutcome::Continued => assert!(solver.ambiguous().is_empty()),
                    StepOutcome::Finished(_) => break,
                    StepOutcome::Exhausted => panic!("ran out of cells on a live board"),
                }
            }
            assert!(board.flagged().is_subset(board.mines()));
        }
    }

    #[test]
    fn test_exhausted_when_nothing_is_free() {
        let mut board = Board::with_state(
            2,
            2,
            [p(1, 1)],
            [p(0, 0), p(0, 1)],
            [p(1, 0), p(1, 1)],
        )
        .unwrap();
        let mut solver = solver();
        assert_eq!(solver.step(&mut board), StepOutcome::Exhausted);
        let summary = solver.run(&mut board, None);
        assert_eq!(summary.steps, 0);
        assert_eq!(summary.state, GameState::Playing);
    }

    #[test]
    fn test_finished_board_is_left_alone() {
        let mut board = Board::with_mines(2, 2, [p(1, 1)]).unwrap();
        board.open(p(1, 1));
        let mut solver = solver();
        assert_eq!(solver.step(&mut board), StepOutcome::Finished(GameState::Lost));
        assert!(solver.frontier().is_empty());
    }

    #[test]
    fn test_reset_clears_working_sets() {
        let mut board = Board::with_mines(3, 3, [p(1, 1)]).unwrap();
        let mut solver = solver();
        solver.run(&mut board, Some(2));
        assert!(!solver.ambiguous().is_empty());
        solver.reset();
        assert_eq!(solver.state(), &SolverState::default());
    }
}
