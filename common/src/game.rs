use crate::{
    Board, GameConfig, Point, Result, RevealOutcome, Solver, SolverConfig, SolverState,
    StepOutcome,
};
use rand::{SeedableRng, rngs::SmallRng};

/// A board together with the solver's working sets.
///
/// Display adapters that cannot hold a `Solver` between calls keep a `Game`
/// around as bytes and advance it one phase at a time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Game {
    pub board: Board,
    pub solver: SolverState,
    pub config: SolverConfig,
}

impl Game {
    pub fn new(game: GameConfig, seed: u64) -> Result<Self> {
        Ok(Game {
            board: Board::new(game, seed)?,
            solver: SolverState::default(),
            config: SolverConfig::default(),
        })
    }

    /// Deserializes a game state from bytes.
    pub fn deserialize(bts: &[u8]) -> anyhow::Result<Self> {
        Ok(bcs::from_bytes(bts)?)
    }

    /// Serializes the game state to bytes.
    pub fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    /// Runs one solver phase. `seed` feeds any random choice the phase makes.
    pub fn step(&mut self, seed: u64) -> StepOutcome {
        let state = std::mem::take(&mut self.solver);
        let mut solver = Solver::from_state(state, self.config, SmallRng::seed_from_u64(seed));
        let outcome = solver.step(&mut self.board);
        self.solver = solver.into_state();
        outcome
    }

    /// True when the game is still playing but every cell is revealed or
    /// flagged, so `step` can only report [`StepOutcome::Exhausted`].
    ///
    /// Happens after the player flags a safe cell by hand.
    pub fn is_stalled(&self) -> bool {
        !self.board.is_terminal() && self.board.free_points().next().is_none()
    }

    /// A manual open from the player.
    pub fn open(&mut self, at: Point) -> RevealOutcome {
        self.board.open(at)
    }

    /// A manual flag toggle from the player.
    pub fn toggle_flag(&mut self, at: Point) -> bool {
        self.board.toggle_flag(at)
    }
}
