use crate::{Board, GameConfig, GameState, Result, RunSummary, Solver, SolverConfig};
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Tally of finished games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub played: usize,
    pub wins: usize,
    pub losses: usize,
}

impl SessionStats {
    pub fn record(&mut self, state: GameState) {
        self.played += 1;
        match state {
            GameState::Won => self.wins += 1,
            // A game the solver could not finish counts against it.
            GameState::Lost | GameState::Playing => self.losses += 1,
        }
    }

    /// Percentage of played games that were won; 0 when nothing was played.
    pub fn win_rate(&self) -> f64 {
        if self.played == 0 {
            return 0.0;
        }
        self.wins as f64 / self.played as f64 * 100.0
    }
}

/// Win rates of several independent batches of games.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub config: GameConfig,
    pub rates: Vec<f64>,
    pub mean: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityPoint {
    pub mines: usize,
    pub density: f64,
    pub win_rate: f64,
}

/// Plays many independent games with one solver configuration.
///
/// Every board and solver gets its own seed drawn from `seed`, so a runner
/// reports the same numbers every time it is asked the same question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Runner {
    pub config: SolverConfig,
    pub seed: u64,
}

impl Runner {
    pub fn new(config: SolverConfig, seed: u64) -> Self {
        Runner { config, seed }
    }

    /// Plays one game to the end.
    pub fn play_one(
        &self,
        game: GameConfig,
        board_seed: u64,
        solver_seed: u64,
    ) -> Result<RunSummary> {
        let mut board = Board::new(game, board_seed)?;
        let mut solver = Solver::with_config(self.config, SmallRng::seed_from_u64(solver_seed));
        Ok(solver.run(&mut board, None))
    }

    pub fn run_games(&self, n: usize, game: GameConfig) -> Result<SessionStats> {
        let game = GameConfig::new(game.rows, game.cols, game.mines)?;
        let mut seeds = SmallRng::seed_from_u64(self.seed);
        let mut stats = SessionStats::default();

        for _ in 0..n {
            let summary = self.play_one(game, seeds.random(), seeds.random())?;
            stats.record(summary.state);
        }

        log::info!(
            "{}x{} with {} mines: won {}/{} ({:.2}%)",
            game.rows,
            game.cols,
            game.mines,
            stats.wins,
            stats.played,
            stats.win_rate()
        );
        Ok(stats)
    }

    /// Runs `batches` batches of `games` games each and averages their win rates.
    pub fn run_batches(
        &self,
        batches: usize,
        games: usize,
        game: GameConfig,
    ) -> Result<BatchReport> {
        let mut seeds = SmallRng::seed_from_u64(self.seed);
        let rates = (0..batches)
            .map(|_| {
                Runner::new(self.config, seeds.random())
                    .run_games(games, game)
                    .map(|stats| stats.win_rate())
            })
            .collect::<Result<Vec<_>>>()?;

        let mean = if rates.is_empty() {
            0.0
        } else {
            rates.iter().sum::<f64>() / rates.len() as f64
        };
        Ok(BatchReport {
            config: game,
            rates,
            mean,
        })
    }

    /// Win rate on a fixed grid for each mine count.
    pub fn density_sweep(
        &self,
        games: usize,
        rows: usize,
        cols: usize,
        mine_counts: impl IntoIterator<Item = usize>,
    ) -> Result<Vec<DensityPoint>> {
        mine_counts
            .into_iter()
            .map(|mines| {
                let game = GameConfig::new(rows, cols, mines)?;
                let stats = self.run_games(games, game)?;
                Ok(DensityPoint {
                    mines,
                    density: game.density(),
                    win_rate: stats.win_rate(),
                })
            })
            .collect()
    }
}

/// Plays `n` fresh games with the default solver and returns the win percentage.
pub fn run_games(n: usize, rows: usize, cols: usize, mines: usize) -> Result<f64> {
    let game = GameConfig::new(rows, cols, mines)?;
    let runner = Runner::new(SolverConfig::default(), rand::random());
    Ok(runner.run_games(n, game)?.win_rate())
}
