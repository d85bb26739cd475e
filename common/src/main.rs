use clap::{Parser, Subcommand, ValueEnum};
use minesweeper_dssp::*;
use rand::{SeedableRng, rngs::SmallRng};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Level {
    Beginner,
    Intermediate,
    Expert,
}

impl From<Level> for Difficulty {
    fn from(level: Level) -> Self {
        match level {
            Level::Beginner => Difficulty::Beginner,
            Level::Intermediate => Difficulty::Intermediate,
            Level::Expert => Difficulty::Expert,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OpenerKind {
    Corner,
    Random,
}

impl From<OpenerKind> for Opener {
    fn from(kind: OpenerKind) -> Self {
        match kind {
            OpenerKind::Corner => Opener::Corner,
            OpenerKind::Random => Opener::Random,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyKind {
    /// Double-set single point.
    Dssp,
    /// Naive single point baseline.
    Nsp,
}

impl From<StrategyKind> for Strategy {
    fn from(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Dssp => Strategy::Dssp,
            StrategyKind::Nsp => Strategy::Nsp,
        }
    }
}

fn solver_config(opener: OpenerKind, strategy: StrategyKind) -> SolverConfig {
    SolverConfig::new(opener.into(), strategy.into())
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the solver play a single game.
    Watch {
        #[arg(long, value_enum, default_value_t = Level::Beginner)]
        level: Level,
        #[arg(long, value_enum, default_value_t = OpenerKind::Corner)]
        opener: OpenerKind,
        #[arg(long, value_enum, default_value_t = StrategyKind::Dssp)]
        strategy: StrategyKind,
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
        #[arg(long, default_value_t = 500, help = "Pause between moves in milliseconds")]
        delay_ms: u64,
    },
    /// Win rate per difficulty, averaged over batches of games.
    Stats {
        #[arg(long, default_value_t = 10)]
        batches: usize,
        #[arg(long, default_value_t = 1000)]
        games: usize,
        #[arg(long, value_enum, default_value_t = OpenerKind::Corner)]
        opener: OpenerKind,
        #[arg(long, value_enum, default_value_t = StrategyKind::Dssp)]
        strategy: StrategyKind,
        #[arg(long, help = "Fix RNG seed for reproducible runs (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
    /// Win rate against mine density on a fixed grid.
    Sweep {
        #[arg(long, default_value_t = 9)]
        rows: usize,
        #[arg(long, default_value_t = 9)]
        cols: usize,
        #[arg(long, default_value_t = 32)]
        max_mines: usize,
        #[arg(long, default_value_t = 5)]
        step: usize,
        #[arg(long, default_value_t = 1000)]
        games: usize,
        #[arg(long, value_enum, default_value_t = OpenerKind::Corner)]
        opener: OpenerKind,
        #[arg(long, value_enum, default_value_t = StrategyKind::Dssp)]
        strategy: StrategyKind,
        #[arg(long, help = "Fix RNG seed for reproducible runs (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            level,
            opener,
            strategy,
            seed,
            delay_ms,
        } => {
            let seed = seed.unwrap_or_else(rand::random);
            watch(
                Difficulty::from(level).config(),
                solver_config(opener, strategy),
                seed,
                Duration::from_millis(delay_ms),
            )
        }
        Commands::Stats {
            batches,
            games,
            opener,
            strategy,
            seed,
        } => {
            let config = solver_config(opener, strategy);
            let runner = Runner::new(config, seed.unwrap_or_else(rand::random));
            println!("--- {:?} results: {:?} opener ---", strategy, opener);
            for difficulty in Difficulty::ALL {
                let report = runner.run_batches(batches, games, difficulty.config())?;
                println!("{:?}", difficulty);
                let rates: Vec<String> = report.rates.iter().map(|r| format!("{r:.1}")).collect();
                println!("  win % per batch: [{}]", rates.join(", "));
                println!("  global win %:    {:.2}", report.mean);
            }
            Ok(())
        }
        Commands::Sweep {
            rows,
            cols,
            max_mines,
            step,
            games,
            opener,
            strategy,
            seed,
        } => {
            anyhow::ensure!(step > 0, "--step must be positive");
            let config = solver_config(opener, strategy);
            let runner = Runner::new(config, seed.unwrap_or_else(rand::random));
            println!("--- Win % vs. mine density on a {rows}x{cols} grid ---");
            let counts = (0..=max_mines).step_by(step);
            for point in runner.density_sweep(games, rows, cols, counts)? {
                println!(
                    "mines {:>3}  density {:.2}  win {:.2}%",
                    point.mines, point.density, point.win_rate
                );
            }
            Ok(())
        }
    }
}

fn watch(
    config: GameConfig,
    solver_config: SolverConfig,
    seed: u64,
    delay: Duration,
) -> anyhow::Result<()> {
    let mut board = Board::new(config, seed)?;
    let mut solver = Solver::with_config(solver_config, SmallRng::seed_from_u64(seed));

    println!("--- Autonomous Minesweeper Bot (seed {seed}) ---");
    println!("Strategy: open provably safe cells, flag provable mines, guess otherwise.");
    print_board(&board);

    let mut move_count = 0;
    loop {
        let phase = solver.phase();
        match solver.step(&mut board) {
            StepOutcome::Continued => {}
            StepOutcome::Finished(_) => break,
            StepOutcome::Exhausted => {
                println!("No valid moves left for the bot to make.");
                break;
            }
        }

        // Selecting only queues a cell; there is nothing new to show.
        if matches!(phase, Phase::Probing | Phase::Marking) {
            move_count += 1;
            println!("\n--- Move #{move_count} ({phase:?}) ---");
            print_board(&board);
            thread::sleep(delay);
        }
    }

    println!("\n--- Game Over ---");
    match board.state() {
        GameState::Won => println!("Result: The bot won!"),
        GameState::Lost => println!("Result: The bot hit a mine and lost."),
        GameState::Playing => println!("Result: The game ended unexpectedly."),
    }
    println!("Guesses made after the opener: {}", solver.guesses());
    Ok(())
}

fn print_board(board: &Board) {
    let lost = board.state() == GameState::Lost;

    // Print header
    print!("   ");
    for col in 0..board.cols() {
        print!("{:^3}", col);
    }
    println!("\n  +{}", "---".repeat(board.cols()));

    // Print rows
    for (row, cells) in board.cells().iter().enumerate() {
        print!("{:^2}|", row);
        for (col, cell) in cells.iter().enumerate() {
            let display = match cell {
                Cell::Hidden if lost && board.contains_mine(Point::new(row, col)) => {
                    " * ".to_string()
                }
                Cell::Hidden => " ■ ".to_string(),
                Cell::Flagged => " F ".to_string(),
                Cell::Revealed(0) => " . ".to_string(),
                Cell::Revealed(n) => format!(" {} ", n),
            };
            print!("{}", display);
        }
        println!();
    }
    println!();
}
