use minesweeper_dssp::{Board, GameState, Point, Solver};
use rand::{SeedableRng, rngs::SmallRng};

fn p(row: usize, col: usize) -> Point {
    Point::new(row, col)
}

#[test]
fn solver_wins_deducible_5x5_from_top_left() {
    let mines = [p(2, 3), p(2, 1), p(2, 4), p(3, 3)];

    // Pop order out of the working sets varies with the seed; the result must not.
    for seed in 0..100 {
        let mut board = Board::with_mines(5, 5, mines).unwrap();
        let mut solver = Solver::new(SmallRng::seed_from_u64(seed));
        let summary = solver.run(&mut board, None);

        assert!(board.check_win(), "seed {seed} did not win");
        assert!(board.is_revealed(p(0, 0)));
        assert_eq!(summary.state, GameState::Won);
        assert_eq!(summary.guesses, 0);
        assert!(board.flagged().is_subset(board.mines()));
    }
}

#[test]
fn restored_2x2_is_already_won() {
    let board = Board::with_state(
        2,
        2,
        [p(0, 1), p(1, 1)],
        [p(1, 0), p(0, 0)],
        std::iter::empty(),
    )
    .unwrap();
    assert!(board.check_win());
    assert!(board.is_terminal());
}

#[test]
fn single_step_budget_selects_without_opening() {
    let mut board = Board::with_mines(5, 5, [p(2, 3)]).unwrap();
    let mut solver = Solver::new(SmallRng::seed_from_u64(0));
    assert!(solver.frontier().is_empty());

    let summary = solver.run(&mut board, Some(1));

    assert_eq!(summary.steps, 1);
    assert!(!solver.frontier().is_empty());
    assert!(board.revealed().is_empty());
    assert_eq!(summary.state, GameState::Playing);
}
