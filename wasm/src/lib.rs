use minesweeper_dssp as ms;
use wasm_bindgen::prelude::*;

fn load(bts: &[u8]) -> Result<ms::Game, String> {
    ms::Game::deserialize(bts).map_err(|e| e.to_string())
}

fn save(game: &ms::Game) -> Result<Vec<u8>, String> {
    game.serialize().map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn create_game(rows: usize, cols: usize, mines: usize, seed: u64) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let config = ms::GameConfig::new(rows, cols, mines).map_err(|e| e.to_string())?;
    let game = ms::Game::new(config, seed).map_err(|e| e.to_string())?;
    save(&game)
}

/// Advances the solver by one phase. The display polls this on its own timer
/// and stops once `status` is non-zero.
#[wasm_bindgen]
pub fn step(bts: Vec<u8>, seed: u64) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = load(&bts)?;
    game.step(seed);
    save(&game)
}

#[wasm_bindgen]
pub fn open(bts: Vec<u8>, row: usize, col: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = load(&bts)?;
    game.open(ms::Point { row, col });
    save(&game)
}

#[wasm_bindgen]
pub fn flag(bts: Vec<u8>, row: usize, col: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = load(&bts)?;
    game.toggle_flag(ms::Point { row, col });
    save(&game)
}

/// 0 while playing, 1 once won, 2 once lost, 3 when the solver has no cell
/// left to pick on an unfinished board.
#[wasm_bindgen]
pub fn status(bts: Vec<u8>) -> Result<u8, String> {
    console_error_panic_hook::set_once();

    let game = load(&bts)?;
    Ok(match game.board.state() {
        ms::GameState::Playing if game.is_stalled() => 3,
        ms::GameState::Playing => 0,
        ms::GameState::Won => 1,
        ms::GameState::Lost => 2,
    })
}

/// Row-major cells: -2 flagged, -1 hidden, otherwise the adjacent mine count.
#[wasm_bindgen]
pub fn get_cells(bts: Vec<u8>) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let game = load(&bts)?;
    Ok(game
        .board
        .cells()
        .into_iter()
        .flatten()
        .map(|cell| match cell {
            ms::Cell::Flagged => -2,
            ms::Cell::Hidden => -1,
            ms::Cell::Revealed(n) => n as i8,
        })
        .collect())
}
