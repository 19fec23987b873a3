use std::cell::RefCell;
use wasm_bindgen::prelude::*;
use verse_engine::{PlayerId, PlayerProgress};
use verse_web::LocalStorage;

mod board;
mod game;
mod split;

pub use board::{Card, Choice, MatchBoard, MatchError, MatchOption};
pub use game::{embedded_verses, BoardSnapshot, MatchGame, MatchView, VERSES_PER_ROUND};
pub use split::split_verse;

type Runner = MatchGame<LocalStorage>;

thread_local! {
    static GAME: RefCell<Option<Runner>> = RefCell::new(None);
}

fn with_game<R>(f: impl FnOnce(&mut Runner) -> R) -> R {
    GAME.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let game = borrow.as_mut().expect("Game not initialized. Call game_init() first.");
        f(game)
    })
}

/// `player` is the signed-in user id, or empty for a guest.
#[wasm_bindgen]
pub fn game_init(player: &str) {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let game = MatchGame::new(embedded_verses(), LocalStorage::open());
    GAME.with(|cell| {
        *cell.borrow_mut() = Some(game);
    });

    let player = if player.is_empty() {
        PlayerId::guest()
    } else {
        PlayerId(player.to_string())
    };
    let now = js_sys::Date::now();
    with_game(|g| {
        g.set_now(now as u64);
        g.init(now.to_bits(), player);
    });
    log::info!("match-the-verse: initialized");
}

#[wasm_bindgen]
pub fn game_tick(dt: f32) {
    let now = js_sys::Date::now() as u64;
    with_game(|g| {
        g.set_now(now);
        g.tick(dt);
    });
}

#[wasm_bindgen]
pub fn game_reveal(card: usize) {
    with_game(|g| g.reveal(card));
}

#[wasm_bindgen]
pub fn game_choose(option: usize) {
    with_game(|g| g.choose(option));
}

#[wasm_bindgen]
pub fn game_abandon() {
    with_game(|g| g.abandon());
}

#[wasm_bindgen]
pub fn game_next() {
    with_game(|g| g.next());
}

#[wasm_bindgen]
pub fn game_set_online(online: bool) {
    with_game(|g| g.set_online(online));
}

/// Hand over the record fetched from the remote store (empty for none).
#[wasm_bindgen]
pub fn game_sync_progress(json: &str) {
    let remote = if json.is_empty() {
        None
    } else {
        match serde_json::from_str::<PlayerProgress>(json) {
            Ok(progress) => Some(progress),
            Err(e) => {
                log::warn!("match-the-verse: ignoring remote progress: {}", e);
                None
            }
        }
    };
    with_game(|g| g.adopt_remote(remote));
}

// ---- Data accessors ----

#[wasm_bindgen]
pub fn get_state_json() -> String {
    with_game(|g| g.state_json())
}

#[wasm_bindgen]
pub fn take_events_json() -> String {
    with_game(|g| g.take_events_json())
}

#[wasm_bindgen]
pub fn get_progress_json() -> String {
    with_game(|g| g.progress_json())
}
