use std::cell::RefCell;
use wasm_bindgen::prelude::*;
use verse_engine::{PlayerId, PlayerProgress};
use verse_web::LocalStorage;

mod characters;
mod game;
mod levels;
mod round;

pub use characters::{Character, CharacterDb};
pub use game::{CharacterGame, CharacterView, RoundSnapshot};
pub use levels::{level_spec, Difficulty, LevelSpec, LEVELS};
pub use round::CharacterRound;

type Runner = CharacterGame<LocalStorage>;

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

    let game = CharacterGame::new(CharacterDb::embedded(), LocalStorage::open());
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
    log::info!("guess-the-character: initialized");
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
pub fn game_hint() {
    with_game(|g| g.reveal_hint());
}

#[wasm_bindgen]
pub fn game_guess(answer: &str) {
    with_game(|g| g.guess(answer));
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
                log::warn!("guess-the-character: ignoring remote progress: {}", e);
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
