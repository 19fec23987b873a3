pub mod reviews;
pub mod runner;
pub mod storage;

pub use reviews::ReviewReply;
pub use runner::{GameRunner, SessionView};
pub use storage::LocalStorage;
pub use verse_engine;

/// Generate all `#[wasm_bindgen]` exports for a verse arrangement game.
///
/// This macro generates:
/// - `thread_local!` storage for the GameRunner
/// - `with_runner()` helper function
/// - All wasm-bindgen exports (game_init, game_tick, player moves, state accessors)
///
/// # Usage
///
/// ```ignore
/// use wasm_bindgen::prelude::*;
///
/// mod game;
/// use game::MyPuzzle;
///
/// verse_web::export_game!(MyPuzzle, "my-puzzle");
/// ```
///
/// # Arguments
///
/// - `$game_type`: The game struct type that implements `verse_engine::Game`
///   and has a `new()` constructor
/// - `$game_name`: A string literal used in the initialization log message
#[macro_export]
macro_rules! export_game {
    ($game_type:ty, $game_name:literal) => {
        use std::cell::RefCell;
        use $crate::verse_engine::{PlayerAction, PlayerId, PlayerProgress};

        type Runner = $crate::GameRunner<$game_type, $crate::LocalStorage>;

        thread_local! {
            static RUNNER: RefCell<Option<Runner>> = RefCell::new(None);
        }

        fn with_runner<R>(f: impl FnOnce(&mut Runner) -> R) -> R {
            RUNNER.with(|cell| {
                let mut borrow = cell.borrow_mut();
                let runner = borrow.as_mut().expect("Game not initialized. Call game_init() first.");
                f(runner)
            })
        }

        /// `player` is the signed-in user id, or empty for a guest.
        #[wasm_bindgen]
        pub fn game_init(player: &str) {
            console_error_panic_hook::set_once();
            let _ = console_log::init_with_level(log::Level::Info);

            let game = <$game_type>::new();
            let runner = $crate::GameRunner::new(game, $crate::LocalStorage::open());

            RUNNER.with(|cell| {
                *cell.borrow_mut() = Some(runner);
            });

            let player = if player.is_empty() {
                PlayerId::guest()
            } else {
                PlayerId(player.to_string())
            };
            let now = js_sys::Date::now();
            with_runner(|r| {
                r.set_now(now as u64);
                r.init(now.to_bits(), player);
            });
            log::info!("{}: initialized", $game_name);
        }

        #[wasm_bindgen]
        pub fn game_tick(dt: f32) {
            let now = js_sys::Date::now() as u64;
            with_runner(|r| {
                r.set_now(now);
                r.tick(dt);
            });
        }

        #[wasm_bindgen]
        pub fn game_place(token: usize) {
            with_runner(|r| r.push_input(PlayerAction::Place { token, at: None }));
        }

        #[wasm_bindgen]
        pub fn game_place_at(token: usize, at: usize) {
            with_runner(|r| r.push_input(PlayerAction::Place { token, at: Some(at) }));
        }

        #[wasm_bindgen]
        pub fn game_remove(position: usize) {
            with_runner(|r| r.push_input(PlayerAction::Remove { position }));
        }

        #[wasm_bindgen]
        pub fn game_swap(a: usize, b: usize) {
            with_runner(|r| r.push_input(PlayerAction::Swap { a, b }));
        }

        #[wasm_bindgen]
        pub fn game_move(from: usize, to: usize) {
            with_runner(|r| r.push_input(PlayerAction::Move { from, to }));
        }

        #[wasm_bindgen]
        pub fn game_hint() {
            with_runner(|r| r.push_input(PlayerAction::Hint));
        }

        #[wasm_bindgen]
        pub fn game_submit() {
            with_runner(|r| r.push_input(PlayerAction::Submit));
        }

        #[wasm_bindgen]
        pub fn game_reset() {
            with_runner(|r| r.push_input(PlayerAction::Reset));
        }

        #[wasm_bindgen]
        pub fn game_abandon() {
            with_runner(|r| r.push_input(PlayerAction::Abandon));
        }

        #[wasm_bindgen]
        pub fn game_next() {
            with_runner(|r| r.next());
        }

        #[wasm_bindgen]
        pub fn game_set_online(online: bool) {
            with_runner(|r| r.set_online(online));
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
                        log::warn!("{}: ignoring remote progress: {}", $game_name, e);
                        None
                    }
                }
            };
            with_runner(|r| r.adopt_remote(remote));
        }

        // ---- Data accessors ----

        #[wasm_bindgen]
        pub fn get_state_json() -> String {
            with_runner(|r| r.state_json())
        }

        #[wasm_bindgen]
        pub fn take_events_json() -> String {
            with_runner(|r| r.take_events_json())
        }

        #[wasm_bindgen]
        pub fn get_progress_json() -> String {
            with_runner(|r| r.progress_json())
        }

        #[wasm_bindgen]
        pub fn get_round_json() -> String {
            with_runner(|r| r.round_json())
        }
    };
}
