pub mod api;
pub mod core;
pub mod content;
pub mod puzzle;
pub mod session;
pub mod storage;
pub mod progress;
pub mod input;

// Re-export key types at crate root for convenience
pub use api::error::EngineError;
pub use api::game::{Game, Granularity, PuzzleConfig};
pub use api::types::{GameEvent, GameKind, Outcome, Phase, SessionId};
pub use content::verses::{Verse, VerseDb};
pub use core::rng::Rng;
pub use core::time::Countdown;
pub use puzzle::arrangement::Arrangement;
pub use puzzle::scoring::ScoringPolicy;
pub use puzzle::token::{Token, DEFAULT_PUNCTUATION};
pub use puzzle::validate::{answers_match, is_correct};
pub use session::puzzle::PuzzleSession;
pub use session::results::{RoundResults, SessionSummary};
pub use session::snapshot::{SessionSnapshot, SNAPSHOT_VERSION};
pub use storage::store::{KeyValueStore, MemoryStore, StoreError};
pub use input::queue::{InputQueue, PlayerAction};
pub use progress::app_state::{AppState, PlayerId};
pub use progress::player::{reconcile, Achievement, LevelReport, PlayerProgress};
pub use progress::reviews::{NewReview, Review, ReviewBook, ReviewError, REVIEWS_KEY};
