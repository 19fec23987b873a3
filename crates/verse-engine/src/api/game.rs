use serde::{Deserialize, Serialize};

use crate::api::error::EngineError;
use crate::api::types::GameKind;
use crate::content::verses::Verse;
use crate::core::rng::Rng;
use crate::puzzle::scoring::ScoringPolicy;
use crate::puzzle::token::DEFAULT_PUNCTUATION;
use crate::session::results::SessionSummary;

/// How verse text is cut into tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One tile per word.
    Words,
    /// Tiles of 2-4 consecutive words.
    Phrases,
}

/// Configuration for a puzzle mode, provided by the game.
#[derive(Debug, Clone, PartialEq)]
pub struct PuzzleConfig {
    /// Points awarded for a correct arrangement before bonuses (default: 50).
    pub base_points: u32,
    /// Bonus for finishing with the full time budget left (default: 50).
    pub time_bonus_max: u32,
    /// Points deducted per hint (default: 10).
    pub penalty_per_hint: u32,
    /// Hints the player may request per session (default: 5).
    pub hint_budget: u32,
    /// Countdown length in seconds (default: 30).
    pub time_budget_secs: u32,
    /// Tile granularity (default: words).
    pub granularity: Granularity,
    /// Characters stripped from verse text before tokenizing.
    pub punctuation: String,
    /// Verses per round (default: 10).
    pub verses_per_round: usize,
    /// Fixed RNG seed. `None` lets the host pick one.
    pub seed: Option<u64>,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self::word_tiles()
    }
}

impl PuzzleConfig {
    /// Word tiles against a short clock.
    pub fn word_tiles() -> Self {
        Self {
            base_points: 50,
            time_bonus_max: 50,
            penalty_per_hint: 10,
            hint_budget: 5,
            time_budget_secs: 30,
            granularity: Granularity::Words,
            punctuation: DEFAULT_PUNCTUATION.to_string(),
            verses_per_round: 10,
            seed: None,
        }
    }

    /// Phrase fragments against a two-minute clock.
    pub fn fragment_tiles() -> Self {
        Self {
            base_points: 500,
            time_bonus_max: 500,
            penalty_per_hint: 100,
            hint_budget: 3,
            time_budget_secs: 120,
            granularity: Granularity::Phrases,
            verses_per_round: 1,
            ..Self::word_tiles()
        }
    }

    /// Thousand-point scoring where each remaining second is worth 10 points.
    pub fn classic() -> Self {
        Self {
            base_points: 1000,
            time_bonus_max: 1200,
            penalty_per_hint: 50,
            hint_budget: 3,
            time_budget_secs: 120,
            granularity: Granularity::Phrases,
            verses_per_round: 1,
            ..Self::word_tiles()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn scoring(&self) -> ScoringPolicy {
        ScoringPolicy {
            base_points: self.base_points,
            time_bonus_max: self.time_bonus_max,
            penalty_per_hint: self.penalty_per_hint,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.time_budget_secs == 0 {
            return Err(EngineError::InvalidConfig {
                reason: "time budget must be at least one second".into(),
            });
        }
        if self.verses_per_round == 0 {
            return Err(EngineError::InvalidConfig {
                reason: "a round needs at least one verse".into(),
            });
        }
        Ok(())
    }
}

/// The contract every verse-arrangement mode must fulfill.
pub trait Game {
    /// Return the puzzle configuration. Called once before the first session.
    fn config(&self) -> PuzzleConfig {
        PuzzleConfig::default()
    }

    /// Which mode this is; selects storage keys and the progress record.
    fn kind(&self) -> GameKind;

    /// Supply the next verse to play.
    fn next_verse(&mut self, rng: &mut Rng) -> Result<Verse, EngineError>;

    /// Called when a stored session for `reference` is picked up again after a reload.
    fn resumed(&mut self, _reference: &str) {}

    /// Called once a session reaches a terminal outcome.
    fn finished(&mut self, _summary: &SessionSummary) {}
}
