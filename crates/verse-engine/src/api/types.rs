use std::fmt;

use serde::{Deserialize, Serialize};

use crate::progress::player::Achievement;
use crate::session::results::SessionSummary;

/// Unique identifier for a puzzle session.
/// A fresh id is issued for every attempt, including "try again".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a finished session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Incorrect,
    TimedOut,
    /// The player left the puzzle before submitting.
    Abandoned,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Correct)
    }
}

/// Lifecycle phase of a session.
///
/// `Idle -> Active -> Done(_)`. `Done` is a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase", content = "outcome")]
pub enum Phase {
    Idle,
    Active,
    Done(Outcome),
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done(_))
    }

    pub fn outcome(self) -> Option<Outcome> {
        match self {
            Phase::Done(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// The game modes the application ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameKind {
    VersePuzzle,
    GuessTheCharacter,
    MatchTheVerse,
}

impl GameKind {
    pub const ALL: [GameKind; 3] = [
        GameKind::VersePuzzle,
        GameKind::GuessTheCharacter,
        GameKind::MatchTheVerse,
    ];

    /// Storage key for the in-progress snapshot of this mode.
    pub fn snapshot_key(self) -> &'static str {
        match self {
            GameKind::VersePuzzle => "bibleVersePuzzle_progress",
            GameKind::GuessTheCharacter => "guessTheCharacter_progress",
            GameKind::MatchTheVerse => "matchTheVerse_progress",
        }
    }

    /// Short stable name used inside progress keys.
    pub fn slug(self) -> &'static str {
        match self {
            GameKind::VersePuzzle => "verse-puzzle",
            GameKind::GuessTheCharacter => "guess-the-character",
            GameKind::MatchTheVerse => "match-the-verse",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        GameKind::ALL.into_iter().find(|k| k.slug() == slug)
    }

    /// Human-readable title shown in result screens.
    pub fn title(self) -> &'static str {
        match self {
            GameKind::VersePuzzle => "Bible Verse Puzzle",
            GameKind::GuessTheCharacter => "Guess the Character",
            GameKind::MatchTheVerse => "Match the Verse",
        }
    }
}

/// A game event communicated from Rust to the UI layer.
/// Drained once per frame and serialized as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    SessionStarted { session: SessionId, reference: String },
    SessionResumed { session: SessionId, reference: String },
    ActionRejected { reason: String },
    HintUsed { hints_used: u32, hints_left: u32 },
    /// A single answer inside a session: a typed guess or a card match.
    Answered { correct: bool, points: u32, streak: u32 },
    Finished { summary: SessionSummary },
    AchievementUnlocked { achievement: Achievement },
    ContentError { reason: String },
}
