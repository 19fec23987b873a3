use serde::{Deserialize, Serialize};
use verse_engine::{answers_match, EngineError, Outcome, Phase, ScoringPolicy, SessionId, SessionSummary};

use crate::characters::Character;
use crate::levels::LevelSpec;

/// One attempt at naming one character.
///
/// The first hint is showing from the start and costs nothing; every further
/// hint costs an equal share of the level's points. Wrong guesses keep the
/// round open until the clock runs out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRound {
    id: SessionId,
    character: Character,
    level: u32,
    revealed: u32,
    hints_used: u32,
    max_hints: u32,
    time_budget: u32,
    time_remaining: u32,
    wrong_guesses: u32,
    phase: Phase,
    score: Option<u32>,
    scoring: ScoringPolicy,
}

impl CharacterRound {
    pub fn new(id: SessionId, character: Character, spec: &LevelSpec) -> Result<Self, EngineError> {
        if character.hints.is_empty() || character.name.trim().is_empty() {
            return Err(EngineError::content("character has no hints"));
        }
        Ok(Self {
            id,
            level: spec.level,
            revealed: 1,
            hints_used: 0,
            max_hints: spec.max_hints.max(1).min(character.hints.len() as u32),
            time_budget: spec.time_limit_secs,
            time_remaining: spec.time_limit_secs,
            wrong_guesses: 0,
            phase: Phase::Idle,
            score: None,
            scoring: spec.scoring(),
            character,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn revealed_hints(&self) -> &[String] {
        &self.character.hints[..self.revealed as usize]
    }

    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    pub fn hints_left(&self) -> u32 {
        self.max_hints.saturating_sub(self.revealed)
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn wrong_guesses(&self) -> u32 {
        self.wrong_guesses
    }

    pub fn score(&self) -> Option<u32> {
        self.score
    }

    /// Points a correct guess would earn right now.
    pub fn potential_score(&self) -> u32 {
        self.scoring.compute(
            Outcome::Correct,
            self.time_remaining,
            self.time_budget,
            self.hints_used,
            self.max_hints,
        )
    }

    /// The name, once the round is over.
    pub fn answer(&self) -> Option<&str> {
        self.phase.is_terminal().then_some(self.character.name.as_str())
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.phase != Phase::Idle {
            return Err(EngineError::SessionInactive(self.id));
        }
        self.phase = Phase::Active;
        Ok(())
    }

    pub fn tick(&mut self, id: SessionId) -> Option<Outcome> {
        if id != self.id || !self.is_active() {
            return None;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            self.finish(Outcome::TimedOut);
            return Some(Outcome::TimedOut);
        }
        None
    }

    /// Show the next hint. Returns it.
    pub fn reveal_hint(&mut self) -> Result<&str, EngineError> {
        self.ensure_active()?;
        if self.revealed >= self.max_hints {
            return Err(EngineError::HintUnavailable);
        }
        self.revealed += 1;
        self.hints_used += 1;
        Ok(&self.character.hints[self.revealed as usize - 1])
    }

    /// Check a typed name. A correct guess ends the round; a wrong one does not.
    pub fn guess(&mut self, text: &str) -> Result<bool, EngineError> {
        self.ensure_active()?;
        if answers_match(text, &self.character.name) {
            self.finish(Outcome::Correct);
            Ok(true)
        } else {
            self.wrong_guesses += 1;
            Ok(false)
        }
    }

    pub fn abandon(&mut self) -> Result<(), EngineError> {
        if self.phase.is_terminal() {
            return Err(EngineError::SessionInactive(self.id));
        }
        self.finish(Outcome::Abandoned);
        Ok(())
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        Some(SessionSummary {
            session: self.id,
            reference: format!("Level {}", self.level),
            outcome: self.phase.outcome()?,
            score: self.score?,
            hints_used: self.hints_used,
            time_remaining_secs: self.time_remaining,
            time_budget_secs: self.time_budget,
        })
    }

    /// Reject rounds whose counters cannot have come from play.
    pub fn is_consistent(&self) -> bool {
        self.revealed >= 1
            && self.revealed <= self.max_hints
            && self.max_hints as usize <= self.character.hints.len()
            && self.hints_used + 1 == self.revealed
            && self.time_remaining <= self.time_budget
    }

    fn ensure_active(&self) -> Result<(), EngineError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(EngineError::SessionInactive(self.id))
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        let score = self.scoring.compute(
            outcome,
            self.time_remaining,
            self.time_budget,
            self.hints_used,
            self.max_hints,
        );
        self.phase = Phase::Done(outcome);
        self.score = Some(score);
        log::info!("round {} finished: {:?}, score {}", self.id, outcome, score);
    }
}
