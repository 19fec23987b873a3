use crate::api::error::EngineError;
use crate::api::game::PuzzleConfig;
use crate::api::types::{Outcome, Phase, SessionId};
use crate::content::verses::Verse;
use crate::core::rng::Rng;
use crate::puzzle::arrangement::{same_tiles, Arrangement};
use crate::puzzle::scoring::ScoringPolicy;
use crate::puzzle::token::{cut, scramble, Token};
use crate::puzzle::validate::is_correct;
use crate::session::results::SessionSummary;
use crate::session::snapshot::{SessionSnapshot, SNAPSHOT_VERSION};

/// One attempt at one verse.
///
/// `Idle -> Active -> Done(outcome)`. Moves are only accepted while Active.
/// The score is fixed at the terminal transition and never changes again;
/// "try again" means building a new session with a new id.
#[derive(Debug, Clone)]
pub struct PuzzleSession {
    id: SessionId,
    reference: String,
    source_text: String,
    tokens: Vec<Token>,
    arrangement: Arrangement,
    hints_used: u32,
    hint_budget: u32,
    time_budget: u32,
    time_remaining: u32,
    phase: Phase,
    score: Option<u32>,
    scoring: ScoringPolicy,
    rng: Rng,
}

impl PuzzleSession {
    /// Cut and scramble the verse. Fails with `ContentUnavailable` for empty text.
    pub fn new(
        id: SessionId,
        verse: &Verse,
        config: &PuzzleConfig,
        rng: &mut Rng,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let mut own = Rng::new(rng.next_u64());
        let tokens = cut(&verse.text, config.granularity, &config.punctuation, &mut own)?;
        let pool = scramble(&tokens, &mut own);
        Ok(Self {
            id,
            reference: verse.reference.clone(),
            source_text: verse.text.clone(),
            tokens,
            arrangement: Arrangement::new(pool),
            hints_used: 0,
            hint_budget: config.hint_budget,
            time_budget: config.time_budget_secs,
            time_remaining: config.time_budget_secs,
            phase: Phase::Idle,
            score: None,
            scoring: config.scoring(),
            rng: own,
        })
    }

    /// Rebuild a session from its snapshot.
    ///
    /// Rejects snapshots whose pool and arrangement do not add up to the
    /// canonical tokens, or whose counters are out of bounds.
    pub fn restore(snapshot: SessionSnapshot, config: &PuzzleConfig) -> Result<Self, EngineError> {
        if !snapshot.is_current() {
            return Err(EngineError::persistence(format!(
                "snapshot version {} is not {}",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        let mut all = snapshot.pool.clone();
        all.extend_from_slice(&snapshot.placed);
        if snapshot.tokens.is_empty() || !same_tiles(&all, &snapshot.tokens) {
            return Err(EngineError::persistence("snapshot tiles do not match its verse"));
        }
        if snapshot.hints_used > snapshot.hint_budget
            || snapshot.time_remaining_secs > snapshot.time_budget_secs
        {
            return Err(EngineError::persistence("snapshot counters out of range"));
        }
        Ok(Self {
            id: snapshot.session,
            reference: snapshot.reference,
            source_text: snapshot.source_text,
            tokens: snapshot.tokens,
            arrangement: Arrangement::from_parts(snapshot.pool, snapshot.placed),
            hints_used: snapshot.hints_used,
            hint_budget: snapshot.hint_budget,
            time_budget: snapshot.time_budget_secs,
            time_remaining: snapshot.time_remaining_secs,
            phase: snapshot.phase,
            score: snapshot.score,
            scoring: config.scoring(),
            rng: snapshot.rng,
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            session: self.id,
            reference: self.reference.clone(),
            source_text: self.source_text.clone(),
            tokens: self.tokens.clone(),
            pool: self.arrangement.pool().to_vec(),
            placed: self.arrangement.placed().to_vec(),
            hints_used: self.hints_used,
            hint_budget: self.hint_budget,
            time_budget_secs: self.time_budget,
            time_remaining_secs: self.time_remaining,
            phase: self.phase,
            score: self.score,
            rng: self.rng.clone(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Canonical tokens.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn arrangement(&self) -> &Arrangement {
        &self.arrangement
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    pub fn hints_left(&self) -> u32 {
        self.hint_budget.saturating_sub(self.hints_used)
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn time_budget(&self) -> u32 {
        self.time_budget
    }

    /// `None` until the session is done.
    pub fn score(&self) -> Option<u32> {
        self.score
    }

    /// Idle -> Active. Starts the clock.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.phase != Phase::Idle {
            return Err(EngineError::SessionInactive(self.id));
        }
        self.phase = Phase::Active;
        log::info!("session {} started: {}", self.id, self.reference);
        Ok(())
    }

    /// One second of countdown addressed to session `id`.
    ///
    /// Ticks for another session or for a session that is not Active are
    /// ignored. Returns the outcome when this tick ends the session.
    pub fn tick(&mut self, id: SessionId) -> Option<Outcome> {
        if id != self.id {
            log::warn!("ignoring tick for {} in session {}", id, self.id);
            return None;
        }
        if !self.is_active() {
            return None;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            self.finish(Outcome::TimedOut);
            return Some(Outcome::TimedOut);
        }
        None
    }

    pub fn place(&mut self, index: usize, at: Option<usize>) -> Result<(), EngineError> {
        self.ensure_active()?;
        self.arrangement.place(index, at)?;
        log::debug!("session {}: placed tile {}", self.id, index);
        Ok(())
    }

    pub fn remove(&mut self, position: usize) -> Result<(), EngineError> {
        self.ensure_active()?;
        let token = self.arrangement.remove(position)?;
        log::debug!("session {}: removed tile {}", self.id, token.index);
        Ok(())
    }

    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), EngineError> {
        self.ensure_active()?;
        self.arrangement.swap(a, b)
    }

    pub fn move_to(&mut self, from: usize, to: usize) -> Result<(), EngineError> {
        self.ensure_active()?;
        self.arrangement.move_to(from, to)
    }

    /// Every tile back to the pool, freshly scrambled. Hints and time are kept.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        self.ensure_active()?;
        self.arrangement.reset(&mut self.rng);
        Ok(())
    }

    /// Place the next correct tile. Returns the hints left afterwards.
    pub fn use_hint(&mut self) -> Result<u32, EngineError> {
        self.ensure_active()?;
        if self.hints_used >= self.hint_budget {
            return Err(EngineError::HintUnavailable);
        }
        if !is_correct(self.arrangement.placed(), &self.tokens[..self.arrangement.placed().len()]) {
            // The placed prefix is already wrong; there is no "next" tile to give.
            return Err(EngineError::HintUnavailable);
        }
        self.arrangement.place_next(&self.tokens)?;
        self.hints_used += 1;
        Ok(self.hints_left())
    }

    /// Check the arrangement and end the session.
    pub fn submit(&mut self) -> Result<Outcome, EngineError> {
        self.ensure_active()?;
        let outcome = if is_correct(self.arrangement.placed(), &self.tokens) {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        };
        self.finish(outcome);
        Ok(outcome)
    }

    /// Leave the puzzle without an answer.
    pub fn abandon(&mut self) -> Result<(), EngineError> {
        if self.phase.is_terminal() {
            return Err(EngineError::SessionInactive(self.id));
        }
        self.finish(Outcome::Abandoned);
        Ok(())
    }

    /// `None` until the session is done.
    pub fn summary(&self) -> Option<SessionSummary> {
        Some(SessionSummary {
            session: self.id,
            reference: self.reference.clone(),
            outcome: self.phase.outcome()?,
            score: self.score?,
            hints_used: self.hints_used,
            time_remaining_secs: self.time_remaining,
            time_budget_secs: self.time_budget,
        })
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
            self.hint_budget,
        );
        self.phase = Phase::Done(outcome);
        self.score = Some(score);
        log::info!(
            "session {} finished: {:?}, score {}",
            self.id,
            outcome,
            score
        );
    }
}
