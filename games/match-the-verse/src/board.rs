use serde::{Deserialize, Serialize};
use verse_engine::{EngineError, Outcome, Phase, Rng, SessionId, SessionSummary, Verse};

use crate::split::split_verse;

const POINTS_PER_MATCH: u32 = 100;
const QUICK_BONUS: u32 = 50;
const QUICK_WITHIN_SECS: f32 = 5.0;
const STREAK_BONUS: u32 = 25;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("card {0} does not exist")]
    UnknownCard(usize),
    #[error("option {0} does not exist")]
    UnknownOption(usize),
    #[error("card {0} is locked while another card is open")]
    CardLocked(usize),
    #[error("card {0} is already matched")]
    AlreadyMatched(usize),
    #[error("reveal a card before choosing an ending")]
    NothingRevealed,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// The opening of a verse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: usize,
    pub reference: String,
    pub first_half: String,
    pub matched: bool,
    pub incorrect_attempts: u32,
}

/// The ending of a verse. `id` is the card it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOption {
    pub id: usize,
    pub second_half: String,
}

/// Result of one choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub correct: bool,
    pub points: u32,
    pub streak: u32,
}

/// A round of verse matching.
///
/// Revealing a card locks the others until an ending is chosen. A correct
/// choice pays 100, 50 more inside five seconds, and 25 per streak step; a
/// wrong one breaks the streak and counts against the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchBoard {
    id: SessionId,
    cards: Vec<Card>,
    options: Vec<MatchOption>,
    selected: Option<usize>,
    reveal_secs: f32,
    elapsed_secs: f32,
    score: u32,
    streak: u32,
    phase: Phase,
}

impl MatchBoard {
    /// Split every verse and shuffle the endings. `streak` carries over from
    /// earlier rounds.
    pub fn new(id: SessionId, verses: &[Verse], streak: u32, rng: &mut Rng) -> Result<Self, EngineError> {
        if verses.is_empty() {
            return Err(EngineError::content("no verses to match"));
        }
        let mut cards = Vec::with_capacity(verses.len());
        let mut options = Vec::with_capacity(verses.len());
        for (id, verse) in verses.iter().enumerate() {
            let (first_half, second_half) = split_verse(&verse.text)?;
            cards.push(Card {
                id,
                reference: verse.reference.clone(),
                first_half,
                matched: false,
                incorrect_attempts: 0,
            });
            options.push(MatchOption { id, second_half });
        }
        rng.shuffle(&mut options);
        Ok(Self {
            id,
            cards,
            options,
            selected: None,
            reveal_secs: 0.0,
            elapsed_secs: 0.0,
            score: 0,
            streak,
            phase: Phase::Active,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Endings not yet matched, in display order.
    pub fn options(&self) -> &[MatchOption] {
        &self.options
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed_secs
    }

    pub fn matched_count(&self) -> usize {
        self.cards.iter().filter(|c| c.matched).count()
    }

    pub fn is_complete(&self) -> bool {
        self.cards.iter().all(|c| c.matched)
    }

    /// Cards over total attempts, as a rounded percentage.
    pub fn accuracy_percent(&self) -> u32 {
        let attempts: u32 = self.cards.iter().map(|c| c.incorrect_attempts + 1).sum();
        if attempts == 0 {
            return 0;
        }
        let cards = self.cards.len() as u32;
        (cards * 200 + attempts) / (attempts * 2)
    }

    pub fn references(&self) -> Vec<String> {
        self.cards.iter().map(|c| c.reference.clone()).collect()
    }

    /// Advance the round clock and the open card's timer.
    pub fn advance(&mut self, dt: f32) {
        if self.phase != Phase::Active || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.elapsed_secs += dt;
        if self.selected.is_some() {
            self.reveal_secs += dt;
        }
    }

    pub fn reveal(&mut self, card: usize) -> Result<(), MatchError> {
        self.ensure_active()?;
        let target = self.cards.get(card).ok_or(MatchError::UnknownCard(card))?;
        if target.matched {
            return Err(MatchError::AlreadyMatched(card));
        }
        match self.selected {
            Some(open) if open == card => return Ok(()),
            Some(_) => return Err(MatchError::CardLocked(card)),
            None => {}
        }
        self.selected = Some(card);
        self.reveal_secs = 0.0;
        Ok(())
    }

    /// Pick an ending for the open card.
    pub fn choose(&mut self, option: usize) -> Result<Choice, MatchError> {
        self.ensure_active()?;
        let card = self.selected.ok_or(MatchError::NothingRevealed)?;
        let slot = self
            .options
            .iter()
            .position(|o| o.id == option)
            .ok_or(MatchError::UnknownOption(option))?;

        self.selected = None;
        let choice = if option == card {
            self.streak += 1;
            let quick = if self.reveal_secs <= QUICK_WITHIN_SECS {
                QUICK_BONUS
            } else {
                0
            };
            let points = POINTS_PER_MATCH + quick + self.streak * STREAK_BONUS;
            self.score += points;
            self.cards[card].matched = true;
            self.options.remove(slot);
            Choice {
                correct: true,
                points,
                streak: self.streak,
            }
        } else {
            self.streak = 0;
            self.cards[card].incorrect_attempts += 1;
            Choice {
                correct: false,
                points: 0,
                streak: 0,
            }
        };
        if self.is_complete() {
            self.phase = Phase::Done(Outcome::Correct);
        }
        Ok(choice)
    }

    pub fn abandon(&mut self) -> Result<(), MatchError> {
        self.ensure_active()?;
        self.selected = None;
        self.phase = Phase::Done(Outcome::Abandoned);
        Ok(())
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        let outcome = self.phase.outcome()?;
        // Untimed: the clock only counts up.
        Some(SessionSummary {
            session: self.id,
            reference: self.references().join(", "),
            outcome,
            score: if outcome.is_success() { self.score } else { 0 },
            hints_used: 0,
            time_remaining_secs: 0,
            time_budget_secs: 0,
        })
    }

    /// Endings and cards must pair up one to one.
    pub fn is_consistent(&self) -> bool {
        let unmatched: Vec<usize> = self.cards.iter().filter(|c| !c.matched).map(|c| c.id).collect();
        let mut open: Vec<usize> = self.options.iter().map(|o| o.id).collect();
        open.sort_unstable();
        self.cards.iter().enumerate().all(|(i, c)| c.id == i)
            && unmatched == open
            && self.selected.map_or(true, |s| unmatched.contains(&s))
    }

    fn ensure_active(&self) -> Result<(), MatchError> {
        if self.phase == Phase::Active {
            Ok(())
        } else {
            Err(EngineError::SessionInactive(self.id).into())
        }
    }
}
