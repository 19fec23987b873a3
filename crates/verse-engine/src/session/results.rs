use serde::{Deserialize, Serialize};

use crate::api::types::{Outcome, SessionId};

/// Read-only report of a finished session, handed to result screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session: SessionId,
    pub reference: String,
    pub outcome: Outcome,
    pub score: u32,
    pub hints_used: u32,
    pub time_remaining_secs: u32,
    pub time_budget_secs: u32,
}

impl SessionSummary {
    pub fn elapsed_secs(&self) -> u32 {
        self.time_budget_secs.saturating_sub(self.time_remaining_secs)
    }
}

/// Totals for a multi-verse round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResults {
    pub summaries: Vec<SessionSummary>,
}

impl RoundResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, summary: SessionSummary) {
        self.summaries.push(summary);
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    pub fn total_score(&self) -> u32 {
        self.summaries.iter().map(|s| s.score).sum()
    }

    pub fn correct_count(&self) -> usize {
        self.summaries
            .iter()
            .filter(|s| s.outcome.is_success())
            .count()
    }

    pub fn hints_used(&self) -> u32 {
        self.summaries.iter().map(|s| s.hints_used).sum()
    }

    /// Share of correct verses, 0-100.
    pub fn accuracy_percent(&self) -> u32 {
        if self.summaries.is_empty() {
            return 0;
        }
        (self.correct_count() * 100 / self.summaries.len()) as u32
    }
}
