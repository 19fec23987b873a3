use serde::{Deserialize, Serialize};

use crate::api::types::Outcome;

/// Time- and hint-decayed scoring.
///
/// `base + remaining / budget * time_bonus_max - hints * penalty_per_hint`,
/// truncated and floored at zero. Anything but a correct outcome scores 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub base_points: u32,
    pub time_bonus_max: u32,
    pub penalty_per_hint: u32,
}

impl ScoringPolicy {
    pub fn time_bonus(&self, time_remaining: u32, time_budget: u32) -> u32 {
        if time_budget == 0 {
            return 0;
        }
        let remaining = u64::from(time_remaining.min(time_budget));
        (remaining * u64::from(self.time_bonus_max) / u64::from(time_budget)) as u32
    }

    pub fn compute(
        &self,
        outcome: Outcome,
        time_remaining: u32,
        time_budget: u32,
        hints_used: u32,
        hint_budget: u32,
    ) -> u32 {
        if outcome != Outcome::Correct {
            return 0;
        }
        let earned = u64::from(self.base_points)
            + u64::from(self.time_bonus(time_remaining, time_budget));
        let penalty =
            u64::from(hints_used.min(hint_budget)) * u64::from(self.penalty_per_hint);
        earned.saturating_sub(penalty).min(u64::from(u32::MAX)) as u32
    }
}
