use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::api::types::Outcome;
use crate::session::results::SessionSummary;

const STREAK_MASTER_AT: u32 = 5;
const SPEED_RUNNER_UNDER_SECS: u32 = 60;

/// Badges a player can earn. Each is unlocked at most once per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    /// Correct answer without any hint.
    PerfectAnswer,
    /// Five correct answers in a row.
    StreakMaster,
    /// Correct answer in under a minute.
    SpeedRunner,
    /// Every card of a round matched on the first try.
    PerfectScore,
}

impl Achievement {
    pub fn title(self) -> &'static str {
        match self {
            Achievement::PerfectAnswer => "Perfect Answer",
            Achievement::StreakMaster => "Streak Master",
            Achievement::SpeedRunner => "Speed Runner",
            Achievement::PerfectScore => "Perfect Score",
        }
    }
}

/// What a finished level or round contributes to progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelReport {
    pub outcome: Outcome,
    pub score: u32,
    pub hints_used: u32,
    pub elapsed_secs: u32,
    /// Round accuracy, 0-100, for modes that track attempts.
    pub accuracy_percent: Option<u32>,
    /// Content played, remembered so it is not served again soon.
    pub played: Vec<String>,
    /// Streak counted inside the level, for modes that score several answers
    /// per level. Replaces the per-level streak when present.
    pub answer_streak: Option<u32>,
}

impl From<&SessionSummary> for LevelReport {
    fn from(summary: &SessionSummary) -> Self {
        Self {
            outcome: summary.outcome,
            score: summary.score,
            hints_used: summary.hints_used,
            elapsed_secs: summary.elapsed_secs(),
            accuracy_percent: None,
            played: vec![summary.reference.clone()],
            answer_streak: None,
        }
    }
}

/// Long-lived per-player, per-mode record.
///
/// Missing fields in a stored record take their defaults, so older or
/// partial records still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerProgress {
    pub level: u32,
    pub total_score: u64,
    pub streak: u32,
    pub best_streak: u32,
    pub completed_levels: BTreeSet<u32>,
    pub achievements: BTreeSet<Achievement>,
    pub hints_used: u32,
    /// Milliseconds since the Unix epoch, as reported by the host.
    pub last_played: Option<u64>,
    /// References or names already played. Cleared once the caller runs out.
    pub played: Vec<String>,
}

impl Default for PlayerProgress {
    fn default() -> Self {
        Self {
            level: 1,
            total_score: 0,
            streak: 0,
            best_streak: 0,
            completed_levels: BTreeSet::new(),
            achievements: BTreeSet::new(),
            hints_used: 0,
            last_played: None,
            played: Vec::new(),
        }
    }
}

impl PlayerProgress {
    /// Fold a finished level into the record. Returns achievements unlocked by it.
    pub fn record(&mut self, report: &LevelReport, now_ms: u64) -> Vec<Achievement> {
        self.last_played = Some(now_ms);
        self.hints_used = self.hints_used.saturating_add(report.hints_used);
        for item in &report.played {
            if !self.played.contains(item) {
                self.played.push(item.clone());
            }
        }

        let mut earned = Vec::new();
        if report.outcome.is_success() {
            self.total_score += u64::from(report.score);
            self.streak = report.answer_streak.unwrap_or(self.streak + 1);
            self.best_streak = self.best_streak.max(self.streak);
            self.completed_levels.insert(self.level);
            self.level += 1;

            if report.hints_used == 0 {
                earned.push(Achievement::PerfectAnswer);
            }
            if self.streak >= STREAK_MASTER_AT {
                earned.push(Achievement::StreakMaster);
            }
            if report.elapsed_secs < SPEED_RUNNER_UNDER_SECS {
                earned.push(Achievement::SpeedRunner);
            }
            if report.accuracy_percent == Some(100) {
                earned.push(Achievement::PerfectScore);
            }
        } else {
            self.streak = 0;
        }

        earned.retain(|a| self.achievements.insert(*a));
        earned
    }

    /// Forget played content, e.g. after every character has been used.
    pub fn clear_played(&mut self) {
        self.played.clear();
    }
}

/// Choose between the local record and the one from the remote store.
///
/// Online, a remote record overrides local. Offline, or with no remote
/// record, local stays authoritative.
pub fn reconcile(local: PlayerProgress, remote: Option<PlayerProgress>, online: bool) -> PlayerProgress {
    match remote {
        Some(remote) if online => remote,
        _ => local,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: Outcome, hints_used: u32, elapsed_secs: u32) -> LevelReport {
        LevelReport {
            outcome,
            score: 80,
            hints_used,
            elapsed_secs,
            accuracy_percent: None,
            played: vec!["John 3:16".into()],
            answer_streak: None,
        }
    }

    #[test]
    fn defaults_start_at_level_one() {
        let p = PlayerProgress::default();
        assert_eq!(p.level, 1);
        assert!(p.achievements.is_empty());
    }

    #[test]
    fn correct_answer_advances_level() {
        let mut p = PlayerProgress::default();
        let earned = p.record(&report(Outcome::Correct, 1, 90), 1000);
        assert!(earned.is_empty());
        assert_eq!(p.level, 2);
        assert_eq!(p.total_score, 80);
        assert_eq!(p.streak, 1);
        assert!(p.completed_levels.contains(&1));
        assert_eq!(p.last_played, Some(1000));
    }

    #[test]
    fn failure_resets_streak_but_keeps_best() {
        let mut p = PlayerProgress::default();
        p.record(&report(Outcome::Correct, 1, 90), 0);
        p.record(&report(Outcome::Correct, 1, 90), 0);
        p.record(&report(Outcome::TimedOut, 0, 30), 0);
        assert_eq!(p.streak, 0);
        assert_eq!(p.best_streak, 2);
        assert_eq!(p.level, 3);
        assert_eq!(p.hints_used, 2);
    }

    #[test]
    fn achievements_unlock_once() {
        let mut p = PlayerProgress::default();
        let first = p.record(&report(Outcome::Correct, 0, 20), 0);
        assert_eq!(first, vec![Achievement::PerfectAnswer, Achievement::SpeedRunner]);
        let second = p.record(&report(Outcome::Correct, 0, 20), 0);
        assert!(second.is_empty());
    }

    #[test]
    fn fifth_in_a_row_is_streak_master() {
        let mut p = PlayerProgress::default();
        for _ in 0..4 {
            assert!(!p.record(&report(Outcome::Correct, 1, 90), 0).contains(&Achievement::StreakMaster));
        }
        assert_eq!(p.record(&report(Outcome::Correct, 1, 90), 0), vec![Achievement::StreakMaster]);
    }

    #[test]
    fn perfect_round_accuracy() {
        let mut p = PlayerProgress::default();
        let mut r = report(Outcome::Correct, 1, 90);
        r.accuracy_percent = Some(100);
        assert_eq!(p.record(&r, 0), vec![Achievement::PerfectScore]);
    }

    #[test]
    fn answer_streak_replaces_level_streak() {
        let mut p = PlayerProgress::default();
        let mut r = report(Outcome::Correct, 1, 90);
        r.answer_streak = Some(6);
        assert_eq!(p.record(&r, 0), vec![Achievement::StreakMaster]);
        assert_eq!(p.streak, 6);
        assert_eq!(p.best_streak, 6);
    }

    #[test]
    fn played_items_are_unique() {
        let mut p = PlayerProgress::default();
        p.record(&report(Outcome::Correct, 1, 90), 0);
        p.record(&report(Outcome::Incorrect, 1, 90), 0);
        assert_eq!(p.played, vec!["John 3:16".to_string()]);
    }

    #[test]
    fn partial_record_merges_with_defaults() {
        let p: PlayerProgress = serde_json::from_str(r#"{"total_score": 250}"#).unwrap();
        assert_eq!(p.total_score, 250);
        assert_eq!(p.level, 1);
    }

    #[test]
    fn remote_wins_only_online() {
        let local = PlayerProgress { level: 4, ..PlayerProgress::default() };
        let remote = PlayerProgress { level: 9, ..PlayerProgress::default() };
        assert_eq!(reconcile(local.clone(), Some(remote.clone()), true).level, 9);
        assert_eq!(reconcile(local.clone(), Some(remote), false).level, 4);
        assert_eq!(reconcile(local, None, true).level, 4);
    }
}
