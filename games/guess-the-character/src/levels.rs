use serde::Serialize;
use verse_engine::ScoringPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One row of the level table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelSpec {
    pub level: u32,
    pub difficulty: Difficulty,
    pub testament: &'static str,
    /// Hints that may be showing at once, the free first one included.
    pub max_hints: u32,
    pub points_per_correct: u32,
    pub time_limit_secs: u32,
}

impl LevelSpec {
    /// Full points for a correct name, minus an equal share per extra hint.
    /// No time bonus.
    pub fn scoring(&self) -> ScoringPolicy {
        ScoringPolicy {
            base_points: self.points_per_correct,
            time_bonus_max: 0,
            penalty_per_hint: self.points_per_correct / self.max_hints.max(1),
        }
    }
}

const fn spec(
    level: u32,
    difficulty: Difficulty,
    testament: &'static str,
    max_hints: u32,
    points_per_correct: u32,
    time_limit_secs: u32,
) -> LevelSpec {
    LevelSpec {
        level,
        difficulty,
        testament,
        max_hints,
        points_per_correct,
        time_limit_secs,
    }
}

use Difficulty::*;

pub const LEVELS: [LevelSpec; 15] = [
    spec(1, Easy, "Mixed", 3, 100, 60),
    spec(2, Easy, "Old Testament", 3, 100, 60),
    spec(3, Easy, "New Testament", 3, 100, 60),
    spec(4, Easy, "Mixed", 3, 120, 60),
    spec(5, Medium, "Mixed", 3, 120, 60),
    spec(6, Medium, "Old Testament", 3, 120, 60),
    spec(7, Medium, "New Testament", 3, 120, 60),
    spec(8, Medium, "Mixed", 3, 150, 60),
    spec(9, Hard, "Mixed", 3, 150, 60),
    spec(10, Hard, "Old Testament", 3, 150, 60),
    spec(11, Hard, "New Testament", 3, 150, 60),
    spec(12, Hard, "Mixed", 2, 200, 60),
    spec(13, Hard, "Mixed", 2, 200, 45),
    spec(14, Hard, "Old Testament Leaders", 2, 200, 45),
    spec(15, Hard, "New Testament Leaders", 1, 250, 45),
];

/// Table row for `level`. Levels past the end replay the last row.
pub fn level_spec(level: u32) -> &'static LevelSpec {
    let index = (level.max(1) as usize - 1).min(LEVELS.len() - 1);
    &LEVELS[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use verse_engine::Outcome;

    #[test]
    fn table_is_ordered() {
        for (i, spec) in LEVELS.iter().enumerate() {
            assert_eq!(spec.level as usize, i + 1);
        }
    }

    #[test]
    fn lookup_clamps() {
        assert_eq!(level_spec(0).level, 1);
        assert_eq!(level_spec(7).level, 7);
        assert_eq!(level_spec(99).level, 15);
    }

    #[test]
    fn each_hint_costs_a_share() {
        let scoring = level_spec(1).scoring();
        // 100 - floor(100 / 3) * 2
        assert_eq!(scoring.compute(Outcome::Correct, 10, 60, 2, 3), 34);
        assert_eq!(scoring.compute(Outcome::Correct, 60, 60, 0, 3), 100);
    }

    #[test]
    fn last_level_has_single_hint() {
        let spec = level_spec(15);
        assert_eq!(spec.max_hints, 1);
        assert_eq!(spec.scoring().penalty_per_hint, 250);
    }
}
