//! Achievement rules and their evaluation against cumulative stats.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Snapshot of the counters achievement rules read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AchievementStats {
    pub total_correct: u32,
    pub max_streak: u32,
    pub double_negative_correct: u32,
    /// 1-indexed, i.e. `max_level_ever_reached + 1`.
    pub max_level_display: usize,
    pub score: u32,
}

/// Threshold predicate over an [`AchievementStats`] snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "at_least", rename_all = "snake_case")]
pub enum UnlockCondition {
    TotalCorrect(u32),
    MaxStreak(u32),
    DoubleNegativeCorrect(u32),
    LevelReached(usize),
    Score(u32),
}

impl UnlockCondition {
    #[must_use]
    pub const fn is_met(self, stats: &AchievementStats) -> bool {
        match self {
            Self::TotalCorrect(n) => stats.total_correct >= n,
            Self::MaxStreak(n) => stats.max_streak >= n,
            Self::DoubleNegativeCorrect(n) => stats.double_negative_correct >= n,
            Self::LevelReached(n) => stats.max_level_display >= n,
            Self::Score(n) => stats.score >= n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AchievementRule {
    pub id: &'static str,
    pub icon: &'static str,
    pub condition: UnlockCondition,
}

pub const ACHIEVEMENTS: [AchievementRule; 9] = [
    AchievementRule {
        id: "first_correct",
        icon: "🎯",
        condition: UnlockCondition::TotalCorrect(1),
    },
    AchievementRule {
        id: "streak_5",
        icon: "🔥",
        condition: UnlockCondition::MaxStreak(5),
    },
    AchievementRule {
        id: "streak_10",
        icon: "⚡",
        condition: UnlockCondition::MaxStreak(10),
    },
    AchievementRule {
        id: "negative_master",
        icon: "🧮",
        condition: UnlockCondition::DoubleNegativeCorrect(10),
    },
    AchievementRule {
        id: "level_3",
        icon: "🚀",
        condition: UnlockCondition::LevelReached(3),
    },
    AchievementRule {
        id: "level_5",
        icon: "🏆",
        condition: UnlockCondition::LevelReached(5),
    },
    AchievementRule {
        id: "level_6",
        icon: "👑",
        condition: UnlockCondition::LevelReached(6),
    },
    AchievementRule {
        id: "score_200",
        icon: "💎",
        condition: UnlockCondition::Score(200),
    },
    AchievementRule {
        id: "score_500",
        icon: "🌟",
        condition: UnlockCondition::Score(500),
    },
];

#[must_use]
pub fn find_achievement(id: &str) -> Option<&'static AchievementRule> {
    ACHIEVEMENTS.iter().find(|rule| rule.id == id)
}

/// Scan the rule table in order and return every rule that is satisfied but
/// not yet unlocked, adding its id to `unlocked`. Already-unlocked rules are
/// skipped, so a second call with the same stats yields nothing.
pub fn evaluate_achievements(
    stats: &AchievementStats,
    unlocked: &mut BTreeSet<String>,
) -> Vec<&'static AchievementRule> {
    let mut newly_unlocked = Vec::new();
    for rule in &ACHIEVEMENTS {
        if unlocked.contains(rule.id) || !rule.condition.is_met(stats) {
            continue;
        }
        unlocked.insert(rule.id.to_string());
        newly_unlocked.push(rule);
    }
    newly_unlocked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(rules: &[&AchievementRule]) -> Vec<&'static str> {
        rules.iter().map(|r| r.id).collect()
    }

    #[test]
    fn ids_are_unique() {
        let set: BTreeSet<_> = ACHIEVEMENTS.iter().map(|r| r.id).collect();
        assert_eq!(set.len(), ACHIEVEMENTS.len());
    }

    #[test]
    fn first_correct_unlocks_once() {
        let stats = AchievementStats {
            total_correct: 1,
            max_level_display: 1,
            ..AchievementStats::default()
        };
        let mut unlocked = BTreeSet::new();
        assert_eq!(
            ids(&evaluate_achievements(&stats, &mut unlocked)),
            ["first_correct"]
        );
        assert!(evaluate_achievements(&stats, &mut unlocked).is_empty());
        assert!(unlocked.contains("first_correct"));
    }

    #[test]
    fn output_follows_table_order() {
        let stats = AchievementStats {
            total_correct: 40,
            max_streak: 22,
            double_negative_correct: 12,
            max_level_display: 6,
            score: 900,
        };
        let mut unlocked = BTreeSet::new();
        let all = evaluate_achievements(&stats, &mut unlocked);
        assert_eq!(
            ids(&all),
            ACHIEVEMENTS.iter().map(|r| r.id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn preexisting_unlocks_are_not_emitted() {
        let stats = AchievementStats {
            total_correct: 5,
            max_streak: 5,
            ..AchievementStats::default()
        };
        let mut unlocked = BTreeSet::from(["first_correct".to_string()]);
        assert_eq!(
            ids(&evaluate_achievements(&stats, &mut unlocked)),
            ["streak_5"]
        );
    }

    #[test]
    fn level_rules_use_display_level() {
        let mut stats = AchievementStats {
            max_level_display: 2,
            ..AchievementStats::default()
        };
        let mut unlocked = BTreeSet::new();
        assert!(evaluate_achievements(&stats, &mut unlocked).is_empty());
        stats.max_level_display = 3;
        assert_eq!(
            ids(&evaluate_achievements(&stats, &mut unlocked)),
            ["level_3"]
        );
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(find_achievement("score_500").map(|r| r.icon), Some("🌟"));
        assert!(find_achievement("nope").is_none());
    }
}
