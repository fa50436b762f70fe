//! Overall level and score calculation

use crate::config::RepoConfig;
use crate::levels::MAX_LEVEL;
use crate::types::{ContentQuality, CrossReference, CrossReferenceResult, LevelScore};
use std::collections::{BTreeMap, BTreeSet};

/// Cap for each of the two bonus components
const BONUS_COMPONENT_CAP: f64 = 5.0;

/// Distinct reference targets needed for the full breadth bonus
const TARGETS_FOR_FULL_BONUS: f64 = 6.0;

/// Built-in coverage threshold (percent) for a level
///
/// Level 2 is gated on presence of a substantive file instead, so it has no
/// default percentage.
#[must_use]
pub fn default_threshold(level: u8) -> Option<f64> {
    match level {
        3 => Some(15.0),
        4 => Some(12.0),
        5 => Some(10.0),
        6 => Some(8.0),
        7 => Some(6.0),
        8 => Some(5.0),
        _ => None,
    }
}

/// Threshold in effect for a level, preferring the configured value
#[must_use]
pub fn threshold(level: u8, config: &RepoConfig) -> Option<f64> {
    config
        .thresholds
        .get(&level)
        .copied()
        .or_else(|| default_threshold(level))
}

/// Whether a single level's own condition holds, ignoring earlier levels
#[must_use]
pub fn meets_level(score: &LevelScore, config: &RepoConfig) -> bool {
    match score.level {
        0 => false,
        1 => true,
        2 => {
            score.substantive_file_count() > 0
                && threshold(2, config).map_or(true, |t| score.coverage_percent >= t)
        }
        level => {
            if score.total_patterns == 0 {
                return false;
            }
            threshold(level, config).is_some_and(|t| score.coverage_percent >= t)
        }
    }
}

/// Levels achieved without gaps, starting from level 1
#[must_use]
pub fn achieved_levels(level_scores: &BTreeMap<u8, LevelScore>, config: &RepoConfig) -> Vec<u8> {
    let mut achieved = vec![1];
    for level in 2..=MAX_LEVEL {
        match level_scores.get(&level) {
            Some(score) if meets_level(score, config) => achieved.push(level),
            _ => break,
        }
    }
    achieved
}

/// Bonus points from cross-reference health and instruction file quality
///
/// `min(5, 3 * min(1, targets / 6) + 2 * resolution_rate)` plus
/// `min(5, 0.5 * average_quality)`.
#[must_use]
pub fn calculate_bonus(
    references: &[CrossReference],
    unique_targets: &BTreeSet<String>,
    qualities: &BTreeMap<String, ContentQuality>,
) -> f64 {
    let internal = references.iter().filter(|r| !r.is_external).count();
    let resolved = references.iter().filter(|r| r.is_resolved).count();
    let resolution_rate = if internal == 0 {
        0.0
    } else {
        resolved as f64 / internal as f64
    };

    let breadth = (unique_targets.len() as f64 / TARGETS_FOR_FULL_BONUS).min(1.0);
    let reference_bonus = (3.0 * breadth + 2.0 * resolution_rate).min(BONUS_COMPONENT_CAP);

    let average_quality = if qualities.is_empty() {
        0.0
    } else {
        qualities.values().map(|q| q.quality_score).sum::<f64>() / qualities.len() as f64
    };
    let quality_bonus = (0.5 * average_quality).min(BONUS_COMPONENT_CAP);

    reference_bonus + quality_bonus
}

/// Overall level and score
///
/// The score is the weighted coverage of achieved levels normalized by the
/// total weight of all levels, on a 0-100 scale, plus the cross-reference
/// bonus points.
#[must_use]
pub fn calculate_overall_level(
    level_scores: &BTreeMap<u8, LevelScore>,
    cross_refs: &CrossReferenceResult,
    config: &RepoConfig,
) -> (u8, f64) {
    let achieved = achieved_levels(level_scores, config);
    let overall_level = achieved.last().copied().unwrap_or(1);

    let total_weight: f64 = level_scores.values().map(|ls| ls.weight).sum();
    let base = if total_weight > 0.0 {
        let weighted: f64 = achieved
            .iter()
            .filter_map(|level| level_scores.get(level))
            .map(|ls| ls.coverage_percent / 100.0 * ls.weight)
            .sum();
        100.0 * weighted / total_weight
    } else {
        0.0
    };

    (overall_level, base + cross_refs.bonus_points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileMatch, ReferenceType};

    fn level(level: u8, matched: usize, total: usize, substantive: bool) -> LevelScore {
        let matched_files = (0..matched)
            .map(|i| {
                FileMatch::new(
                    format!("file{i}.md"),
                    format!("pattern{i}"),
                    if substantive { 500 } else { 10 },
                    100,
                )
            })
            .collect();
        let coverage_percent = if total == 0 {
            0.0
        } else {
            (matched as f64 * 100.0 / total as f64).min(100.0)
        };
        LevelScore {
            level,
            name: format!("Level {level}"),
            description: String::new(),
            weight: 1.0,
            matched_files,
            matched_directories: Vec::new(),
            matched_patterns: (0..matched).map(|i| format!("pattern{i}")).collect(),
            total_patterns: total,
            coverage_percent,
        }
    }

    /// Level 1 and 2 achieved, then the given (matched, total) per level 3..=8
    fn scores(higher: &[(usize, usize)]) -> BTreeMap<u8, LevelScore> {
        let mut map = BTreeMap::new();
        map.insert(1, level(1, 1, 6, true));
        map.insert(2, level(2, 1, 12, true));
        for (i, (matched, total)) in higher.iter().enumerate() {
            let lvl = u8::try_from(i + 3).unwrap();
            map.insert(lvl, level(lvl, *matched, *total, true));
        }
        for lvl in 3..=8 {
            map.entry(lvl).or_insert_with(|| level(lvl, 0, 20, true));
        }
        map
    }

    fn bonus(points: f64) -> CrossReferenceResult {
        CrossReferenceResult {
            bonus_points: points,
            ..CrossReferenceResult::default()
        }
    }

    fn reference(target: &str, resolved: bool, external: bool) -> CrossReference {
        CrossReference {
            source_file: "CLAUDE.md".to_string(),
            target: target.to_string(),
            reference_type: ReferenceType::MarkdownLink,
            line_number: 1,
            is_resolved: resolved,
            is_external: external,
        }
    }

    #[test]
    fn test_default_thresholds() {
        assert_eq!(default_threshold(1), None);
        assert_eq!(default_threshold(2), None);
        assert_eq!(default_threshold(3), Some(15.0));
        assert_eq!(default_threshold(8), Some(5.0));
        assert_eq!(default_threshold(9), None);
    }

    #[test]
    fn test_level_one_always_achieved() {
        let mut map = BTreeMap::new();
        map.insert(1, level(1, 0, 6, false));
        map.insert(2, level(2, 0, 12, false));
        let (lvl, _) = calculate_overall_level(&map, &bonus(0.0), &RepoConfig::default());
        assert_eq!(lvl, 1);
    }

    #[test]
    fn test_level_two_needs_substantive_file() {
        let mut map = scores(&[]);
        map.insert(2, level(2, 3, 12, false));
        let (lvl, _) = calculate_overall_level(&map, &bonus(0.0), &RepoConfig::default());
        assert_eq!(lvl, 1);

        map.insert(2, level(2, 1, 12, true));
        let (lvl, _) = calculate_overall_level(&map, &bonus(0.0), &RepoConfig::default());
        assert_eq!(lvl, 2);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let config = RepoConfig::default();
        // 12 of 80 is exactly 15%
        let (lvl, _) = calculate_overall_level(&scores(&[(12, 80)]), &bonus(0.0), &config);
        assert_eq!(lvl, 3);

        let (lvl, _) = calculate_overall_level(&scores(&[(11, 80)]), &bonus(0.0), &config);
        assert_eq!(lvl, 2);
    }

    #[test]
    fn test_achievement_is_sequential() {
        // Level 4 and 5 fully covered but level 3 below threshold
        let map = scores(&[(1, 80), (20, 20), (20, 20)]);
        let (lvl, _) = calculate_overall_level(&map, &bonus(0.0), &RepoConfig::default());
        assert_eq!(lvl, 2);
        assert_eq!(achieved_levels(&map, &RepoConfig::default()), vec![1, 2]);
    }

    #[test]
    fn test_every_level_below_overall_holds() {
        let map = scores(&[(20, 80), (5, 33), (3, 22), (2, 25), (2, 23), (1, 16)]);
        let config = RepoConfig::default();
        let (lvl, _) = calculate_overall_level(&map, &bonus(0.0), &config);
        assert_eq!(lvl, 8);
        for j in 1..lvl {
            assert!(meets_level(&map[&j], &config), "level {j} should hold");
        }
    }

    #[test]
    fn test_config_threshold_overrides_default() {
        let map = scores(&[(4, 80)]);
        let (lvl, _) = calculate_overall_level(&map, &bonus(0.0), &RepoConfig::default());
        assert_eq!(lvl, 2);

        let mut config = RepoConfig::default();
        config.thresholds.insert(3, 5.0);
        let (lvl, _) = calculate_overall_level(&map, &bonus(0.0), &config);
        assert_eq!(lvl, 3);
    }

    #[test]
    fn test_missing_override_falls_back_to_default() {
        let mut config = RepoConfig::default();
        config.thresholds.insert(4, 1.0);
        // Level 3 has no override and still needs 15%
        assert_eq!(threshold(3, &config), Some(15.0));
        let (lvl, _) = calculate_overall_level(&scores(&[(1, 80), (1, 33)]), &bonus(0.0), &config);
        assert_eq!(lvl, 2);
    }

    #[test]
    fn test_zero_total_patterns_never_achieved() {
        let mut config = RepoConfig::default();
        config.thresholds.insert(3, 0.0);
        let map = scores(&[(0, 0)]);
        assert!(map[&3].coverage_percent.abs() < f64::EPSILON);
        let (lvl, _) = calculate_overall_level(&map, &bonus(0.0), &config);
        assert_eq!(lvl, 2);
    }

    #[test]
    fn test_score_is_weighted_and_normalized() {
        let mut map = BTreeMap::new();
        let mut l1 = level(1, 6, 6, true);
        l1.weight = 1.0;
        let mut l2 = level(2, 0, 12, false);
        l2.weight = 3.0;
        map.insert(1, l1);
        map.insert(2, l2);
        // Only level 1 achieved at 100%: 100 * (1.0 * 1) / 4
        let (lvl, score) = calculate_overall_level(&map, &bonus(0.0), &RepoConfig::default());
        assert_eq!(lvl, 1);
        assert!((score - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_bonus_is_added_without_clamp() {
        let mut map = BTreeMap::new();
        map.insert(1, level(1, 6, 6, true));
        let (_, score) = calculate_overall_level(&map, &bonus(7.5), &RepoConfig::default());
        assert!((score - 107.5).abs() < 1e-9);
    }

    #[test]
    fn test_bonus_empty_inputs() {
        let bonus = calculate_bonus(&[], &BTreeSet::new(), &BTreeMap::new());
        assert!(bonus.abs() < f64::EPSILON);
    }

    #[test]
    fn test_bonus_components() {
        let refs = vec![
            reference("ARCHITECTURE.md", true, false),
            reference("MISSING.md", false, false),
            reference("https://example.com", false, true),
        ];
        let targets: BTreeSet<String> =
            ["ARCHITECTURE.md", "MISSING.md"].iter().map(ToString::to_string).collect();
        let mut qualities = BTreeMap::new();
        let mut q = ContentQuality::empty("CLAUDE.md");
        q.quality_score = 6.0;
        qualities.insert("CLAUDE.md".to_string(), q);

        // 3 * (2/6) + 2 * (1/2) = 2.0, quality 0.5 * 6 = 3.0
        let bonus = calculate_bonus(&refs, &targets, &qualities);
        assert!((bonus - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_bonus_components_are_capped() {
        let refs: Vec<_> = (0..10)
            .map(|i| reference(&format!("doc{i}.md"), true, false))
            .collect();
        let targets: BTreeSet<String> = refs.iter().map(|r| r.target.clone()).collect();
        let mut qualities = BTreeMap::new();
        let mut q = ContentQuality::empty("CLAUDE.md");
        q.quality_score = 10.0;
        qualities.insert("CLAUDE.md".to_string(), q);

        let bonus = calculate_bonus(&refs, &targets, &qualities);
        assert!((bonus - 10.0).abs() < 1e-9);
    }
}
