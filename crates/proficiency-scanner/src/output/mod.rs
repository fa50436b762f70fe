//! Output formatters for repository scores
//!
//! - `terminal` - styled report for a console
//! - `json` - pretty-printed JSON
//! - `markdown` - GitHub-flavored Markdown
//! - `csv` - one row per repository

pub mod csv;
pub mod json;
pub mod markdown;
pub mod terminal;

pub use csv::to_csv;
pub use json::{to_json, to_json_multiple};
pub use markdown::{to_markdown, to_markdown_summary};
pub use terminal::{to_terminal, to_terminal_summary};

use crate::levels::MAX_LEVEL;
use crate::types::RepoScore;
use std::cmp::Ordering;

/// Short status for a level: the part of its name after `Level N: `
pub(crate) fn status_label(score: &RepoScore) -> String {
    score.current_level().map_or_else(
        || format!("Level {}", score.overall_level),
        |ls| {
            ls.name
                .split_once(": ")
                .map_or(ls.name.as_str(), |(_, label)| label)
                .to_string()
        },
    )
}

/// Scores ordered by level, then score, highest first
pub(crate) fn ranked(scores: &[RepoScore]) -> Vec<&RepoScore> {
    let mut sorted: Vec<&RepoScore> = scores.iter().collect();
    sorted.sort_by(|a, b| {
        b.overall_level.cmp(&a.overall_level).then_with(|| {
            b.overall_score
                .partial_cmp(&a.overall_score)
                .unwrap_or(Ordering::Equal)
        })
    });
    sorted
}

/// Number of repositories at each level, 1 through 8
pub(crate) fn distribution(scores: &[RepoScore]) -> Vec<(u8, usize)> {
    (1..=MAX_LEVEL)
        .map(|level| {
            (
                level,
                scores.iter().filter(|s| s.overall_level == level).count(),
            )
        })
        .collect()
}

/// Share of `count` in `total`, as a percentage
pub(crate) fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}
