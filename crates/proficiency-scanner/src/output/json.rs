//! JSON output formatter

use super::distribution;
use crate::error::ScanResult;
use crate::types::RepoScore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Envelope for a multi-repository run
#[derive(Debug, Serialize)]
struct MultiRepoReport<'a> {
    scanned_at: DateTime<Utc>,
    total_repos: usize,
    distribution: BTreeMap<String, usize>,
    average_score: f64,
    repos: &'a [RepoScore],
}

/// Convert a repository score to JSON
///
/// # Errors
/// Returns an error if serialization fails
pub fn to_json(score: &RepoScore) -> ScanResult<String> {
    serde_json::to_string_pretty(score).map_err(Into::into)
}

/// Convert several repository scores to a JSON summary
///
/// # Errors
/// Returns an error if serialization fails
pub fn to_json_multiple(scores: &[RepoScore]) -> ScanResult<String> {
    let average_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(|s| s.overall_score).sum::<f64>() / scores.len() as f64
    };
    let report = MultiRepoReport {
        scanned_at: Utc::now(),
        total_repos: scores.len(),
        distribution: distribution(scores)
            .into_iter()
            .map(|(level, count)| (format!("level_{level}"), count))
            .collect(),
        average_score,
        repos: scores,
    };
    serde_json::to_string_pretty(&report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures::score;

    #[test]
    fn test_single_score_round_trips() {
        let original = score("alpha", 3, 42.5);
        let json = to_json(&original).unwrap();
        let parsed: RepoScore = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.repo_name, "alpha");
        assert_eq!(parsed.overall_level, 3);
        assert_eq!(parsed.level_scores.len(), 8);
        assert_eq!(parsed.cross_references.references.len(), 1);
    }

    #[test]
    fn test_single_score_field_names() {
        let json = to_json(&score("alpha", 2, 10.0)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["overall_level"], 2);
        assert_eq!(value["detected_tools"][0], "claude-code");
        assert_eq!(
            value["cross_references"]["references"][0]["reference_type"],
            "file_mention"
        );
        assert!(value["level_scores"]["2"]["coverage_percent"].is_number());
    }

    #[test]
    fn test_multiple_summary() {
        let scores = vec![score("a", 1, 10.0), score("b", 3, 30.0)];
        let json = to_json_multiple(&scores).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_repos"], 2);
        assert_eq!(value["distribution"]["level_1"], 1);
        assert_eq!(value["distribution"]["level_3"], 1);
        assert_eq!(value["distribution"]["level_8"], 0);
        assert_eq!(value["average_score"], 20.0);
        assert_eq!(value["repos"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_multiple_empty() {
        let json = to_json_multiple(&[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_repos"], 0);
        assert_eq!(value["average_score"], 0.0);
    }
}
