//! CSV output formatter

use crate::levels::MAX_LEVEL;
use crate::types::RepoScore;

/// Convert repository scores to CSV, one row per repository
#[must_use]
pub fn to_csv(scores: &[RepoScore]) -> String {
    let mut output = String::new();

    let mut header = vec![
        "repo_name".to_string(),
        "repo_path".to_string(),
        "overall_level".to_string(),
        "overall_score".to_string(),
    ];
    header.extend((1..=MAX_LEVEL).map(|level| format!("level_{level}_coverage")));
    header.extend(
        [
            "detected_tools",
            "instruction_files",
            "references",
            "broken_references",
            "average_quality",
            "bonus_points",
        ]
        .iter()
        .map(ToString::to_string),
    );
    output.push_str(&header.join(","));
    output.push('\n');

    for score in scores {
        let refs = &score.cross_references;
        let mut row = vec![
            quote(&score.repo_name),
            quote(&score.repo_path),
            score.overall_level.to_string(),
            format!("{:.2}", score.overall_score),
        ];
        row.extend((1..=MAX_LEVEL).map(|level| {
            let coverage = score
                .level_scores
                .get(&level)
                .map_or(0.0, |ls| ls.coverage_percent);
            format!("{coverage:.2}")
        }));
        row.push(quote(&score.detected_tools.join(";")));
        row.push(refs.source_files_scanned.to_string());
        row.push(refs.references.len().to_string());
        row.push(refs.broken_references().count().to_string());
        row.push(format!("{:.2}", refs.average_quality()));
        row.push(format!("{:.2}", refs.bonus_points));
        output.push_str(&row.join(","));
        output.push('\n');
    }

    output
}

/// Quote a field, doubling embedded quotes
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
