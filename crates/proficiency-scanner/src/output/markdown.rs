//! Markdown output formatter

use super::{distribution, percent, ranked, status_label};
use crate::types::RepoScore;
use chrono::Utc;

/// Convert a repository score to a Markdown report
#[must_use]
pub fn to_markdown(score: &RepoScore) -> String {
    let mut output = String::new();

    output.push_str(&format!("# AI Proficiency Report: {}\n\n", score.repo_name));
    output.push_str(&format!(
        "**Scanned at:** {}\n\n",
        score.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output.push_str("## Summary\n\n");
    let level_name = score
        .current_level()
        .map_or_else(|| format!("Level {}", score.overall_level), |ls| ls.name.clone());
    output.push_str(&format!("- **Overall Level:** {level_name}\n"));
    output.push_str(&format!(
        "- **Overall Score:** {:.1}/100\n",
        score.overall_score
    ));
    if score.detected_tools.is_empty() {
        output.push_str("- **Detected Tools:** none\n");
    } else {
        output.push_str(&format!(
            "- **Detected Tools:** {}\n",
            score.detected_tools.join(", ")
        ));
    }
    output.push('\n');

    output.push_str("## Level Breakdown\n\n");
    output.push_str("| Level | Coverage | Files | Status |\n");
    output.push_str("|-------|----------|-------|--------|\n");
    for ls in score.level_scores.values() {
        let achieved = if ls.level <= score.overall_level {
            "✓"
        } else {
            "○"
        };
        output.push_str(&format!(
            "| {} | {:.1}% | {} | {achieved} |\n",
            ls.name,
            ls.coverage_percent,
            ls.substantive_file_count()
        ));
    }
    output.push('\n');

    if score.level_scores.values().any(|ls| !ls.matched_files.is_empty()) {
        output.push_str("## Detected Files\n\n");
        for ls in score.level_scores.values() {
            if ls.matched_files.is_empty() {
                continue;
            }
            output.push_str(&format!("### {}\n\n", ls.name));
            for file in &ls.matched_files {
                let status = if file.is_substantive { "●" } else { "○" };
                output.push_str(&format!("- {status} `{}`\n", file.path));
            }
            output.push('\n');
        }
    }

    let refs = &score.cross_references;
    if refs.source_files_scanned > 0 {
        output.push_str("## Cross-References & Quality\n\n");
        output.push_str(&format!(
            "- **Instruction files:** {}\n",
            refs.source_files_scanned
        ));
        output.push_str(&format!(
            "- **References:** {} ({} resolved, {} unique targets)\n",
            refs.references.len(),
            refs.resolved_count,
            refs.unique_targets.len()
        ));
        output.push_str(&format!("- **Bonus points:** {:.1}\n\n", refs.bonus_points));

        let broken: Vec<_> = refs.broken_references().collect();
        if !broken.is_empty() {
            output.push_str("### Broken References\n\n");
            for r in broken {
                output.push_str(&format!(
                    "- `{}` line {}: `{}` ({})\n",
                    r.source_file, r.line_number, r.target, r.reference_type
                ));
            }
            output.push('\n');
        }

        output.push_str("### Instruction File Quality\n\n");
        output.push_str("| File | Score | Words | Sections | Commits |\n");
        output.push_str("|------|-------|-------|----------|---------|\n");
        for quality in refs.quality_scores.values() {
            output.push_str(&format!(
                "| `{}` | {:.1}/10 | {} | {} | {} |\n",
                quality.file_path,
                quality.quality_score,
                quality.word_count,
                quality.section_count,
                quality.commit_count
            ));
        }
        output.push('\n');
    }

    if !score.recommendations.is_empty() {
        output.push_str("## Recommendations\n\n");
        for (i, rec) in score.recommendations.iter().enumerate() {
            output.push_str(&format!("{}. {rec}\n", i + 1));
        }
        output.push('\n');
    }

    output
}

/// Convert several repository scores to a Markdown summary
#[must_use]
pub fn to_markdown_summary(scores: &[RepoScore]) -> String {
    let mut output = String::new();

    output.push_str("# AI Proficiency Summary\n\n");
    output.push_str(&format!(
        "**Scanned at:** {}\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("**Total Repositories:** {}\n\n", scores.len()));

    output.push_str("## Distribution\n\n");
    output.push_str("| Level | Count | Percentage |\n");
    output.push_str("|-------|-------|------------|\n");
    for (level, count) in distribution(scores) {
        output.push_str(&format!(
            "| Level {level} | {count} | {:.1}% |\n",
            percent(count, scores.len())
        ));
    }
    output.push('\n');

    output.push_str("## Repositories\n\n");
    output.push_str("| Repository | Level | Score | Status |\n");
    output.push_str("|------------|-------|-------|--------|\n");
    for score in ranked(scores) {
        output.push_str(&format!(
            "| {} | Level {} | {:.1} | {} |\n",
            score.repo_name,
            score.overall_level,
            score.overall_score,
            status_label(score)
        ));
    }
    output.push('\n');

    output
}
