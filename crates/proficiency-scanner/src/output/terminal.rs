//! Terminal output formatter
//!
//! Styling goes through `console`, so colors drop out automatically when
//! the output is not a terminal or colors are disabled globally.

use super::{distribution, percent, ranked, status_label};
use crate::types::RepoScore;
use console::{style, Color};

const BAR_WIDTH: usize = 20;
const FILES_SHOWN: usize = 5;
const NAME_WIDTH: usize = 30;

fn level_color(level: u8) -> Color {
    match level {
        1 => Color::Red,
        2 => Color::Yellow,
        3 => Color::Cyan,
        4 => Color::Green,
        5 => Color::Blue,
        _ => Color::Magenta,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn progress_bar(percent: f64) -> String {
    let filled = ((BAR_WIDTH as f64 * percent / 100.0) as usize).min(BAR_WIDTH);
    format!(
        "[{}{}]",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled)
    )
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() > width {
        let kept: String = name.chars().take(width - 2).collect();
        format!("{kept}..")
    } else {
        name.to_string()
    }
}

/// Render a repository score for a terminal
///
/// With `show_files`, up to five matched files are listed per level.
#[must_use]
pub fn to_terminal(score: &RepoScore, show_files: bool) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();

    out.push('\n');
    out.push_str(&format!("{}\n", style(&rule).dim()));
    out.push_str(&format!(
        "{}\n",
        style(format!(" AI Proficiency Report: {}", score.repo_name)).bold()
    ));
    out.push_str(&format!("{}\n\n", style(&rule).dim()));

    let level_name = score
        .current_level()
        .map_or_else(|| format!("Level {}", score.overall_level), |ls| ls.name.clone());
    out.push_str(&format!(
        "  Overall Level: {}\n",
        style(level_name).fg(level_color(score.overall_level))
    ));
    out.push_str(&format!(
        "  Overall Score: {}\n",
        style(format!("{:.1}/100", score.overall_score)).bold()
    ));
    if !score.detected_tools.is_empty() {
        out.push_str(&format!(
            "  Detected Tools: {}\n",
            score.detected_tools.join(", ")
        ));
    }
    out.push('\n');

    out.push_str(&format!("{}\n\n", style("  Level Breakdown:").bold()));
    for ls in score.level_scores.values() {
        let mark = if ls.level <= score.overall_level {
            style("✓").green()
        } else {
            style("○").dim()
        };
        out.push_str(&format!("    {mark} {}\n", ls.name));
        out.push_str(&format!(
            "      {} {:.1}% ({} files)\n",
            progress_bar(ls.coverage_percent),
            ls.coverage_percent,
            ls.substantive_file_count()
        ));

        if show_files && !ls.matched_files.is_empty() {
            for file in ls.matched_files.iter().take(FILES_SHOWN) {
                let status = if file.is_substantive { "●" } else { "○" };
                out.push_str(&format!("        {} {}\n", style(status).dim(), file.path));
            }
            if ls.matched_files.len() > FILES_SHOWN {
                out.push_str(&format!(
                    "        {}\n",
                    style(format!(
                        "... and {} more",
                        ls.matched_files.len() - FILES_SHOWN
                    ))
                    .dim()
                ));
            }
        }
        out.push('\n');
    }

    let refs = &score.cross_references;
    if refs.source_files_scanned > 0 {
        out.push_str(&format!("{}\n\n", style("  Cross-References & Quality:").bold()));
        out.push_str(&format!(
            "    References: {} ({} resolved, {} unique targets)\n",
            refs.references.len(),
            refs.resolved_count,
            refs.unique_targets.len()
        ));
        for r in refs.broken_references() {
            out.push_str(&format!(
                "    {} {}:{} -> {}\n",
                style("✗").red(),
                r.source_file,
                r.line_number,
                r.target
            ));
        }
        for quality in refs.quality_scores.values() {
            out.push_str(&format!(
                "    {} {:.1}/10\n",
                quality.file_path, quality.quality_score
            ));
        }
        out.push_str(&format!("    Bonus: +{:.1}\n\n", refs.bonus_points));
    }

    if !score.recommendations.is_empty() {
        out.push_str(&format!("{}\n\n", style("  Recommendations:").bold()));
        for rec in &score.recommendations {
            out.push_str(&format!("    → {rec}\n"));
        }
        out.push('\n');
    }

    out.push_str(&format!("{}\n", style(&rule).dim()));
    out
}

/// Render a summary table of several repositories
#[must_use]
pub fn to_terminal_summary(scores: &[RepoScore]) -> String {
    if scores.is_empty() {
        return "No repositories scanned.\n".to_string();
    }

    let rule = "=".repeat(70);
    let mut out = String::new();

    out.push('\n');
    out.push_str(&format!("{}\n", style(&rule).dim()));
    out.push_str(&format!("{}\n", style(" AI Proficiency Summary").bold()));
    out.push_str(&format!("{}\n\n", style(&rule).dim()));

    out.push_str(&format!(
        "  {:<width$} {:<10} {:<10} Status\n",
        "Repository",
        "Level",
        "Score",
        width = NAME_WIDTH
    ));
    out.push_str(&format!(
        "  {} {} {} {}\n",
        "-".repeat(NAME_WIDTH),
        "-".repeat(10),
        "-".repeat(10),
        "-".repeat(22)
    ));

    for score in ranked(scores) {
        out.push_str(&format!(
            "  {:<width$} {:<10} {:<10} {}\n",
            truncate(&score.repo_name, NAME_WIDTH),
            format!("Level {}", score.overall_level),
            format!("{:.1}", score.overall_score),
            style(status_label(score)).fg(level_color(score.overall_level)),
            width = NAME_WIDTH
        ));
    }
    out.push('\n');

    out.push_str(&format!("{}\n", style("  Distribution:").bold()));
    for (level, count) in distribution(scores) {
        let pct = percent(count, scores.len());
        out.push_str(&format!(
            "    Level {level}: {} {count} repos ({pct:.1}%)\n",
            progress_bar(pct)
        ));
    }
    out.push('\n');
    out.push_str(&format!("{}\n", style(&rule).dim()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures::score;
    use crate::types::FileMatch;
    use console::strip_ansi_codes;

    fn plain(text: &str) -> String {
        strip_ansi_codes(text).into_owned()
    }

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0.0), format!("[{}]", "░".repeat(20)));
        assert_eq!(progress_bar(100.0), format!("[{}]", "█".repeat(20)));
        assert_eq!(progress_bar(50.0), format!("[{}{}]", "█".repeat(10), "░".repeat(10)));
    }

    #[test]
    fn test_truncate_long_names() {
        assert_eq!(truncate("short", 30), "short");
        assert_eq!(truncate("abcdefghij", 6), "abcd..");
    }

    #[test]
    fn test_single_report() {
        let out = plain(&to_terminal(&score("alpha", 2, 12.0), true));
        assert!(out.contains("AI Proficiency Report: alpha"));
        assert!(out.contains("Overall Level: Level 2: Basic Instructions"));
        assert!(out.contains("Overall Score: 12.0/100"));
        assert!(out.contains("✓ Level 2: Basic Instructions"));
        assert!(out.contains("○ Level 3: Comprehensive Context"));
        assert!(out.contains("● level2/FILE.md"));
        assert!(out.contains("✗ CLAUDE.md:3 -> MISSING.md"));
        assert!(out.contains("→ Add ARCHITECTURE.md"));
    }

    #[test]
    fn test_files_hidden_without_show_files() {
        let out = plain(&to_terminal(&score("alpha", 2, 12.0), false));
        assert!(!out.contains("level2/FILE.md"));
    }

    #[test]
    fn test_file_list_is_capped() {
        let mut s = score("alpha", 2, 12.0);
        let l2 = s.level_scores.get_mut(&2).unwrap();
        l2.matched_files = (0..8)
            .map(|i| FileMatch::new(format!("f{i}.md"), "x".into(), 10, 100))
            .collect();
        let out = plain(&to_terminal(&s, true));
        assert!(out.contains("f4.md"));
        assert!(!out.contains("f5.md"));
        assert!(out.contains("... and 3 more"));
    }

    #[test]
    fn test_summary_table() {
        let scores = vec![score("small", 1, 5.0), score("big", 4, 50.0)];
        let out = plain(&to_terminal_summary(&scores));
        assert!(out.contains("AI Proficiency Summary"));
        assert!(out.find("big").unwrap() < out.find("small").unwrap());
        assert!(out.contains("Level 1: ["));
        assert!(out.contains("1 repos (50.0%)"));
        assert!(out.contains("Level 8: ["));
    }

    #[test]
    fn test_summary_empty() {
        assert_eq!(to_terminal_summary(&[]), "No repositories scanned.\n");
    }
}
