//! Content quality scoring for instruction files
//!
//! Six indicators worth up to two points each; the sum is capped at 10.

use crate::config::QualitySettings;
use crate::history::CommitHistoryProvider;
use crate::references::read_instruction_file;
use crate::types::ContentQuality;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;

/// Highest possible quality score
pub const MAX_QUALITY_SCORE: f64 = 10.0;

/// First words that make a backticked snippet look like a shell command
const COMMAND_WORDS: &[&str] = &[
    "npm", "npx", "yarn", "pnpm", "bun", "node", "deno", "cargo", "rustc", "rustup", "go",
    "python", "python3", "pip", "pip3", "poetry", "uv", "pytest", "ruff", "mypy", "tox", "nox",
    "make", "just", "git", "gh", "docker", "docker-compose", "kubectl", "helm", "terraform",
    "bash", "sh", "zsh", "mvn", "gradle", "./gradlew", "dotnet", "bundle", "rake", "rails",
    "composer", "php", "mix", "swift", "xcodebuild", "curl", "brew", "claude", "codex",
    "pre-commit", "eslint", "prettier", "tsc", "jest", "vitest",
];

/// Scores the structure and substance of an instruction file
#[derive(Debug, Clone)]
pub struct QualityEvaluator {
    header: Regex,
    url: Regex,
    path: Regex,
    inline_code: Regex,
    constraint: Regex,
}

impl Default for QualityEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl QualityEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            header: Regex::new(r"(?m)^#{1,6}\s").expect("valid regex"),
            url: Regex::new(r"[a-zA-Z][a-zA-Z0-9+.\-]*://\S+").expect("valid regex"),
            path: Regex::new(r"~/[\w.\-/]+|[\w.\-]*/[\w.\-]+/[\w.\-/]*").expect("valid regex"),
            inline_code: Regex::new(r"`([^`\n]+)`").expect("valid regex"),
            constraint: Regex::new(r"(?i)\b(?:never|avoid|don't|do not|must not|always|required)\b")
                .expect("valid regex"),
        }
    }

    /// Score already-loaded content
    ///
    /// `file_path` is relative to `repo_root` and only used for the commit
    /// lookup and the result label.
    #[must_use]
    pub fn evaluate(
        &self,
        content: &str,
        file_path: &str,
        repo_root: &Path,
        settings: &QualitySettings,
        history: &dyn CommitHistoryProvider,
    ) -> ContentQuality {
        let section_count = self.header.find_iter(content).count();
        let path_count = self.count_paths(content);
        let command_count = self.count_commands(content);
        let constraint_count = self.constraint.find_iter(content).count();
        let word_count = content.split_whitespace().count();
        let commit_count = history.count_commits(repo_root, file_path, settings.git_timeout());

        let section_points = tiered(section_count, 5, 1);
        let path_points = tiered(path_count, 3, 1);
        let command_points = tiered(command_count, 3, 1);
        let constraint_points = tiered(constraint_count, 2, 1);
        let substance_points = tiered(
            word_count,
            settings.word_threshold_full,
            settings.word_threshold_partial,
        );
        let commit_points = tiered(commit_count as usize, 5, 2);

        let total = section_points
            + path_points
            + command_points
            + constraint_points
            + substance_points
            + commit_points;

        ContentQuality {
            file_path: file_path.to_string(),
            quality_score: f64::from(total).min(MAX_QUALITY_SCORE),
            word_count,
            section_count,
            path_count,
            command_count,
            constraint_count,
            has_sections: section_points > 0,
            has_paths: path_points > 0,
            has_commands: command_points > 0,
            has_constraints: constraint_points > 0,
            commit_count,
        }
    }

    /// Read a file and score it; unreadable or oversized files score zero
    #[must_use]
    pub fn evaluate_file(
        &self,
        repo_root: &Path,
        file_path: &str,
        settings: &QualitySettings,
        history: &dyn CommitHistoryProvider,
    ) -> ContentQuality {
        match read_instruction_file(repo_root, file_path, settings.max_file_size) {
            Some(content) => self.evaluate(&content, file_path, repo_root, settings, history),
            None => ContentQuality::empty(file_path),
        }
    }

    /// Distinct path-like tokens, URLs excluded
    fn count_paths(&self, content: &str) -> usize {
        let without_urls = self.url.replace_all(content, " ");
        self.path
            .find_iter(&without_urls)
            .map(|m| m.as_str().trim_end_matches(['.', ',']))
            .filter(|p| p.len() > 2)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Inline code spans and fenced-block lines that start with a command
    fn count_commands(&self, content: &str) -> usize {
        let mut count = 0;
        let mut in_fence = false;

        for line in content.lines() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("```") {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                if is_command_like(trimmed) {
                    count += 1;
                }
                continue;
            }
            count += self
                .inline_code
                .captures_iter(line)
                .filter_map(|caps| caps.get(1))
                .filter(|m| is_command_like(m.as_str()))
                .count();
        }
        count
    }
}

fn is_command_like(snippet: &str) -> bool {
    let snippet = snippet.trim();
    let snippet = snippet.strip_prefix("$ ").unwrap_or(snippet);
    let Some(first) = snippet.split_whitespace().next() else {
        return false;
    };
    COMMAND_WORDS.contains(&first) || (first.starts_with("./") && first.len() > 2)
}

/// 2 points at or above `full`, 1 point at or above `partial`
fn tiered(value: usize, full: usize, partial: usize) -> u8 {
    if value >= full {
        2
    } else if value >= partial {
        1
    } else {
        0
    }
}

/// Score already-loaded content with a fresh evaluator
#[must_use]
pub fn evaluate(
    content: &str,
    file_path: &str,
    repo_root: &Path,
    settings: &QualitySettings,
    history: &dyn CommitHistoryProvider,
) -> ContentQuality {
    QualityEvaluator::new().evaluate(content, file_path, repo_root, settings, history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::NoHistory;
    use std::time::Duration;
    use tempfile::TempDir;

    struct FixedHistory(u32);

    impl CommitHistoryProvider for FixedHistory {
        fn count_commits(&self, _root: &Path, _path: &str, _timeout: Duration) -> u32 {
            self.0
        }
    }

    fn score(content: &str) -> ContentQuality {
        QualityEvaluator::new().evaluate(
            content,
            "CLAUDE.md",
            Path::new("."),
            &QualitySettings::default(),
            &NoHistory,
        )
    }

    const RICH: &str = r"# Project

## Architecture
The API lives in src/api/ and the workers in src/workers/.
Config is read from ~/.config/app.toml and /etc/app/defaults.

## Commands
Run `cargo test` before pushing, `cargo fmt` to format and `make lint`.

## Rules
- Never commit secrets.
- Always add tests. Do not use unwrap in library code.

## Testing
Integration tests live under tests/fixtures/data.

## Deployment
Deploys are handled by CI.
";

    #[test]
    fn test_empty_content_scores_zero() {
        let quality = score("");
        assert!(quality.quality_score.abs() < f64::EPSILON);
        assert!(!quality.has_sections);
        assert!(!quality.has_paths);
        assert!(!quality.has_commands);
        assert!(!quality.has_constraints);
    }

    #[test]
    fn test_rich_content_indicators() {
        let quality = score(RICH);
        assert_eq!(quality.section_count, 6);
        assert!(quality.path_count >= 3, "paths: {}", quality.path_count);
        assert_eq!(quality.command_count, 3);
        assert_eq!(quality.constraint_count, 3);
        assert!(quality.has_sections && quality.has_paths);
        assert!(quality.has_commands && quality.has_constraints);
        // 2 + 2 + 2 + 2 + substance (under 200 words, over 50) 1 + commits 0
        assert!((quality.quality_score - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_headers_means_no_sections() {
        let quality = score(&"plain words without structure ".repeat(20));
        assert_eq!(quality.section_count, 0);
        assert!(!quality.has_sections);
        assert_eq!(quality.word_count, 80);
    }

    #[test]
    fn test_header_needs_space_and_at_most_six_hashes() {
        let quality = score("#nospace\n####### seven\n###### six\n");
        assert_eq!(quality.section_count, 1);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(tiered(0, 5, 1), 0);
        assert_eq!(tiered(1, 5, 1), 1);
        assert_eq!(tiered(4, 5, 1), 1);
        assert_eq!(tiered(5, 5, 1), 2);
        assert_eq!(tiered(49, 200, 50), 0);
        assert_eq!(tiered(50, 200, 50), 1);
        assert_eq!(tiered(200, 200, 50), 2);
    }

    #[test]
    fn test_urls_are_not_paths() {
        let quality = score("Docs at https://example.com/a/b/c and http://x.io/y/z/");
        assert_eq!(quality.path_count, 0);
    }

    #[test]
    fn test_paths_counted_once() {
        let quality = score("src/api/ and src/api/ again, then src/api/.");
        assert_eq!(quality.path_count, 1);
    }

    #[test]
    fn test_constraints_case_insensitive() {
        let quality = score("NEVER do this. You must not do that. Don't!");
        assert_eq!(quality.constraint_count, 3);
    }

    #[test]
    fn test_fenced_commands_counted() {
        let quality = score("```bash\n$ npm install\nnpm test\necho hi\n```\n`git status`");
        assert_eq!(quality.command_count, 3);
    }

    #[test]
    fn test_non_command_code_spans_ignored() {
        let quality = score("Use `Result<T, E>` and `HashMap` types.");
        assert_eq!(quality.command_count, 0);
    }

    #[test]
    fn test_commit_points() {
        let evaluator = QualityEvaluator::new();
        let settings = QualitySettings::default();
        let root = Path::new(".");
        let with = |n| evaluator.evaluate("", "CLAUDE.md", root, &settings, &FixedHistory(n));

        assert!((with(1).quality_score).abs() < f64::EPSILON);
        assert!((with(2).quality_score - 1.0).abs() < f64::EPSILON);
        assert!((with(5).quality_score - 2.0).abs() < f64::EPSILON);
        assert_eq!(with(7).commit_count, 7);
    }

    #[test]
    fn test_score_is_capped_at_ten() {
        let long = format!("{RICH}\n{}", "word ".repeat(250));
        let quality = QualityEvaluator::new().evaluate(
            &long,
            "CLAUDE.md",
            Path::new("."),
            &QualitySettings::default(),
            &FixedHistory(20),
        );
        assert!((quality.quality_score - MAX_QUALITY_SCORE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unreadable_file_is_zero_valued() {
        let dir = TempDir::new().unwrap();
        let quality = QualityEvaluator::new().evaluate_file(
            dir.path(),
            "MISSING.md",
            &QualitySettings::default(),
            &NoHistory,
        );
        assert_eq!(quality, ContentQuality::empty("MISSING.md"));
    }

    #[test]
    fn test_invalid_utf8_is_zero_valued() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("CLAUDE.md"), [0xff, 0xfe, 0x00, 0x41]).unwrap();
        let quality = QualityEvaluator::new().evaluate_file(
            dir.path(),
            "CLAUDE.md",
            &QualitySettings::default(),
            &NoHistory,
        );
        assert!(quality.quality_score.abs() < f64::EPSILON);
    }
}
