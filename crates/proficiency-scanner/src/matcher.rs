//! Pattern matching against the repository tree
//!
//! The repository is walked once into a [`RepoIndex`]; every level is then
//! classified against that index. Dependency and build directories are
//! pruned during the walk so their contents never reach any level.

use crate::error::{ScanError, ScanResult};
use crate::levels::LevelRule;
use crate::types::{FileMatch, LevelScore};
use globset::{Glob, GlobBuilder, GlobMatcher};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into, at any depth
pub const SKIPPED_DIRECTORIES: &[&str] = &[
    "node_modules",
    "venv",
    ".venv",
    "env",
    "dist",
    "build",
    "__pycache__",
    ".git",
    ".svn",
    "vendor",
    "target",
    "coverage",
    ".tox",
    "eggs",
    "packages",
];

/// Hidden directories that are still walked
///
/// The AI tool directories, plus the hidden memory and context
/// directories that the level rules look into.
pub const ALLOWED_HIDDEN_DIRECTORIES: &[&str] = &[
    ".github",
    ".claude",
    ".cursor",
    ".vscode",
    ".codex",
    ".copilot",
    ".beads",
    ".memory",
    ".mcp",
    ".ai",
    ".context",
    ".prompts",
    ".agent_state",
];

/// Whether the walker prunes a directory with this name
#[must_use]
pub fn is_skipped_directory(name: &str) -> bool {
    if SKIPPED_DIRECTORIES.contains(&name) {
        return true;
    }
    name.starts_with('.') && !ALLOWED_HIDDEN_DIRECTORIES.contains(&name)
}

/// A file found during the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    /// Path relative to the root, `/` separated
    pub path: String,
    pub size_bytes: u64,
}

/// Snapshot of the files and directories of a repository
#[derive(Debug, Clone)]
pub struct RepoIndex {
    root: PathBuf,
    files: Vec<IndexedFile>,
    directories: BTreeSet<String>,
}

impl RepoIndex {
    /// Walk a repository root
    ///
    /// # Errors
    /// Returns `InvalidRepositoryPath` if the root is missing or not a
    /// directory. Unreadable entries below the root are logged and skipped.
    pub fn build(root: &Path) -> ScanResult<Self> {
        validate_root(root)?;

        let mut files = Vec::new();
        let mut directories = BTreeSet::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_pruned(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }
            let Some(relative) = relative_path(root, entry.path()) else {
                continue;
            };

            // Symlinks are classified by their target but never descended into
            let metadata = if entry.path_is_symlink() {
                fs::metadata(entry.path())
            } else {
                entry.metadata().map_err(Into::into)
            };
            let metadata = match metadata {
                Ok(meta) => meta,
                Err(e) => {
                    warn!("Cannot read metadata for {relative}: {e}");
                    if entry.file_type().is_file() {
                        files.push(IndexedFile {
                            path: relative,
                            size_bytes: 0,
                        });
                    }
                    continue;
                }
            };

            if metadata.is_dir() {
                directories.insert(relative);
            } else if metadata.is_file() {
                files.push(IndexedFile {
                    path: relative,
                    size_bytes: metadata.len(),
                });
            }
        }

        debug!(
            "Indexed {} files and {} directories under {}",
            files.len(),
            directories.len(),
            root.display()
        );

        Ok(Self {
            root: root.to_path_buf(),
            files,
            directories,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files in walk order (sorted by path component)
    #[must_use]
    pub fn files(&self) -> &[IndexedFile] {
        &self.files
    }

    #[must_use]
    pub fn has_file(&self, path: &str) -> bool {
        self.files.iter().any(|f| f.path == path)
    }

    #[must_use]
    pub fn has_directory(&self, path: &str) -> bool {
        self.directories.contains(path.trim_end_matches('/'))
    }
}

/// Check that a repository root exists and is a directory
pub fn validate_root(root: &Path) -> ScanResult<()> {
    if !root.exists() {
        return Err(ScanError::InvalidRepositoryPath(format!(
            "Repository path does not exist: {}",
            root.display()
        )));
    }
    if !root.is_dir() {
        return Err(ScanError::InvalidRepositoryPath(format!(
            "Repository path is not a directory: {}",
            root.display()
        )));
    }
    Ok(())
}

fn is_pruned(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && is_skipped_directory(&entry.file_name().to_string_lossy())
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Compile a glob the way level patterns are interpreted
///
/// `*` stays within one path component; `**` crosses directories.
pub fn compile_glob(pattern: &str) -> ScanResult<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob: Glob| glob.compile_matcher())
        .map_err(|source| ScanError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Classifies indexed files and directories against level rules
#[derive(Debug, Clone, Copy)]
pub struct PatternMatcher {
    substantive_threshold: u64,
}

impl PatternMatcher {
    #[must_use]
    pub fn new(substantive_threshold: u64) -> Self {
        Self {
            substantive_threshold,
        }
    }

    /// Score one level against an index
    ///
    /// Each file is recorded at most once (under the first pattern that
    /// matches it); every pattern that matches anything counts toward
    /// coverage.
    pub fn match_level(&self, index: &RepoIndex, rule: &LevelRule) -> ScanResult<LevelScore> {
        let mut matched_files = Vec::new();
        let mut recorded: HashSet<&str> = HashSet::new();
        let mut matched_patterns: Vec<String> = Vec::new();

        for pattern in &rule.file_patterns {
            let glob = compile_glob(pattern)?;
            let mut any = false;
            for file in index.files() {
                if !glob.is_match(&file.path) {
                    continue;
                }
                any = true;
                if recorded.insert(file.path.as_str()) {
                    matched_files.push(FileMatch::new(
                        file.path.clone(),
                        pattern.clone(),
                        file.size_bytes,
                        self.substantive_threshold,
                    ));
                }
            }
            if any && !matched_patterns.contains(pattern) {
                matched_patterns.push(pattern.clone());
            }
        }

        let mut matched_directories = Vec::new();
        for pattern in &rule.directory_patterns {
            if index.has_directory(pattern) {
                matched_directories.push(pattern.clone());
                if !matched_patterns.contains(pattern) {
                    matched_patterns.push(pattern.clone());
                }
            }
        }

        let total_patterns = rule.total_patterns();
        let coverage_percent = if total_patterns == 0 {
            0.0
        } else {
            (matched_patterns.len() as f64 * 100.0 / total_patterns as f64).min(100.0)
        };

        Ok(LevelScore {
            level: rule.level,
            name: rule.name.clone(),
            description: rule.description.clone(),
            weight: rule.weight,
            matched_files,
            matched_directories,
            matched_patterns,
            total_patterns,
            coverage_percent,
        })
    }
}

/// Walk a repository and score a single level
///
/// Convenience for callers that only need one level; full scans build the
/// index once and reuse it for every level.
pub fn match_level(
    repo_root: &Path,
    rule: &LevelRule,
    substantive_threshold_bytes: u64,
) -> ScanResult<LevelScore> {
    let index = RepoIndex::build(repo_root)?;
    PatternMatcher::new(substantive_threshold_bytes).match_level(&index, rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, path: &str, size: usize) {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, "x".repeat(size)).unwrap();
    }

    fn rule(files: &[&str], dirs: &[&str]) -> LevelRule {
        LevelRule {
            level: 3,
            name: "test".to_string(),
            description: String::new(),
            file_patterns: files.iter().map(ToString::to_string).collect(),
            directory_patterns: dirs.iter().map(ToString::to_string).collect(),
            weight: 1.0,
        }
    }

    #[test]
    fn test_skip_rules() {
        assert!(is_skipped_directory("node_modules"));
        assert!(is_skipped_directory("packages"));
        assert!(is_skipped_directory(".idea"));
        assert!(!is_skipped_directory(".claude"));
        assert!(!is_skipped_directory(".github"));
        assert!(!is_skipped_directory("docs"));
    }

    #[test]
    fn test_missing_root_is_invalid() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            RepoIndex::build(&missing),
            Err(ScanError::InvalidRepositoryPath(_))
        ));
    }

    #[test]
    fn test_file_root_is_invalid() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "file.txt", 3);
        assert!(matches!(
            RepoIndex::build(&dir.path().join("file.txt")),
            Err(ScanError::InvalidRepositoryPath(_))
        ));
    }

    #[test]
    fn test_index_prunes_denied_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "node_modules/pkg/CLAUDE.md", 500);
        write(dir.path(), "src/vendor/CLAUDE.md", 500);
        write(dir.path(), ".idea/notes.md", 500);
        write(dir.path(), ".claude/commands/review.md", 500);
        write(dir.path(), "CLAUDE.md", 500);

        let index = RepoIndex::build(dir.path()).unwrap();
        let paths: Vec<&str> = index.files().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec![".claude/commands/review.md", "CLAUDE.md"]);
        assert!(index.has_directory(".claude/commands"));
        assert!(!index.has_directory("node_modules"));
    }

    #[test]
    fn test_single_star_stays_in_component() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "docs/a.md", 200);
        write(dir.path(), "docs/adr/001.md", 200);

        let score = match_level(dir.path(), &rule(&["docs/*.md"], &[]), 100).unwrap();
        let paths: Vec<&str> = score.matched_files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["docs/a.md"]);
    }

    #[test]
    fn test_double_star_recurses() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", 200);
        write(dir.path(), "docs/adr/001.md", 200);

        let score = match_level(dir.path(), &rule(&["**/*.md"], &[]), 100).unwrap();
        assert_eq!(score.file_count(), 2);
        assert!((score.coverage_percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "claude.md", 200);

        let score = match_level(dir.path(), &rule(&["CLAUDE.md"], &[]), 100).unwrap();
        assert_eq!(score.file_count(), 0);
    }

    #[test]
    fn test_duplicate_matches_recorded_once() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "docs/ARCHITECTURE.md", 200);

        let score = match_level(
            dir.path(),
            &rule(&["docs/ARCHITECTURE.md", "docs/*.md"], &[]),
            100,
        )
        .unwrap();
        assert_eq!(score.file_count(), 1);
        assert_eq!(score.matched_files[0].pattern, "docs/ARCHITECTURE.md");
        // Both patterns still count toward coverage
        assert_eq!(score.matched_patterns.len(), 2);
        assert!((score.coverage_percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_substantive_threshold_is_strict() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "A.md", 100);
        write(dir.path(), "B.md", 101);

        let score = match_level(dir.path(), &rule(&["A.md", "B.md"], &[]), 100).unwrap();
        assert!(!score.matched_files[0].is_substantive);
        assert!(score.matched_files[1].is_substantive);
        assert_eq!(score.substantive_file_count(), 1);
    }

    #[test]
    fn test_directory_patterns_match_empty_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".claude/hooks")).unwrap();

        let score = match_level(
            dir.path(),
            &rule(&["MEMORY.md"], &[".claude/hooks", "skills"]),
            100,
        )
        .unwrap();
        assert_eq!(score.matched_directories, vec![".claude/hooks"]);
        assert_eq!(score.total_patterns, 3);
        assert!((score.coverage_percent - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_rule_has_zero_coverage() {
        let dir = TempDir::new().unwrap();
        let score = match_level(dir.path(), &rule(&[], &[]), 100).unwrap();
        assert_eq!(score.total_patterns, 0);
        assert!(score.coverage_percent.abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let dir = TempDir::new().unwrap();
        let result = match_level(dir.path(), &rule(&["docs/[.md"], &[]), 100);
        assert!(matches!(result, Err(ScanError::InvalidPattern { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_classified_by_target() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "real-instructions.txt", 500);
        std::os::unix::fs::symlink("real-instructions.txt", dir.path().join("CLAUDE.md")).unwrap();
        std::os::unix::fs::symlink("missing.txt", dir.path().join("AGENTS.md")).unwrap();

        let index = RepoIndex::build(dir.path()).unwrap();
        let claude = index.files().iter().find(|f| f.path == "CLAUDE.md").unwrap();
        assert_eq!(claude.size_bytes, 500);
        assert!(!index.files().iter().any(|f| f.path == "AGENTS.md"));
    }
}
