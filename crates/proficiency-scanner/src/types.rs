//! Shared result types for the proficiency scanner

use crate::config::RepoConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A file matched by one of a level's patterns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMatch {
    /// Path relative to the repository root, `/` separated
    pub path: String,
    /// First pattern that matched this file
    pub pattern: String,
    /// File size in bytes (0 when metadata was unreadable)
    pub size_bytes: u64,
    /// Whether the file is larger than the substantive threshold
    pub is_substantive: bool,
}

impl FileMatch {
    /// Create a match, deriving `is_substantive` from the threshold
    #[must_use]
    pub fn new(path: String, pattern: String, size_bytes: u64, substantive_threshold: u64) -> Self {
        Self {
            path,
            pattern,
            size_bytes,
            is_substantive: size_bytes > substantive_threshold,
        }
    }
}

/// Score for a single maturity level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelScore {
    /// Level number (1-8)
    pub level: u8,
    /// Display name
    pub name: String,
    /// What the level means
    pub description: String,
    /// Weight used for the overall score
    pub weight: f64,
    /// Files matched by the level's file patterns
    pub matched_files: Vec<FileMatch>,
    /// Directory patterns that exist in the repository
    pub matched_directories: Vec<String>,
    /// Distinct patterns (file or directory) that matched something
    pub matched_patterns: Vec<String>,
    /// Number of distinct patterns declared by the level
    pub total_patterns: usize,
    /// `100 * matched_patterns / total_patterns`
    pub coverage_percent: f64,
}

impl LevelScore {
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.matched_files.len()
    }

    #[must_use]
    pub fn substantive_file_count(&self) -> usize {
        self.matched_files.iter().filter(|f| f.is_substantive).count()
    }

    /// Whether a given pattern matched at least one file or directory
    #[must_use]
    pub fn pattern_matched(&self, pattern: &str) -> bool {
        self.matched_patterns.iter().any(|p| p == pattern)
    }
}

/// Kind of textual pointer found in an instruction file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    /// `[text](target)`
    MarkdownLink,
    /// `"NAME.md"` or `` `NAME.md` ``
    FileMention,
    /// `./path/to/file.md`
    RelativePath,
    /// `skills/`, `.claude/commands/`, ...
    DirectoryRef,
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReferenceType::MarkdownLink => "markdown_link",
            ReferenceType::FileMention => "file_mention",
            ReferenceType::RelativePath => "relative_path",
            ReferenceType::DirectoryRef => "directory_ref",
        };
        f.write_str(label)
    }
}

/// A reference from one instruction file to another file or directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    /// Instruction file containing the reference, relative to the root
    pub source_file: String,
    /// Target exactly as written (fragment removed)
    pub target: String,
    pub reference_type: ReferenceType,
    /// 1-indexed line of the reference
    pub line_number: usize,
    /// Whether the target exists next to the source or under the root
    pub is_resolved: bool,
    /// Targets with a URI scheme (`https:`, `mailto:`) are never reported as broken
    pub is_external: bool,
}

impl CrossReference {
    /// Unresolved internal reference
    #[must_use]
    pub fn is_broken(&self) -> bool {
        !self.is_resolved && !self.is_external
    }
}

/// Content quality of a single instruction file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentQuality {
    pub file_path: String,
    /// Composite score in `[0, 10]`
    pub quality_score: f64,
    pub word_count: usize,
    pub section_count: usize,
    pub path_count: usize,
    pub command_count: usize,
    pub constraint_count: usize,
    pub has_sections: bool,
    pub has_paths: bool,
    pub has_commands: bool,
    pub has_constraints: bool,
    /// Commits touching the file (0 without git history)
    pub commit_count: u32,
}

impl ContentQuality {
    /// Zero-valued quality for a file that could not be evaluated
    #[must_use]
    pub fn empty(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }
}

/// Cross-reference and quality findings for a repository
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrossReferenceResult {
    pub references: Vec<CrossReference>,
    pub source_files_scanned: usize,
    pub resolved_count: usize,
    /// Distinct internal targets
    pub unique_targets: BTreeSet<String>,
    pub quality_scores: BTreeMap<String, ContentQuality>,
    /// Bonus added to the overall score, `[0, 10]`
    pub bonus_points: f64,
}

impl CrossReferenceResult {
    /// References that point at something that does not exist
    pub fn broken_references(&self) -> impl Iterator<Item = &CrossReference> {
        self.references.iter().filter(|r| r.is_broken())
    }

    /// Resolved share of internal references (0 when there are none)
    #[must_use]
    pub fn resolution_rate(&self) -> f64 {
        let internal = self.references.iter().filter(|r| !r.is_external).count();
        if internal == 0 {
            0.0
        } else {
            self.resolved_count as f64 / internal as f64
        }
    }

    /// Mean quality score over evaluated files (0 when none)
    #[must_use]
    pub fn average_quality(&self) -> f64 {
        if self.quality_scores.is_empty() {
            return 0.0;
        }
        let total: f64 = self.quality_scores.values().map(|q| q.quality_score).sum();
        total / self.quality_scores.len() as f64
    }
}

/// Complete score for a repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoScore {
    /// Absolute path that was scanned
    pub repo_path: String,
    /// Display name (directory name or `owner/repo`)
    pub repo_name: String,
    /// When the scan was performed
    pub scanned_at: DateTime<Utc>,
    pub level_scores: BTreeMap<u8, LevelScore>,
    /// Highest level achieved without gaps, 1-8
    pub overall_level: u8,
    /// Weighted coverage on a 0-100 scale plus bonus points
    pub overall_score: f64,
    /// AI tools inferred from the repository contents
    pub detected_tools: Vec<String>,
    pub cross_references: CrossReferenceResult,
    pub recommendations: Vec<String>,
    /// Configuration the scan ran with
    pub config: RepoConfig,
}

impl RepoScore {
    /// Whether any AI-specific artifact (Level 2 and up) was found
    #[must_use]
    pub fn has_any_ai_files(&self) -> bool {
        self.level_scores
            .values()
            .filter(|ls| ls.level >= 2)
            .any(|ls| ls.file_count() > 0 || !ls.matched_directories.is_empty())
    }

    /// Score of the level the repository reached
    #[must_use]
    pub fn current_level(&self) -> Option<&LevelScore> {
        self.level_scores.get(&self.overall_level)
    }
}
