//! Main scanner implementation

use crate::calculator::{calculate_bonus, calculate_overall_level};
use crate::config::{ConfigLoader, RepoConfig, YamlConfigLoader};
use crate::error::{ScanError, ScanResult};
use crate::history::{CommitHistoryProvider, GitHistory};
use crate::levels::RuleSet;
use crate::matcher::{validate_root, PatternMatcher, RepoIndex};
use crate::quality::QualityEvaluator;
use crate::recommend::generate_recommendations;
use crate::references::{find_instruction_files, read_instruction_file, ReferenceExtractor};
use crate::tools::detect_tools;
use crate::types::{CrossReferenceResult, LevelScore, RepoScore};
use chrono::Utc;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The main scanner struct
///
/// Holds the rule set and the collaborators a scan needs. A scanner is
/// immutable once built and can be shared across threads.
pub struct Scanner {
    rules: RuleSet,
    config_loader: Box<dyn ConfigLoader>,
    history: Box<dyn CommitHistoryProvider>,
    extractor: ReferenceExtractor,
    evaluator: QualityEvaluator,
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self {
            rules: RuleSet::standard(),
            config_loader: Box::new(YamlConfigLoader),
            history: Box::new(GitHistory),
            extractor: ReferenceExtractor::new(),
            evaluator: QualityEvaluator::new(),
        }
    }
}

impl Scanner {
    /// Create a scanner with the standard rules, YAML config and git history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom rule set
    #[must_use]
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Replace how per-repository configuration is found
    #[must_use]
    pub fn with_config_loader(mut self, loader: impl ConfigLoader + 'static) -> Self {
        self.config_loader = Box::new(loader);
        self
    }

    /// Replace the commit history source
    #[must_use]
    pub fn with_history(mut self, history: impl CommitHistoryProvider + 'static) -> Self {
        self.history = Box::new(history);
        self
    }

    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Scan a repository
    ///
    /// When `config` is `None` the configured loader looks for a config file
    /// in the repository root, falling back to defaults.
    ///
    /// # Errors
    /// Returns `InvalidRepositoryPath` if `path` is missing or not a
    /// directory.
    pub fn scan(&self, path: &Path, config: Option<RepoConfig>) -> ScanResult<RepoScore> {
        validate_root(path)?;
        let name = repo_name(path);
        self.scan_as(path, &name, config)
    }

    /// Scan a repository, reporting it under a given name
    ///
    /// Used for materialized remote repositories whose temporary directory
    /// name means nothing to the reader.
    ///
    /// # Errors
    /// Returns `InvalidRepositoryPath` if `path` is missing or not a
    /// directory.
    pub fn scan_as(
        &self,
        path: &Path,
        name: &str,
        config: Option<RepoConfig>,
    ) -> ScanResult<RepoScore> {
        validate_root(path)?;
        let root = path.canonicalize()?;
        debug!("Scanning {} as {name}", root.display());

        let config = config
            .or_else(|| self.config_loader.load(&root))
            .unwrap_or_default();

        let index = RepoIndex::build(&root)?;
        let matcher = PatternMatcher::new(config.quality.substantive_threshold_bytes);
        let level_scores = self
            .rules
            .iter()
            .map(|rule| {
                matcher
                    .match_level(&index, rule)
                    .map(|score| (rule.level, score))
            })
            .collect::<ScanResult<BTreeMap<u8, LevelScore>>>()?;

        let detected_tools = detect_tools(&index);
        let instruction_files = find_instruction_files(&index)?;
        let cross_references = self.analyze_instruction_files(&root, &instruction_files, &config);

        let (overall_level, overall_score) =
            calculate_overall_level(&level_scores, &cross_references, &config);
        debug!("{name}: level {overall_level}, score {overall_score:.1}");

        let mut score = RepoScore {
            repo_path: root.display().to_string(),
            repo_name: name.to_string(),
            scanned_at: Utc::now(),
            level_scores,
            overall_level,
            overall_score,
            detected_tools,
            cross_references,
            recommendations: Vec::new(),
            config,
        };
        score.recommendations = generate_recommendations(&score, &score.config);
        Ok(score)
    }

    /// Scan several repositories in parallel
    ///
    /// Results come back in input order. A shared `config` replaces each
    /// repository's own config file.
    pub fn scan_many(
        &self,
        paths: &[PathBuf],
        config: Option<&RepoConfig>,
    ) -> Vec<ScanResult<RepoScore>> {
        paths
            .par_iter()
            .map(|path| self.scan(path, config.cloned()))
            .collect()
    }

    /// Scan every repository directly inside `dir`
    ///
    /// # Errors
    /// Returns an error if `dir` is not a readable directory.
    pub fn scan_directory_of_repos(
        &self,
        dir: &Path,
        config: Option<&RepoConfig>,
    ) -> ScanResult<Vec<ScanResult<RepoScore>>> {
        let repos = list_repositories(dir)?;
        Ok(self.scan_many(&repos, config))
    }

    /// Extract references and score quality, reading each file once
    fn analyze_instruction_files(
        &self,
        root: &Path,
        instruction_files: &[String],
        config: &RepoConfig,
    ) -> CrossReferenceResult {
        let mut result = CrossReferenceResult::default();

        for file in instruction_files {
            let Some(content) = read_instruction_file(root, file, config.quality.max_file_size)
            else {
                continue;
            };
            result.source_files_scanned += 1;
            result
                .references
                .extend(self.extractor.extract_from_content(root, file, &content));
            let quality = self.evaluator.evaluate(
                &content,
                file,
                root,
                &config.quality,
                self.history.as_ref(),
            );
            result.quality_scores.insert(file.clone(), quality);
        }

        result.resolved_count = result.references.iter().filter(|r| r.is_resolved).count();
        result.unique_targets = result
            .references
            .iter()
            .filter(|r| !r.is_external)
            .map(|r| r.target.clone())
            .collect();
        result.bonus_points = calculate_bonus(
            &result.references,
            &result.unique_targets,
            &result.quality_scores,
        );

        debug!(
            "{} instruction files, {} references ({} resolved), bonus {:.2}",
            result.source_files_scanned,
            result.references.len(),
            result.resolved_count,
            result.bonus_points
        );
        result
    }
}

/// Non-hidden subdirectories of `dir`, sorted by name
///
/// # Errors
/// Returns `InvalidRepositoryPath` if `dir` is missing or not a directory,
/// or an IO error if it cannot be listed.
pub fn list_repositories(dir: &Path) -> ScanResult<Vec<PathBuf>> {
    validate_root(dir)?;
    let mut repos = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {e}", dir.display());
                continue;
            }
        };
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if path.is_dir() && !hidden {
            repos.push(path);
        }
    }
    repos.sort();
    if repos.is_empty() {
        return Err(ScanError::InvalidRepositoryPath(format!(
            "No repositories found in {}",
            dir.display()
        )));
    }
    Ok(repos)
}

/// Directory name of a repository path
fn repo_name(path: &Path) -> String {
    path.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(path)
        .file_name()
        .map_or_else(
            || path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        )
}
