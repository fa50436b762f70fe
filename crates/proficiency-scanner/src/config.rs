//! Per-repository configuration
//!
//! A repository may carry a `.ai-proficiency.yaml` that declares the AI tools
//! it targets, overrides level thresholds, and filters recommendations.
//! Loading goes through the [`ConfigLoader`] trait so the scanner never
//! depends on a particular parser; [`YamlConfigLoader`] is the default and
//! [`DefaultConfigLoader`] ignores the repository entirely.

use crate::error::{ScanError, ScanResult};
use crate::tools::KNOWN_TOOLS;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// File names looked up in the repository root, in order
pub const CONFIG_FILE_NAMES: &[&str] = &[".ai-proficiency.yaml", ".ai-proficiency.yml"];

/// Tuning knobs for matching and quality evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitySettings {
    /// Instruction files above this size are not read
    pub max_file_size: u64,
    /// Files must be strictly larger than this to count as substantive
    pub substantive_threshold_bytes: u64,
    /// Word count for one substance point
    pub word_threshold_partial: usize,
    /// Word count for two substance points
    pub word_threshold_full: usize,
    /// Upper bound for a single git history lookup
    pub git_timeout_seconds: u64,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            max_file_size: 100_000,
            substantive_threshold_bytes: 100,
            word_threshold_partial: 50,
            word_threshold_full: 200,
            git_timeout_seconds: 5,
        }
    }
}

impl QualitySettings {
    #[must_use]
    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_seconds)
    }
}

/// Read-only options for a single scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Tools the repository declares it uses; empty means auto-detect
    pub tools: Vec<String>,
    /// Per-level coverage thresholds (percent) overriding the defaults
    pub thresholds: BTreeMap<u8, f64>,
    /// Recommendation topics to omit
    pub skip_recommendations: BTreeSet<String>,
    /// When non-empty, only recommendations in these areas are kept
    pub focus_areas: BTreeSet<String>,
    pub quality: QualitySettings,
    /// Whether the values came from a config file
    pub from_file: bool,
}

impl RepoConfig {
    /// Parse YAML configuration text
    pub fn from_yaml(content: &str) -> ScanResult<Self> {
        // An empty file parses as null; treat it like an empty mapping
        if content.trim().is_empty() {
            return Ok(Self {
                from_file: true,
                ..Self::default()
            });
        }
        let raw: RawConfig =
            serde_yml::from_str(content).map_err(|e| ScanError::ConfigParse(e.to_string()))?;
        Ok(raw.into_config())
    }

    /// Read and parse a YAML configuration file
    pub fn from_file(path: &Path) -> ScanResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Whether the tool list was declared rather than left to detection
    #[must_use]
    pub fn has_explicit_tools(&self) -> bool {
        !self.tools.is_empty()
    }
}

/// On-disk shape of `.ai-proficiency.yaml`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    tools: Vec<String>,
    thresholds: HashMap<String, f64>,
    skip_recommendations: Vec<String>,
    focus_areas: Vec<String>,
    quality: QualitySettings,
}

impl RawConfig {
    fn into_config(self) -> RepoConfig {
        let mut tools = Vec::new();
        for tool in self.tools {
            let tool = tool.trim().to_lowercase();
            if !KNOWN_TOOLS.contains(&tool.as_str()) {
                warn!("Ignoring unknown tool '{tool}' in config");
                continue;
            }
            if !tools.contains(&tool) {
                tools.push(tool);
            }
        }

        let mut thresholds = BTreeMap::new();
        for (key, value) in self.thresholds {
            match parse_threshold_key(&key) {
                Some(level) => {
                    thresholds.insert(level, value);
                }
                None => warn!("Ignoring threshold with invalid key '{key}'"),
            }
        }

        RepoConfig {
            tools,
            thresholds,
            skip_recommendations: normalize_set(self.skip_recommendations),
            focus_areas: normalize_set(self.focus_areas),
            quality: self.quality,
            from_file: true,
        }
    }
}

/// Accepts `level_3`, `level3`, `L3` and `3`
fn parse_threshold_key(key: &str) -> Option<u8> {
    let lowered = key.trim().to_lowercase();
    let digits = lowered
        .strip_prefix("level_")
        .or_else(|| lowered.strip_prefix("level"))
        .or_else(|| lowered.strip_prefix('l'))
        .unwrap_or(&lowered);
    let level: u8 = digits.parse().ok()?;
    (2..=crate::levels::MAX_LEVEL).contains(&level).then_some(level)
}

fn normalize_set(values: Vec<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Source of per-repository configuration
pub trait ConfigLoader: Send + Sync {
    /// Load the configuration for a repository, `None` for defaults
    fn load(&self, repo_root: &Path) -> Option<RepoConfig>;
}

/// Loads `.ai-proficiency.yaml` (or `.yml`) from the repository root
///
/// Parse failures are logged and reported as "no config" so the scan
/// proceeds with defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlConfigLoader;

impl YamlConfigLoader {
    /// First config file present in the repository root
    #[must_use]
    pub fn locate(repo_root: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| repo_root.join(name))
            .find(|path| path.is_file())
    }
}

impl ConfigLoader for YamlConfigLoader {
    fn load(&self, repo_root: &Path) -> Option<RepoConfig> {
        let path = Self::locate(repo_root)?;
        match RepoConfig::from_file(&path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                warn!("Ignoring config {}: {e}", path.display());
                None
            }
        }
    }
}

/// Always returns the default configuration
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConfigLoader;

impl ConfigLoader for DefaultConfigLoader {
    fn load(&self, _repo_root: &Path) -> Option<RepoConfig> {
        None
    }
}
