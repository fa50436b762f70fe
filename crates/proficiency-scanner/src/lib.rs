//! Proficiency Scanner - AI context engineering maturity assessment
//!
//! Scans a repository for the files AI coding assistants read (instruction
//! files, architecture docs, skills, agent definitions, orchestration
//! config), places it on an eight-level maturity ladder and suggests what to
//! add next.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::items_after_statements,
    clippy::single_match_else,
    clippy::match_same_arms,
    clippy::unnecessary_debug_formatting,
    clippy::option_if_let_else,
    clippy::needless_pass_by_value,
    clippy::map_unwrap_or,
    clippy::manual_let_else,
    clippy::unnecessary_wraps,
    clippy::unused_self,
    clippy::cast_precision_loss
)]

pub mod calculator;
pub mod config;
pub mod error;
pub mod history;
pub mod levels;
pub mod matcher;
pub mod output;
pub mod quality;
pub mod recommend;
pub mod references;
pub mod scan;
pub mod tools;
pub mod types;

pub use config::{ConfigLoader, DefaultConfigLoader, QualitySettings, RepoConfig, YamlConfigLoader};
pub use error::{ScanError, ScanResult};
pub use history::{CommitHistoryProvider, GitHistory, NoHistory};
pub use levels::{LevelRule, RuleSet, MAX_LEVEL};
pub use scan::{list_repositories, Scanner};
pub use types::{
    ContentQuality, CrossReference, CrossReferenceResult, FileMatch, LevelScore, ReferenceType,
    RepoScore,
};
