//! Cross-reference extraction from instruction files
//!
//! Instruction files (CLAUDE.md, AGENTS.md, copilot instructions, scoped
//! rules and skills) often point at other documents. Four regex families
//! pick those pointers out line by line:
//!
//! 1. markdown links: `[Architecture](docs/ARCHITECTURE.md)`
//! 2. file mentions: `"CONVENTIONS.md"` or `` `TESTING.md` ``
//! 3. relative paths: `./docs/setup.md`
//! 4. directory references: `skills/`, `.claude/commands/`
//!
//! Each reference is then resolved against the filesystem.

use crate::config::QualitySettings;
use crate::error::ScanResult;
use crate::matcher::{compile_glob, RepoIndex};
use crate::types::{CrossReference, ReferenceType};
use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Fixed-name instruction files, in reporting order
pub const INSTRUCTION_FILE_NAMES: &[&str] = &[
    "CLAUDE.md",
    "AGENTS.md",
    ".cursorrules",
    "CODEX.md",
    ".github/copilot-instructions.md",
    ".copilot-instructions.md",
];

/// Scoped instruction and skill files
pub const INSTRUCTION_FILE_PATTERNS: &[&str] = &[
    "*/instructions/*.md",
    "*/rules/*.md",
    "*/skills/*/SKILL.md",
    "skills/*/SKILL.md",
];

/// Instruction files present in an index
///
/// Fixed names come first in [`INSTRUCTION_FILE_NAMES`] order, followed by
/// pattern matches in walk order.
pub fn find_instruction_files(index: &RepoIndex) -> ScanResult<Vec<String>> {
    let mut found: Vec<String> = INSTRUCTION_FILE_NAMES
        .iter()
        .filter(|name| index.has_file(name))
        .map(ToString::to_string)
        .collect();

    let globs = INSTRUCTION_FILE_PATTERNS
        .iter()
        .map(|p| compile_glob(p))
        .collect::<ScanResult<Vec<_>>>()?;

    for file in index.files() {
        if globs.iter().any(|g| g.is_match(&file.path)) && !found.contains(&file.path) {
            found.push(file.path.clone());
        }
    }
    Ok(found)
}

/// Extracts and resolves references from instruction file content
#[derive(Debug, Clone)]
pub struct ReferenceExtractor {
    markdown_link: Regex,
    file_mention: Regex,
    relative_path: Regex,
    directory_ref: Regex,
}

impl Default for ReferenceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            markdown_link: Regex::new(r#"\[[^\]]*\]\(\s*([^)\s]+)(?:\s+"[^"]*")?\s*\)"#)
                .expect("valid regex"),
            file_mention: Regex::new(r#""([A-Z][\w\-]*\.md)"|`([A-Z][\w\-]*\.md)`"#)
                .expect("valid regex"),
            relative_path: Regex::new(r#"(?:^|[\s"'`])(\.\.?/[\w\-./]+\.md)"#).expect("valid regex"),
            directory_ref: Regex::new(
                r"\.(?:claude|github|cursor|codex|copilot)/(?:[\w\-]+/)?|(?:skills|agents|commands|memory|workflows|docs)/",
            )
            .expect("valid regex"),
        }
    }

    /// Read each instruction file and extract its references
    ///
    /// Files over `max_file_size` bytes and unreadable files are skipped.
    pub fn extract_references(
        &self,
        repo_root: &Path,
        instruction_files: &[String],
        max_file_size: u64,
    ) -> Vec<CrossReference> {
        let mut references = Vec::new();
        for source in instruction_files {
            if let Some(content) = read_instruction_file(repo_root, source, max_file_size) {
                references.extend(self.extract_from_content(repo_root, source, &content));
            }
        }
        references
    }

    /// Extract references from already-loaded content
    ///
    /// Order is stable: lines top to bottom; within a line markdown links,
    /// file mentions, relative paths, then directory references; left to
    /// right within each family.
    #[must_use]
    pub fn extract_from_content(
        &self,
        repo_root: &Path,
        source_file: &str,
        content: &str,
    ) -> Vec<CrossReference> {
        let mut references = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line_number = index + 1;
            let mut push = |target: &str, reference_type: ReferenceType| {
                if let Some(reference) =
                    build_reference(repo_root, source_file, target, reference_type, line_number)
                {
                    references.push(reference);
                }
            };

            for caps in self.markdown_link.captures_iter(line) {
                if let Some(target) = caps.get(1) {
                    push(target.as_str(), ReferenceType::MarkdownLink);
                }
            }

            for caps in self.file_mention.captures_iter(line) {
                if let Some(target) = caps.get(1).or_else(|| caps.get(2)) {
                    push(target.as_str(), ReferenceType::FileMention);
                }
            }

            for caps in self.relative_path.captures_iter(line) {
                if let Some(target) = caps.get(1) {
                    push(target.as_str(), ReferenceType::RelativePath);
                }
            }

            for found in self.directory_ref.find_iter(line) {
                if is_standalone_token(line, found.start(), found.end()) {
                    push(found.as_str(), ReferenceType::DirectoryRef);
                }
            }
        }

        references
    }
}

/// Extract references with the default size cap
pub fn extract_references(repo_root: &Path, instruction_files: &[String]) -> Vec<CrossReference> {
    ReferenceExtractor::new().extract_references(
        repo_root,
        instruction_files,
        QualitySettings::default().max_file_size,
    )
}

/// Read an instruction file if it is within the size cap
pub(crate) fn read_instruction_file(
    repo_root: &Path,
    relative: &str,
    max_file_size: u64,
) -> Option<String> {
    let path = repo_root.join(relative);
    match fs::metadata(&path) {
        Ok(meta) if meta.len() > max_file_size => {
            debug!(
                "Skipping {relative}: {} bytes exceeds the {max_file_size} byte cap",
                meta.len()
            );
            return None;
        }
        Ok(_) => {}
        Err(e) => {
            warn!("Cannot stat instruction file {relative}: {e}");
            return None;
        }
    }
    match fs::read_to_string(&path) {
        Ok(content) => Some(content),
        Err(e) => {
            warn!("Cannot read instruction file {relative}: {e}");
            None
        }
    }
}

/// A directory token must not be glued to surrounding path characters
fn is_standalone_token(line: &str, start: usize, end: usize) -> bool {
    let before = line[..start].chars().next_back();
    let after = line[end..].chars().next();
    let before_ok = before.map_or(true, |c| !(c.is_alphanumeric() || "/._-".contains(c)));
    let after_ok = after.map_or(true, |c| c.is_whitespace() || "\"'`),.;:]".contains(c));
    before_ok && after_ok
}

fn build_reference(
    repo_root: &Path,
    source_file: &str,
    raw_target: &str,
    reference_type: ReferenceType,
    line_number: usize,
) -> Option<CrossReference> {
    let is_external = has_uri_scheme(raw_target);

    let target = if is_external {
        raw_target.to_string()
    } else {
        // Anchors and query strings do not change which file is meant
        let cleaned = raw_target
            .split(|c| c == '#' || c == '?')
            .next()
            .unwrap_or_default()
            .to_string();
        if cleaned.is_empty() {
            return None;
        }
        cleaned
    };

    let is_resolved =
        !is_external && resolve_target(repo_root, source_file, &target, reference_type);

    Some(CrossReference {
        source_file: source_file.to_string(),
        target,
        reference_type,
        line_number,
        is_resolved,
        is_external,
    })
}

/// `scheme:` prefix as in RFC 3986 (`https:`, `mailto:`, `vscode:`)
///
/// Single letters are left alone so `C:` style paths stay local.
fn has_uri_scheme(target: &str) -> bool {
    let Some((scheme, _)) = target.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    scheme.len() > 1
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || "+.-".contains(c))
}

/// Join `relative` onto `base` without touching the filesystem
///
/// Returns `None` when `..` climbs above `base`.
fn join_within(base: &Path, relative: &Path) -> Option<PathBuf> {
    let mut joined = PathBuf::new();
    for component in base.components().chain(relative.components()) {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !joined.pop() {
                    return None;
                }
            }
            Component::Normal(part) => joined.push(part),
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(joined)
}

/// Whether a target exists next to the source file or under the root
///
/// Targets that climb out of the repository never resolve.
#[must_use]
pub fn resolve_target(
    repo_root: &Path,
    source_file: &str,
    target: &str,
    reference_type: ReferenceType,
) -> bool {
    let wants_directory = reference_type == ReferenceType::DirectoryRef || target.ends_with('/');
    let exists = |path: &Path| {
        if wants_directory {
            path.is_dir()
        } else {
            path.is_file()
        }
    };

    let within_root = |relative: &Path| {
        join_within(Path::new(""), relative).is_some_and(|inside| exists(&repo_root.join(inside)))
    };

    let trimmed = Path::new(target.trim_start_matches('/'));
    if target.starts_with('/') {
        return within_root(trimmed);
    }

    let source_dir = Path::new(source_file).parent().unwrap_or_else(|| Path::new(""));
    join_within(source_dir, trimmed).is_some_and(|path| within_root(&path)) || within_root(trimmed)
}
