//! GitHub repositories scanned through the `gh` CLI
//!
//! The default branch tree is listed with one API call and recreated in a
//! temporary directory. Instruction and config files are downloaded; every
//! other file is recreated at its real size, which is all pattern matching
//! and reference resolution need. Excluded directories are left out. The
//! result is scanned under the `owner/repo` name.

use anyhow::{anyhow, bail, Context, Result};
use proficiency_scanner::config::CONFIG_FILE_NAMES;
use proficiency_scanner::matcher::{compile_glob, is_skipped_directory};
use proficiency_scanner::references::{INSTRUCTION_FILE_NAMES, INSTRUCTION_FILE_PATTERNS};
use proficiency_scanner::{RepoConfig, RepoScore, Scanner};
use serde::Deserialize;
use std::fs::{self, File};
use std::path::{Component, Path};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, info, warn};
use url::Url;

const GITHUB_API: &str = "https://api.github.com/";

#[derive(Debug, Deserialize)]
struct Tree {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: u64,
}

/// What to materialize for a tree path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fetch {
    /// Download the content
    Content,
    /// Create a file of the same size
    Placeholder,
}

/// Decides how each remote path is materialized
struct Selector {
    instruction_globs: Vec<globset::GlobMatcher>,
}

impl Selector {
    fn new() -> Result<Self> {
        let instruction_globs = INSTRUCTION_FILE_PATTERNS
            .iter()
            .map(|pattern| compile_glob(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { instruction_globs })
    }

    fn select_file(&self, path: &str) -> Option<Fetch> {
        if !is_safe_path(path) || in_skipped_directory(path) {
            return None;
        }
        if INSTRUCTION_FILE_NAMES.contains(&path)
            || CONFIG_FILE_NAMES.contains(&path)
            || self.instruction_globs.iter().any(|g| g.is_match(path))
        {
            return Some(Fetch::Content);
        }
        Some(Fetch::Placeholder)
    }

    fn select_directory(path: &str) -> bool {
        is_safe_path(path) && !path.split('/').any(is_skipped_directory)
    }
}

fn is_safe_path(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

fn in_skipped_directory(path: &str) -> bool {
    let mut parts: Vec<&str> = path.split('/').collect();
    parts.pop();
    parts.into_iter().any(is_skipped_directory)
}

/// Run `gh` and return its stdout
fn gh(args: &[&str]) -> Result<Vec<u8>> {
    debug!("gh {}", args.join(" "));
    let output = Command::new("gh")
        .args(args)
        .output()
        .context("Failed to run gh")?;
    if !output.status.success() {
        bail!(
            "gh {} failed: {}",
            args.first().copied().unwrap_or_default(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(output.stdout)
}

fn gh_text(args: &[&str]) -> Result<String> {
    let stdout = gh(args)?;
    Ok(String::from_utf8_lossy(&stdout).trim().to_string())
}

/// Check that `gh` is installed and authenticated
pub fn ensure_gh() -> Result<()> {
    let installed = Command::new("gh")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success());
    if !installed {
        bail!("GitHub CLI (gh) is not installed; see https://cli.github.com");
    }
    let authenticated = Command::new("gh")
        .args(["auth", "status"])
        .output()
        .is_ok_and(|o| o.status.success());
    if !authenticated {
        bail!("GitHub CLI is not authenticated; run `gh auth login`");
    }
    Ok(())
}

fn validate_repo_name(repo: &str) -> Result<()> {
    match repo.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(())
        }
        _ => bail!("Invalid repository '{repo}', expected OWNER/REPO"),
    }
}

/// Scan a GitHub repository by materializing its relevant files
pub fn scan_repo(scanner: &Scanner, repo: &str, config: Option<RepoConfig>) -> Result<RepoScore> {
    validate_repo_name(repo)?;
    let temp_dir = TempDir::new().context("Failed to create temporary directory")?;
    materialize(repo, temp_dir.path())?;
    let score = scanner
        .scan_as(temp_dir.path(), repo, config)
        .with_context(|| format!("Failed to scan {repo}"))?;
    Ok(score)
}

/// Scan up to `limit` repositories of a GitHub organization
pub fn scan_org(
    scanner: &Scanner,
    org: &str,
    limit: usize,
    config: Option<&RepoConfig>,
) -> Result<Vec<Result<RepoScore>>> {
    let repos = list_org_repos(org, limit)?;
    if repos.is_empty() {
        bail!("No repositories found in organization {org}");
    }
    info!("Scanning {} repositories in {org}", repos.len());

    Ok(repos
        .iter()
        .map(|repo| scan_repo(scanner, repo, config.cloned()))
        .collect())
}

fn list_org_repos(org: &str, limit: usize) -> Result<Vec<String>> {
    let limit = limit.to_string();
    let listing = gh_text(&[
        "repo",
        "list",
        org,
        "--limit",
        &limit,
        "--json",
        "nameWithOwner",
        "--jq",
        ".[].nameWithOwner",
    ])
    .with_context(|| format!("Failed to list repositories of {org}"))?;

    Ok(listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect())
}

/// Recreate the default branch of `repo` under `dest`
fn materialize(repo: &str, dest: &Path) -> Result<()> {
    let branch = gh_text(&["api", &format!("repos/{repo}"), "--jq", ".default_branch"])
        .with_context(|| format!("Failed to look up {repo}"))?;
    if branch.is_empty() {
        bail!("{repo} has no default branch");
    }

    let raw = gh(&[
        "api",
        &format!("repos/{repo}/git/trees/{branch}?recursive=1"),
    ])
    .with_context(|| format!("Failed to list files of {repo}"))?;
    let tree: Tree = serde_json::from_slice(&raw).context("Failed to parse tree listing")?;
    if tree.truncated {
        warn!("Tree listing for {repo} was truncated; results may be incomplete");
    }

    let (downloaded, placeholders) = write_tree(&tree, dest, |path, target| {
        download(repo, &branch, path, target)
    })?;
    debug!("{repo}@{branch}: {downloaded} files downloaded, {placeholders} sized placeholders");
    Ok(())
}

/// Write every tree entry under `dest`, fetching content through `download`
///
/// Returns the number of downloaded files and of placeholders. A failed
/// download is logged and the file left out.
fn write_tree<F>(tree: &Tree, dest: &Path, mut download: F) -> Result<(usize, usize)>
where
    F: FnMut(&str, &Path) -> Result<()>,
{
    let selector = Selector::new()?;
    let mut downloaded = 0usize;
    let mut placeholders = 0usize;

    for entry in &tree.tree {
        match entry.kind.as_str() {
            "tree" if Selector::select_directory(&entry.path) => {
                fs::create_dir_all(dest.join(&entry.path))?;
            }
            "blob" => match selector.select_file(&entry.path) {
                Some(Fetch::Content) => match download(&entry.path, &dest.join(&entry.path)) {
                    Ok(()) => downloaded += 1,
                    Err(e) => warn!("Failed to download {}: {e:#}", entry.path),
                },
                Some(Fetch::Placeholder) => {
                    placeholder(&dest.join(&entry.path), entry.size)?;
                    placeholders += 1;
                }
                None => {}
            },
            _ => {}
        }
    }
    Ok((downloaded, placeholders))
}

/// `gh api` endpoint for the raw content of `path` at `branch`
fn contents_endpoint(repo: &str, path: &str, branch: &str) -> Result<String> {
    let mut url = Url::parse(GITHUB_API)?;
    url.path_segments_mut()
        .map_err(|()| anyhow!("{GITHUB_API} cannot carry a path"))?
        .push("repos")
        .extend(repo.split('/'))
        .push("contents")
        .extend(path.split('/'));
    url.query_pairs_mut().append_pair("ref", branch);
    Ok(format!(
        "{}?{}",
        url.path().trim_start_matches('/'),
        url.query().unwrap_or_default()
    ))
}

fn download(repo: &str, branch: &str, path: &str, target: &Path) -> Result<()> {
    let endpoint = contents_endpoint(repo, path, branch)?;
    let content = gh(&["api", "-H", "Accept: application/vnd.github.raw", &endpoint])?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, content)?;
    Ok(())
}

fn placeholder(target: &Path, size: u64) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    File::create(target)?.set_len(size)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proficiency_scanner::NoHistory;

    fn selector() -> Selector {
        Selector::new().unwrap()
    }

    fn entry(path: &str, kind: &str, size: u64) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            kind: kind.to_string(),
            size,
        }
    }

    #[test]
    fn test_instruction_files_are_downloaded() {
        let s = selector();
        assert_eq!(s.select_file("CLAUDE.md"), Some(Fetch::Content));
        assert_eq!(s.select_file(".ai-proficiency.yaml"), Some(Fetch::Content));
        assert_eq!(
            s.select_file(".claude/skills/review/SKILL.md"),
            Some(Fetch::Content)
        );
    }

    #[test]
    fn test_other_files_become_placeholders() {
        let s = selector();
        assert_eq!(s.select_file("ARCHITECTURE.md"), Some(Fetch::Placeholder));
        assert_eq!(s.select_file("docs/adr/0001.md"), Some(Fetch::Placeholder));
        assert_eq!(s.select_file("src/main.rs"), Some(Fetch::Placeholder));
    }

    #[test]
    fn test_unsafe_and_excluded_paths_skipped() {
        let s = selector();
        assert_eq!(s.select_file("vendor/CLAUDE.md"), None);
        assert_eq!(s.select_file("node_modules/pkg/index.js"), None);
        assert_eq!(s.select_file("../CLAUDE.md"), None);
    }

    #[test]
    fn test_directory_selection() {
        assert!(Selector::select_directory(".claude/skills"));
        assert!(Selector::select_directory("src"));
        assert!(!Selector::select_directory("node_modules"));
        assert!(!Selector::select_directory("src/vendor/lib"));
        assert!(!Selector::select_directory("../escape"));
    }

    #[test]
    fn test_repo_name_validation() {
        assert!(validate_repo_name("owner/repo").is_ok());
        assert!(validate_repo_name("owner").is_err());
        assert!(validate_repo_name("owner/").is_err());
        assert!(validate_repo_name("a/b/c").is_err());
    }

    #[test]
    fn test_placeholder_has_real_size() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("docs/ARCHITECTURE.md");
        placeholder(&target, 512).unwrap();
        assert_eq!(fs::metadata(&target).unwrap().len(), 512);
    }

    #[test]
    fn test_contents_endpoint_encodes_path() {
        assert_eq!(
            contents_endpoint("owner/repo", "docs/my guide#1.md", "main").unwrap(),
            "repos/owner/repo/contents/docs/my%20guide%231.md?ref=main"
        );
        assert_eq!(
            contents_endpoint("owner/repo", "a?b.md", "feature/x y").unwrap(),
            "repos/owner/repo/contents/a%3Fb.md?ref=feature%2Fx+y"
        );
    }

    #[test]
    fn test_written_tree_resolves_references() {
        let dir = TempDir::new().unwrap();
        let tree = Tree {
            tree: vec![
                entry("CLAUDE.md", "blob", 0),
                entry("docs", "tree", 0),
                entry("node_modules", "tree", 0),
                entry("node_modules/pkg/index.js", "blob", 10),
                entry("src", "tree", 0),
                entry("src/lib.rs", "blob", 40),
            ],
            truncated: false,
        };

        let mut fetched = Vec::new();
        let (downloaded, placeholders) = write_tree(&tree, dir.path(), |path, target| {
            fetched.push(path.to_string());
            let body = "# Guide\n\nThe library lives in [lib](src/lib.rs).\nSee docs/ for more.\n";
            fs::write(target, body.repeat(4))?;
            Ok(())
        })
        .unwrap();

        assert_eq!(fetched, vec!["CLAUDE.md"]);
        assert_eq!((downloaded, placeholders), (1, 1));
        assert_eq!(fs::metadata(dir.path().join("src/lib.rs")).unwrap().len(), 40);
        assert!(dir.path().join("docs").is_dir());
        assert!(!dir.path().join("node_modules").exists());

        let score = Scanner::new()
            .with_history(NoHistory)
            .scan_as(dir.path(), "owner/repo", None)
            .unwrap();
        let refs = &score.cross_references;
        assert!(!refs.references.is_empty());
        assert!(refs.references.iter().all(|r| r.is_resolved));
        assert_eq!(refs.broken_references().count(), 0);
    }

    #[test]
    fn test_failed_download_is_skipped() {
        let dir = TempDir::new().unwrap();
        let tree = Tree {
            tree: vec![entry("CLAUDE.md", "blob", 0), entry("README.md", "blob", 100)],
            truncated: false,
        };

        let (downloaded, placeholders) =
            write_tree(&tree, dir.path(), |_, _| Err(anyhow!("offline"))).unwrap();

        assert_eq!((downloaded, placeholders), (0, 1));
        assert!(!dir.path().join("CLAUDE.md").exists());
    }
}
