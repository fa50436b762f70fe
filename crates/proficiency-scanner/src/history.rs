//! Version-control history lookups
//!
//! The only place the scanner starts child processes. Lookups are
//! single-attempt and bounded by a timeout; any failure counts as zero
//! commits.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Source of per-file commit counts
pub trait CommitHistoryProvider: Send + Sync {
    /// Number of commits touching `relative_path`, 0 when unknown
    fn count_commits(&self, repo_root: &Path, relative_path: &str, timeout: Duration) -> u32;
}

/// Counts commits with the `git` executable
#[derive(Debug, Default, Clone, Copy)]
pub struct GitHistory;

/// Create a git command with security hardening to prevent malicious hooks/config
fn secure_git_command() -> Command {
    let mut cmd = Command::new("git");
    // Skip system and global config; only the repository's own config applies
    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
    cmd.env("GIT_ADVICE", "0");
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd
}

impl CommitHistoryProvider for GitHistory {
    fn count_commits(&self, repo_root: &Path, relative_path: &str, timeout: Duration) -> u32 {
        // git walks up to the enclosing repository
        let child = secure_git_command()
            .args(["rev-list", "--count", "HEAD", "--", relative_path])
            .current_dir(repo_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                debug!("git unavailable for {relative_path}: {e}");
                return 0;
            }
        };

        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    if !status.success() {
                        return 0;
                    }
                    let mut stdout = String::new();
                    if let Some(mut out) = child.stdout.take() {
                        if out.read_to_string(&mut stdout).is_err() {
                            return 0;
                        }
                    }
                    return stdout.trim().parse().unwrap_or(0);
                }
                Ok(None) => {
                    if start.elapsed() >= timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        warn!(
                            "git history lookup for {relative_path} timed out after {}s",
                            timeout.as_secs_f64()
                        );
                        return 0;
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    warn!("Failed to wait for git on {relative_path}: {e}");
                    return 0;
                }
            }
        }
    }
}

/// Reports zero commits for every file
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHistory;

impl CommitHistoryProvider for NoHistory {
    fn count_commits(&self, _repo_root: &Path, _relative_path: &str, _timeout: Duration) -> u32 {
        0
    }
}
