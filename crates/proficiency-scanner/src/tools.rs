//! AI tool auto-detection

use crate::matcher::RepoIndex;

/// Tool identifiers understood by config files and recommendations
pub const KNOWN_TOOLS: &[&str] = &["claude-code", "github-copilot", "cursor", "openai-codex"];

struct ToolSignature {
    tool: &'static str,
    files: &'static [&'static str],
    directories: &'static [&'static str],
}

const SIGNATURES: &[ToolSignature] = &[
    ToolSignature {
        tool: "claude-code",
        files: &["CLAUDE.md"],
        directories: &[".claude"],
    },
    ToolSignature {
        tool: "github-copilot",
        files: &[".github/copilot-instructions.md", ".copilot-instructions.md"],
        directories: &[".github/instructions", ".github/agents", ".github/skills", ".copilot"],
    },
    ToolSignature {
        tool: "cursor",
        files: &[".cursorrules"],
        directories: &[".cursor"],
    },
    ToolSignature {
        tool: "openai-codex",
        files: &["AGENTS.md", "CODEX.md"],
        directories: &[".codex"],
    },
];

/// Tools whose signature files or directories exist, in `KNOWN_TOOLS` order
#[must_use]
pub fn detect_tools(index: &RepoIndex) -> Vec<String> {
    SIGNATURES
        .iter()
        .filter(|sig| {
            sig.files.iter().any(|f| index.has_file(f))
                || sig.directories.iter().any(|d| index.has_directory(d))
        })
        .map(|sig| sig.tool.to_string())
        .collect()
}
