//! Maturity level rule set
//!
//! Eight levels, loosely following the "stages of AI-assisted development"
//! progression: from no context engineering at all (Level 1) to custom
//! multi-agent orchestration (Level 8). Each level is a plain record of
//! glob patterns; a repository achieves a level by covering enough of them.

use crate::error::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Highest maturity level
pub const MAX_LEVEL: u8 = 8;

/// Definition of a single maturity level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelRule {
    /// Level number (1-8)
    pub level: u8,
    /// Display name
    pub name: String,
    /// What the level means
    pub description: String,
    /// Globs matched against repository-relative file paths
    pub file_patterns: Vec<String>,
    /// Repository-relative directories whose existence counts as a match
    pub directory_patterns: Vec<String>,
    /// Contribution to the overall score
    pub weight: f64,
}

impl LevelRule {
    fn from_static(
        level: u8,
        name: &str,
        description: &str,
        file_patterns: &[&str],
        directory_patterns: &[&str],
        weight: f64,
    ) -> Self {
        Self {
            level,
            name: name.to_string(),
            description: description.to_string(),
            file_patterns: file_patterns.iter().map(ToString::to_string).collect(),
            directory_patterns: directory_patterns.iter().map(ToString::to_string).collect(),
            weight,
        }
    }

    /// Number of distinct patterns, files and directories combined
    #[must_use]
    pub fn total_patterns(&self) -> usize {
        self.file_patterns
            .iter()
            .chain(&self.directory_patterns)
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// The ordered collection of level rules used by a scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    rules: Vec<LevelRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleSet {
    /// Build a custom rule set
    ///
    /// Levels must be the contiguous range `1..=8` in order and every level
    /// above 1 must declare at least one pattern.
    pub fn new(rules: Vec<LevelRule>) -> ScanResult<Self> {
        if rules.len() != usize::from(MAX_LEVEL) {
            return Err(ScanError::InvalidRuleSet(format!(
                "expected {MAX_LEVEL} levels, got {}",
                rules.len()
            )));
        }
        for (index, rule) in rules.iter().enumerate() {
            let expected = u8::try_from(index + 1).unwrap_or(u8::MAX);
            if rule.level != expected {
                return Err(ScanError::InvalidRuleSet(format!(
                    "level {} found where level {expected} was expected",
                    rule.level
                )));
            }
            if rule.level >= 2 && rule.file_patterns.is_empty() && rule.directory_patterns.is_empty()
            {
                return Err(ScanError::InvalidRuleSet(format!(
                    "level {} has no patterns",
                    rule.level
                )));
            }
        }
        Ok(Self { rules })
    }

    /// The built-in eight level rule set
    #[must_use]
    pub fn standard() -> Self {
        let rules = vec![
            LevelRule::from_static(
                1,
                "Level 1: Zero AI",
                "No context engineering; only conventional repository files",
                LEVEL_1_FILES,
                &[],
                1.0,
            ),
            LevelRule::from_static(
                2,
                "Level 2: Basic Instructions",
                "An instruction file tells AI assistants about the project",
                LEVEL_2_FILES,
                LEVEL_2_DIRS,
                1.5,
            ),
            LevelRule::from_static(
                3,
                "Level 3: Comprehensive Context",
                "Architecture, conventions and development docs an agent can rely on",
                LEVEL_3_FILES,
                LEVEL_3_DIRS,
                2.0,
            ),
            LevelRule::from_static(
                4,
                "Level 4: Skills & Automation",
                "Skills, slash commands, hooks and persistent memory files",
                LEVEL_4_FILES,
                LEVEL_4_DIRS,
                2.5,
            ),
            LevelRule::from_static(
                5,
                "Level 5: Multi-Agent Ready",
                "Specialized agent definitions and MCP tool integrations",
                LEVEL_5_FILES,
                LEVEL_5_DIRS,
                3.0,
            ),
            LevelRule::from_static(
                6,
                "Level 6: Fleet Infrastructure",
                "Shared context, issue-tracking memory and agent workflows",
                LEVEL_6_FILES,
                LEVEL_6_DIRS,
                3.5,
            ),
            LevelRule::from_static(
                7,
                "Level 7: Agent Fleet",
                "Governance, scheduling, handoffs and agent pipelines",
                LEVEL_7_FILES,
                LEVEL_7_DIRS,
                4.0,
            ),
            LevelRule::from_static(
                8,
                "Level 8: Custom Orchestration",
                "Custom orchestration layers and meta-automation",
                LEVEL_8_FILES,
                LEVEL_8_DIRS,
                5.0,
            ),
        ];
        Self { rules }
    }

    /// Rule for a level, if defined
    #[must_use]
    pub fn get(&self, level: u8) -> Option<&LevelRule> {
        self.rules.iter().find(|r| r.level == level)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelRule> {
        self.rules.iter()
    }

    /// Sum of all level weights
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.rules.iter().map(|r| r.weight).sum()
    }
}

const LEVEL_1_FILES: &[&str] = &[
    "README.md",
    "README",
    "README.rst",
    "LICENSE",
    ".gitignore",
    "CHANGELOG.md",
];

const LEVEL_2_FILES: &[&str] = &[
    // Claude Code
    "CLAUDE.md",
    // OpenAI Codex and cross-tool
    "AGENTS.md",
    "CODEX.md",
    // GitHub Copilot
    ".github/copilot-instructions.md",
    ".copilot-instructions.md",
    ".github/AGENTS.md",
    ".github/instructions/*.instructions.md",
    // Cursor
    ".cursorrules",
    ".cursor/rules/*.md",
    ".cursor/rules/*.mdc",
];

const LEVEL_2_DIRS: &[&str] = &[".cursor/rules", ".github/instructions"];

const LEVEL_3_FILES: &[&str] = &[
    // Architecture and specification
    "ARCHITECTURE.md",
    "docs/ARCHITECTURE.md",
    "docs/architecture/*.md",
    "DESIGN.md",
    "docs/design/*.md",
    "docs/adr/*.md",
    "docs/decisions/*.md",
    "docs/rfcs/*.md",
    "spec.md",
    "SPEC.md",
    "specs/*.md",
    "TECHNICAL_OVERVIEW.md",
    "API.md",
    "docs/api/*.md",
    "DATA_MODEL.md",
    "GLOSSARY.md",
    "DOMAIN.md",
    "SECURITY.md",
    // Conventions
    "CONVENTIONS.md",
    "STYLE.md",
    "STYLEGUIDE.md",
    "CONTRIBUTING.md",
    "PATTERNS.md",
    "ANTI_PATTERNS.md",
    "CODE_REVIEW.md",
    "NAMING.md",
    ".github/PULL_REQUEST_TEMPLATE.md",
    // Development context
    "DEVELOPMENT.md",
    "SETUP.md",
    "TESTING.md",
    "DEBUGGING.md",
    "PERFORMANCE.md",
    "DEPLOYMENT.md",
    "DEPENDENCIES.md",
    "MIGRATION.md",
    "docs/runbooks/*.md",
    "docs/guides/*.md",
    "docs/*.md",
];

const LEVEL_3_DIRS: &[&str] = &[
    "docs",
    "docs/architecture",
    "docs/adr",
    "docs/design",
    "docs/api",
    "docs/runbooks",
    "docs/guides",
];

const LEVEL_4_FILES: &[&str] = &[
    // Skills
    "SKILL.md",
    "skills/*/SKILL.md",
    ".claude/skills/*/SKILL.md",
    ".github/skills/*/SKILL.md",
    ".copilot/skills/*/SKILL.md",
    ".codex/skills/*/SKILL.md",
    ".cursor/skills/*/SKILL.md",
    "CAPABILITIES.md",
    // Commands and prompts
    ".claude/commands/*.md",
    ".github/prompts/*.prompt.md",
    "COMMANDS.md",
    "WORKFLOWS.md",
    // Hooks and automation
    ".claude/hooks/*.sh",
    ".claude/hooks/*.py",
    ".claude/settings.json",
    "Makefile",
    "justfile",
    "scripts/*.sh",
    // Memory
    "MEMORY.md",
    "LEARNINGS.md",
    "DECISIONS.md",
    ".memory/*.md",
    ".memory/*.json",
    "KNOWN_ISSUES.md",
    "TROUBLESHOOTING.md",
    "GOTCHAS.md",
];

const LEVEL_4_DIRS: &[&str] = &[
    "skills",
    ".claude/skills",
    ".claude/commands",
    ".claude/hooks",
    ".github/skills",
    ".github/prompts",
    ".memory",
];

const LEVEL_5_FILES: &[&str] = &[
    // Agent definitions
    ".github/agents/*.agent.md",
    ".github/agents/*.md",
    ".claude/agents/*.md",
    "agents/*.md",
    "roles/*.md",
    "personas/*.md",
    "PROMPTS.md",
    ".prompts/*.md",
    // MCP
    "mcp.json",
    ".mcp.json",
    ".mcp/*.json",
    "mcp-config.json",
    ".vscode/mcp.json",
    ".cursor/mcp.json",
    ".codex/config.toml",
];

const LEVEL_5_DIRS: &[&str] = &[
    ".github/agents",
    ".claude/agents",
    "agents",
    ".mcp",
    "roles",
    "personas",
    ".prompts",
];

const LEVEL_6_FILES: &[&str] = &[
    // Beads issue memory
    ".beads/*.jsonl",
    ".beads/*.json",
    ".beads/*.md",
    // Shared context across projects
    "SHARED_CONTEXT.md",
    "apps/*/CLAUDE.md",
    "services/*/CLAUDE.md",
    "apps/*/AGENTS.md",
    "services/*/AGENTS.md",
    "memory/global/*.md",
    "memory/project/*.md",
    ".agent_state/*.json",
    ".context/*.md",
    ".ai/*.md",
    "context.yaml",
    "context.json",
    // Workflows
    "workflows/*.yaml",
    "workflows/*.yml",
];

const LEVEL_6_DIRS: &[&str] = &[
    ".beads",
    "memory",
    "memory/global",
    "memory/project",
    ".agent_state",
    ".context",
    ".ai",
    "workflows",
];

const LEVEL_7_FILES: &[&str] = &[
    "GOVERNANCE.md",
    "AGENT_GOVERNANCE.md",
    "agents/HANDOFFS.md",
    "agents/ORCHESTRATION.md",
    "agents/SCHEDULING.md",
    "agents/REFERENCES.md",
    "pipelines/*.yaml",
    "pipelines/*.yml",
    ".github/workflows/*agent*.yml",
    ".github/workflows/*claude*.yml",
    ".github/workflows/*copilot*.yml",
    "queues/*.yaml",
    "schedules/*.yaml",
    "fleet.yaml",
    "fleet/*.yaml",
    "tools/TOOLS.md",
    "tools/*.json",
    ".mcp/servers/*.json",
];

const LEVEL_7_DIRS: &[&str] = &["pipelines", "fleet", "tools", ".mcp/servers", "queues"];

const LEVEL_8_FILES: &[&str] = &[
    "orchestration.yaml",
    "orchestration.yml",
    "orchestration/*.yaml",
    "orchestration/*.md",
    "gastown.yaml",
    "GASTOWN.md",
    "META_AUTOMATION.md",
    "convoys/*.yaml",
    "rigs/*.yaml",
    "agents/generators/*.md",
    "meta-agents/*.md",
    "FRONTIER.md",
];

const LEVEL_8_DIRS: &[&str] = &["orchestration", "convoys", "rigs", "meta-agents"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_levels_defined() {
        let rules = RuleSet::standard();
        for level in 1..=MAX_LEVEL {
            assert!(rules.get(level).is_some(), "level {level} missing");
        }
        assert!(rules.get(9).is_none());
    }

    #[test]
    fn test_levels_above_one_have_patterns() {
        for rule in RuleSet::standard().iter().filter(|r| r.level >= 2) {
            assert!(!rule.file_patterns.is_empty(), "level {} has no file patterns", rule.level);
        }
    }

    #[test]
    fn test_level_weights_increase() {
        let weights: Vec<f64> = RuleSet::standard().iter().map(|r| r.weight).collect();
        assert!(weights.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_standard_set_passes_validation() {
        let rules: Vec<LevelRule> = RuleSet::standard().iter().cloned().collect();
        assert!(RuleSet::new(rules).is_ok());
    }

    #[test]
    fn test_new_rejects_gaps() {
        let mut rules: Vec<LevelRule> = RuleSet::standard().iter().cloned().collect();
        rules[3].level = 9;
        assert!(matches!(
            RuleSet::new(rules),
            Err(ScanError::InvalidRuleSet(_))
        ));
    }

    #[test]
    fn test_total_patterns_counts_distinct() {
        let rule = LevelRule::from_static(2, "x", "y", &["a.md", "b.md"], &["a.md", "dir"], 1.0);
        assert_eq!(rule.total_patterns(), 3);
    }
}
