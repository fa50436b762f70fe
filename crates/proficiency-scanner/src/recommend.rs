//! Next-step recommendations
//!
//! Each level has a handler that looks at what the *next* level is missing
//! and proposes the most valuable artifacts first. Every suggestion carries
//! a topic (matched against `skip_recommendations`) and an area (matched
//! against `focus_areas`).

use crate::calculator;
use crate::config::RepoConfig;
use crate::levels::MAX_LEVEL;
use crate::types::{LevelScore, RepoScore};

/// Instruction files scoring below this get an improvement suggestion
const LOW_QUALITY_SCORE: f64 = 5.0;

/// Broken references listed by name before summarizing the rest
const BROKEN_REFERENCES_SHOWN: usize = 3;

/// A single suggestion before filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    /// Keyword that `skip_recommendations` can name
    pub topic: &'static str,
    /// Category that `focus_areas` can name
    pub area: &'static str,
    pub text: String,
}

impl Recommendation {
    fn new(topic: &'static str, area: &'static str, text: impl Into<String>) -> Self {
        Self {
            topic,
            area,
            text: text.into(),
        }
    }
}

type Handler = fn(&Context<'_>) -> Vec<Recommendation>;

/// Handler per current level; index 0 is Level 1
const HANDLERS: [Handler; MAX_LEVEL as usize] = [
    from_level_1,
    from_level_2,
    from_level_3,
    from_level_4,
    from_level_5,
    from_level_6,
    from_level_7,
    from_level_8,
];

struct Context<'a> {
    score: &'a RepoScore,
    config: &'a RepoConfig,
    next: Option<&'a LevelScore>,
    tools: Vec<&'a str>,
}

impl Context<'_> {
    /// None of the given patterns of the next level matched
    fn missing(&self, patterns: &[&str]) -> bool {
        self.next
            .map_or(true, |next| !patterns.iter().any(|p| next.pattern_matched(p)))
    }

    fn uses(&self, tool: &str) -> bool {
        self.tools.contains(&tool)
    }

    /// Tool-specific locations, falling back when no listed tool is in use
    fn paths(&self, table: &[(&str, &'static str)], fallback: &'static str) -> String {
        let mut chosen: Vec<&str> = Vec::new();
        for (tool, path) in table {
            if self.uses(tool) && !chosen.contains(path) {
                chosen.push(path);
            }
        }
        if chosen.is_empty() {
            fallback.to_string()
        } else {
            chosen.join(" and ")
        }
    }

    fn instruction_file(&self) -> String {
        self.paths(
            &[
                ("claude-code", "CLAUDE.md"),
                ("github-copilot", ".github/copilot-instructions.md"),
                ("cursor", ".cursor/rules/project.mdc"),
                ("openai-codex", "AGENTS.md"),
            ],
            "CLAUDE.md or AGENTS.md",
        )
    }
}

/// Recommendations for a scored repository, in priority order
///
/// Deterministic for a given score and config. Empty only at Level 8 or
/// when every suggestion was skipped or filtered out.
#[must_use]
pub fn generate_recommendations(score: &RepoScore, config: &RepoConfig) -> Vec<String> {
    collect_recommendations(score, config)
        .into_iter()
        .filter(|rec| {
            !config.skip_recommendations.contains(rec.topic)
                && (config.focus_areas.is_empty() || config.focus_areas.contains(rec.area))
        })
        .map(|rec| rec.text)
        .collect()
}

/// All suggestions before skip and focus filtering
#[must_use]
pub fn collect_recommendations(score: &RepoScore, config: &RepoConfig) -> Vec<Recommendation> {
    let tools: Vec<&str> = if config.tools.is_empty() {
        score.detected_tools.iter().map(String::as_str).collect()
    } else {
        config.tools.iter().map(String::as_str).collect()
    };
    let level = score.overall_level.clamp(1, MAX_LEVEL);
    let ctx = Context {
        score,
        config,
        next: score.level_scores.get(&(level + 1)),
        tools,
    };

    let mut recs = Vec::new();

    if config.tools.is_empty() && !score.detected_tools.is_empty() {
        recs.push(Recommendation::new(
            "tools",
            "tools",
            format!(
                "Detected AI tools: {}. Declare them under `tools:` in .ai-proficiency.yaml to pin tool-specific advice",
                score.detected_tools.join(", ")
            ),
        ));
    }

    let mut level_recs = HANDLERS[usize::from(level - 1)](&ctx);
    if let Some(progress) = progress(&ctx) {
        level_recs.push(progress);
    }
    if level_recs.is_empty() {
        level_recs.extend(fallback(&ctx));
    }
    recs.extend(level_recs);

    recs.extend(reference_findings(&ctx));
    recs.extend(quality_findings(&ctx));
    recs
}

fn from_level_1(ctx: &Context<'_>) -> Vec<Recommendation> {
    let Some(next) = ctx.next else {
        return Vec::new();
    };
    if next.substantive_file_count() > 0 {
        return Vec::new();
    }
    let text = if next.matched_files.is_empty() {
        format!(
            "Create {} describing what the project does, how to build and test it, and the conventions to follow",
            ctx.instruction_file()
        )
    } else {
        let stubs: Vec<&str> = next.matched_files.iter().map(|f| f.path.as_str()).collect();
        format!(
            "Expand {} with real project context; files of {} bytes or less do not count yet",
            stubs.join(", "),
            ctx.config.quality.substantive_threshold_bytes
        )
    };
    vec![Recommendation::new("instructions", "instructions", text)]
}

fn from_level_2(ctx: &Context<'_>) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    if ctx.missing(&[
        "ARCHITECTURE.md",
        "docs/ARCHITECTURE.md",
        "docs/architecture/*.md",
        "docs/architecture",
    ]) {
        recs.push(Recommendation::new(
            "architecture",
            "documentation",
            "Add ARCHITECTURE.md covering the main components and how data flows between them",
        ));
    }
    if ctx.missing(&["CONVENTIONS.md", "STYLE.md", "STYLEGUIDE.md"]) {
        recs.push(Recommendation::new(
            "conventions",
            "documentation",
            "Add CONVENTIONS.md with naming, formatting and error handling rules agents should follow",
        ));
    }
    if ctx.missing(&["PATTERNS.md", "ANTI_PATTERNS.md"]) {
        recs.push(Recommendation::new(
            "patterns",
            "documentation",
            "Add PATTERNS.md with examples of preferred code patterns and the ones to avoid",
        ));
    }
    if ctx.missing(&["TESTING.md"]) {
        recs.push(Recommendation::new(
            "testing",
            "documentation",
            "Add TESTING.md explaining how tests are organized and run",
        ));
    }
    if ctx.missing(&["docs/adr/*.md", "docs/decisions/*.md", "docs/adr"]) {
        recs.push(Recommendation::new(
            "adr",
            "documentation",
            "Record architecture decisions in docs/adr/ so agents know why things are the way they are",
        ));
    }
    if ctx.missing(&["CONTRIBUTING.md", "DEVELOPMENT.md", "SETUP.md"]) {
        recs.push(Recommendation::new(
            "development",
            "documentation",
            "Add CONTRIBUTING.md or DEVELOPMENT.md with the local setup and workflow",
        ));
    }
    recs
}

fn from_level_3(ctx: &Context<'_>) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    if ctx.missing(&[
        "SKILL.md",
        "skills/*/SKILL.md",
        ".claude/skills/*/SKILL.md",
        ".github/skills/*/SKILL.md",
        ".copilot/skills/*/SKILL.md",
        ".codex/skills/*/SKILL.md",
        ".cursor/skills/*/SKILL.md",
        "skills",
        ".claude/skills",
        ".github/skills",
    ]) {
        let dir = ctx.paths(
            &[
                ("claude-code", ".claude/skills/"),
                ("github-copilot", ".github/skills/"),
                ("openai-codex", ".codex/skills/"),
                ("cursor", ".cursor/skills/"),
            ],
            "skills/",
        );
        recs.push(Recommendation::new(
            "skills",
            "skills",
            format!("Package repeatable tasks as skills: {dir}<name>/SKILL.md"),
        ));
    }
    if ctx.missing(&[
        ".claude/commands/*.md",
        ".github/prompts/*.prompt.md",
        "COMMANDS.md",
        ".claude/commands",
        ".github/prompts",
    ]) {
        let location = ctx.paths(
            &[
                ("claude-code", ".claude/commands/"),
                ("github-copilot", ".github/prompts/"),
            ],
            "COMMANDS.md",
        );
        recs.push(Recommendation::new(
            "commands",
            "commands",
            format!("Capture frequent workflows as reusable commands in {location}"),
        ));
    }
    if ctx.uses("claude-code")
        && ctx.missing(&[
            ".claude/hooks/*.sh",
            ".claude/hooks/*.py",
            ".claude/settings.json",
            ".claude/hooks",
        ])
    {
        recs.push(Recommendation::new(
            "hooks",
            "hooks",
            "Add .claude/hooks/ to run formatters and checks automatically after edits",
        ));
    }
    if ctx.missing(&["Makefile", "justfile", "scripts/*.sh"]) {
        recs.push(Recommendation::new(
            "automation",
            "hooks",
            "Expose build, test and lint as one-word targets in a Makefile or justfile",
        ));
    }
    if ctx.missing(&[
        "MEMORY.md",
        "LEARNINGS.md",
        "DECISIONS.md",
        ".memory/*.md",
        ".memory/*.json",
        ".memory",
    ]) {
        recs.push(Recommendation::new(
            "memory",
            "memory",
            "Start a MEMORY.md where agents record learnings between sessions",
        ));
    }
    if ctx.missing(&["KNOWN_ISSUES.md", "TROUBLESHOOTING.md", "GOTCHAS.md"]) {
        recs.push(Recommendation::new(
            "gotchas",
            "memory",
            "Document known pitfalls in GOTCHAS.md or TROUBLESHOOTING.md",
        ));
    }
    recs
}

fn from_level_4(ctx: &Context<'_>) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    if ctx.missing(&[
        ".github/agents/*.agent.md",
        ".github/agents/*.md",
        ".claude/agents/*.md",
        "agents/*.md",
        ".github/agents",
        ".claude/agents",
        "agents",
    ]) {
        let dir = ctx.paths(
            &[
                ("claude-code", ".claude/agents/"),
                ("github-copilot", ".github/agents/"),
            ],
            "agents/",
        );
        recs.push(Recommendation::new(
            "agents",
            "agents",
            format!("Define specialized agents such as a reviewer or a test writer in {dir}"),
        ));
    }
    if ctx.missing(&[
        "mcp.json",
        ".mcp.json",
        ".mcp/*.json",
        "mcp-config.json",
        ".vscode/mcp.json",
        ".cursor/mcp.json",
        ".codex/config.toml",
        ".mcp",
    ]) {
        let file = ctx.paths(
            &[
                ("claude-code", ".mcp.json"),
                ("github-copilot", ".vscode/mcp.json"),
                ("cursor", ".cursor/mcp.json"),
                ("openai-codex", ".codex/config.toml"),
            ],
            ".mcp.json",
        );
        recs.push(Recommendation::new(
            "mcp",
            "mcp",
            format!("Connect agents to external tools with MCP servers configured in {file}"),
        ));
    }
    if ctx.missing(&[
        "roles/*.md",
        "personas/*.md",
        "PROMPTS.md",
        ".prompts/*.md",
        "roles",
        "personas",
        ".prompts",
    ]) {
        recs.push(Recommendation::new(
            "personas",
            "agents",
            "Describe agent roles in roles/ or personas/ so work can be split between them",
        ));
    }
    recs
}

fn from_level_5(ctx: &Context<'_>) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    if ctx.missing(&[".beads/*.jsonl", ".beads/*.json", ".beads/*.md", ".beads"]) {
        recs.push(Recommendation::new(
            "beads",
            "memory",
            "Track agent work items in .beads/ so tasks survive across sessions and agents",
        ));
    }
    if ctx.missing(&[
        "SHARED_CONTEXT.md",
        ".context/*.md",
        ".ai/*.md",
        "context.yaml",
        "context.json",
        ".context",
        ".ai",
    ]) {
        recs.push(Recommendation::new(
            "shared-context",
            "memory",
            "Add SHARED_CONTEXT.md with context every agent in the fleet should load",
        ));
    }
    if ctx.missing(&["workflows/*.yaml", "workflows/*.yml", "workflows"]) {
        recs.push(Recommendation::new(
            "workflows",
            "orchestration",
            "Describe multi-step agent workflows in workflows/*.yaml",
        ));
    }
    if ctx.missing(&[
        ".agent_state/*.json",
        "memory/global/*.md",
        "memory/project/*.md",
        ".agent_state",
        "memory",
        "memory/global",
        "memory/project",
    ]) {
        recs.push(Recommendation::new(
            "agent-state",
            "memory",
            "Persist agent state in .agent_state/ or memory/project/ for long-running work",
        ));
    }
    recs
}

fn from_level_6(ctx: &Context<'_>) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    if ctx.missing(&["GOVERNANCE.md", "AGENT_GOVERNANCE.md"]) {
        recs.push(Recommendation::new(
            "governance",
            "orchestration",
            "Write AGENT_GOVERNANCE.md stating what agents may change on their own and what needs review",
        ));
    }
    if ctx.missing(&[
        "agents/HANDOFFS.md",
        "agents/ORCHESTRATION.md",
        "agents/SCHEDULING.md",
    ]) {
        recs.push(Recommendation::new(
            "handoffs",
            "agents",
            "Document how work passes between agents in agents/HANDOFFS.md",
        ));
    }
    if ctx.missing(&[
        "pipelines/*.yaml",
        "pipelines/*.yml",
        "queues/*.yaml",
        "schedules/*.yaml",
        "pipelines",
        "queues",
    ]) {
        recs.push(Recommendation::new(
            "pipelines",
            "orchestration",
            "Define agent pipelines in pipelines/*.yaml",
        ));
    }
    if ctx.missing(&[
        ".github/workflows/*agent*.yml",
        ".github/workflows/*claude*.yml",
        ".github/workflows/*copilot*.yml",
    ]) {
        let workflow = ctx.paths(
            &[
                ("claude-code", ".github/workflows/claude.yml"),
                ("github-copilot", ".github/workflows/copilot-agent.yml"),
            ],
            ".github/workflows/agent.yml",
        );
        recs.push(Recommendation::new(
            "ci-agents",
            "orchestration",
            format!("Run agents from CI with {workflow}"),
        ));
    }
    if ctx.missing(&[
        "tools/TOOLS.md",
        "tools/*.json",
        ".mcp/servers/*.json",
        "tools",
        ".mcp/servers",
    ]) {
        recs.push(Recommendation::new(
            "tool-registry",
            "tools",
            "Keep a registry of the tools agents can call in tools/TOOLS.md",
        ));
    }
    recs
}

fn from_level_7(ctx: &Context<'_>) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    if ctx.missing(&[
        "orchestration.yaml",
        "orchestration.yml",
        "orchestration/*.yaml",
        "orchestration/*.md",
        "orchestration",
    ]) {
        recs.push(Recommendation::new(
            "orchestration",
            "orchestration",
            "Describe your custom orchestration layer in orchestration.yaml",
        ));
    }
    if ctx.missing(&[
        "gastown.yaml",
        "GASTOWN.md",
        "convoys/*.yaml",
        "rigs/*.yaml",
        "convoys",
        "rigs",
    ]) {
        recs.push(Recommendation::new(
            "gastown",
            "orchestration",
            "Consider a Gas Town setup (gastown.yaml, convoys/, rigs/) to coordinate many agents",
        ));
    }
    if ctx.missing(&[
        "meta-agents/*.md",
        "agents/generators/*.md",
        "META_AUTOMATION.md",
        "meta-agents",
    ]) {
        recs.push(Recommendation::new(
            "meta-agents",
            "agents",
            "Add meta-agents/ that generate or tune other agents",
        ));
    }
    recs
}

fn from_level_8(_ctx: &Context<'_>) -> Vec<Recommendation> {
    Vec::new()
}

/// How many more patterns the next level needs to reach its threshold
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn progress(ctx: &Context<'_>) -> Option<Recommendation> {
    let next = ctx.next?;
    let threshold = calculator::threshold(next.level, ctx.config)?;
    if next.total_patterns == 0 {
        return None;
    }
    let required = (threshold * next.total_patterns as f64 / 100.0).ceil().max(0.0) as usize;
    let missing = required.saturating_sub(next.matched_patterns.len());
    if missing == 0 {
        return None;
    }
    Some(Recommendation::new(
        "progress",
        level_area(next.level),
        format!(
            "{} needs {threshold}% pattern coverage: {} of {} patterns found, add {missing} more",
            next.name,
            next.matched_patterns.len(),
            next.total_patterns
        ),
    ))
}

/// Generic suggestion built from the next level's description
fn fallback(ctx: &Context<'_>) -> Option<Recommendation> {
    let next = ctx.next?;
    Some(Recommendation::new(
        "progress",
        level_area(next.level),
        format!(
            "Work toward {}: {}",
            next.name,
            next.description.to_lowercase()
        ),
    ))
}

fn level_area(level: u8) -> &'static str {
    match level {
        2 => "instructions",
        3 => "documentation",
        4 => "skills",
        5 => "agents",
        6 => "memory",
        _ => "orchestration",
    }
}

fn reference_findings(ctx: &Context<'_>) -> Vec<Recommendation> {
    let refs = &ctx.score.cross_references;
    let broken: Vec<String> = refs
        .broken_references()
        .map(|r| format!("{}:{} -> {}", r.source_file, r.line_number, r.target))
        .collect();

    let mut recs = Vec::new();
    if !broken.is_empty() {
        let mut listed = broken
            .iter()
            .take(BROKEN_REFERENCES_SHOWN)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        if broken.len() > BROKEN_REFERENCES_SHOWN {
            listed.push_str(&format!(
                " and {} more",
                broken.len() - BROKEN_REFERENCES_SHOWN
            ));
        }
        recs.push(Recommendation::new(
            "references",
            "references",
            format!(
                "Fix {} broken reference(s) in instruction files: {listed}",
                broken.len()
            ),
        ));
    } else if refs.references.is_empty()
        && refs.source_files_scanned > 0
        && ctx
            .score
            .level_scores
            .get(&3)
            .is_some_and(|l3| l3.file_count() > 0)
    {
        recs.push(Recommendation::new(
            "references",
            "references",
            format!(
                "Link your documentation from {} so agents can find it",
                ctx.instruction_file()
            ),
        ));
    }
    recs
}

fn quality_findings(ctx: &Context<'_>) -> Vec<Recommendation> {
    let partial = ctx.config.quality.word_threshold_partial;
    ctx.score
        .cross_references
        .quality_scores
        .values()
        .filter(|q| q.quality_score < LOW_QUALITY_SCORE)
        .map(|q| {
            let mut missing = Vec::new();
            if !q.has_sections {
                missing.push("section headers");
            }
            if !q.has_paths {
                missing.push("concrete file paths");
            }
            if !q.has_commands {
                missing.push("runnable commands");
            }
            if !q.has_constraints {
                missing.push("explicit rules (never/always)");
            }
            if q.word_count < partial {
                missing.push("more detail");
            }
            let advice = if missing.is_empty() {
                "keep it current as the project changes".to_string()
            } else {
                format!("add {}", missing.join(", "))
            };
            Recommendation::new(
                "quality",
                "quality",
                format!(
                    "Improve {} (quality {:.1}/10): {advice}",
                    q.file_path, q.quality_score
                ),
            )
        })
        .collect()
}
