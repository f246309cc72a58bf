//! Static per-category routing table.
//!
//! Built once on first use and never mutated. Order follows
//! [`TaskCategory::ALL`].

use regex::Regex;
use std::sync::LazyLock;
use switchboard_common::{Provider, TaskCategory};

/// Everything the planner needs to know about one category.
#[derive(Debug)]
pub struct CategoryProfile {
    pub category: TaskCategory,
    pub patterns: Vec<Regex>,
    pub preferred_provider: Provider,
    pub system_prompt: &'static str,
    pub prompt_prefix: &'static str,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
        .collect()
}

fn build(category: TaskCategory) -> CategoryProfile {
    let (patterns, preferred_provider, system_prompt, prompt_prefix): (
        &[&str],
        Provider,
        &'static str,
        &'static str,
    ) = match category {
        TaskCategory::Architecture => (
            &[
                "architect",
                "design",
                "structure",
                "system design",
                "high.?level",
                "overview",
                "blueprint",
                "schema",
                "database design",
                "api design",
                "microservice",
            ],
            Provider::OpenAi,
            "You are a senior software architect. Focus on system design, scalability, and best practices. Provide clear architectural diagrams in text format when helpful.",
            "Focus on the architecture and system design aspects of this task:\n\n",
        ),
        TaskCategory::Roadmap => (
            &[
                "roadmap",
                "plan",
                "strategy",
                "milestone",
                "timeline",
                "phase",
                "sprint",
                "project plan",
                "release plan",
            ],
            Provider::OpenAi,
            "You are a technical project manager. Create detailed, actionable roadmaps with clear milestones and timelines.",
            "Create a roadmap and project plan for:\n\n",
        ),
        TaskCategory::Coding => (
            &[
                "implement",
                "code",
                "write",
                "function",
                "class",
                "script",
                "program",
                "develop",
                "build",
                "create.*function",
                "api endpoint",
                "module",
                "library",
            ],
            Provider::Anthropic,
            "You are an expert software engineer. Write clean, well-documented, production-ready code. Include error handling and follow best practices.",
            "Implement the code for the following requirement:\n\n",
        ),
        TaskCategory::Debugging => (
            &[
                "debug",
                "fix",
                "error",
                "bug",
                "issue",
                "problem",
                "not working",
                "fails",
                "crash",
                "exception",
            ],
            Provider::Anthropic,
            "You are a debugging expert. Analyze issues methodically, identify root causes, and provide clear solutions with explanations.",
            "Debug and fix issues in the following:\n\n",
        ),
        TaskCategory::Reasoning => (
            &[
                "reason",
                "logic",
                "explain",
                "why",
                "analyze",
                "think",
                "evaluate",
                "compare",
                "pros.?cons",
                "trade.?off",
                "decision",
                "choose",
                "best approach",
            ],
            Provider::Gemini,
            "You are an analytical thinker. Break down complex problems, evaluate trade-offs, and provide well-reasoned conclusions.",
            "Analyze and reason about the following:\n\n",
        ),
        TaskCategory::Logic => (
            &[
                "algorithm",
                "optimize",
                "complexity",
                "efficient",
                "performance",
                "mathematical",
                "formula",
                "calculate",
            ],
            Provider::Gemini,
            "You are an algorithms expert. Focus on efficiency, complexity analysis, and optimal solutions.",
            "Provide algorithmic and logical analysis for:\n\n",
        ),
        TaskCategory::CodeReview => (
            &[
                "review",
                "check",
                "audit",
                "inspect",
                "feedback",
                "improve",
                "refactor",
                "quality",
                "best practice",
                "security",
                "vulnerability",
            ],
            Provider::Moonshot,
            "You are a code review specialist. Identify issues, suggest improvements, check for security vulnerabilities, and ensure code quality.",
            "Review and provide feedback on:\n\n",
        ),
        TaskCategory::Documentation => (
            &[
                "document",
                "readme",
                "comment",
                "docstring",
                "specification",
                "wiki",
                "guide",
                "tutorial",
            ],
            Provider::OpenAi,
            "You are a technical writer. Create clear, comprehensive documentation that is easy to understand.",
            "Write documentation for:\n\n",
        ),
        TaskCategory::General => (
            &[],
            Provider::OpenAi,
            "You are a helpful AI assistant. Provide clear, accurate, and helpful responses.",
            "",
        ),
    };

    CategoryProfile {
        category,
        patterns: compile(patterns),
        preferred_provider,
        system_prompt,
        prompt_prefix,
    }
}

static PROFILES: LazyLock<Vec<CategoryProfile>> =
    LazyLock::new(|| TaskCategory::ALL.into_iter().map(build).collect());

/// All profiles in declaration order.
pub fn profiles() -> &'static [CategoryProfile] {
    &PROFILES
}

pub fn profile(category: TaskCategory) -> &'static CategoryProfile {
    // PROFILES is built from TaskCategory::ALL, which lists every variant
    &PROFILES[category as usize]
}
