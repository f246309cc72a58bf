//! Plain-text output for terminal use.

use std::fmt::Write;

use switchboard_common::{ExecutionPlan, RunResult};
use switchboard_coordinator::{HistoryEntry, StatusReport};

pub fn plan(plan: &ExecutionPlan) -> String {
    let mut out = String::from("Routing plan:\n");
    for step in plan {
        let _ = writeln!(
            out,
            "  {}. [{}] {} -> {}",
            step.id,
            step.category,
            step.description,
            step.provider.display_name()
        );
    }
    out
}

pub fn run_summary(result: &RunResult) -> String {
    let mut out = String::new();
    for item in &result.routing_plan {
        let _ = writeln!(
            out,
            "{}. [{}] {} -> {}",
            item.id,
            item.category,
            item.description,
            item.provider.display_name()
        );
    }
    for error in &result.errors {
        let _ = writeln!(out, "error: {error}");
    }
    out
}

pub fn status(report: &StatusReport) -> String {
    let mut out = String::new();
    for p in &report.providers {
        let _ = writeln!(
            out,
            "{:<10} {:<9} {:<24} {}",
            p.name,
            if p.active { "active" } else { "inactive" },
            p.specialty,
            p.model
        );
    }
    let _ = writeln!(
        out,
        "\n{}/{} providers available, {} tasks completed",
        report.available_providers, report.total_providers, report.tasks_completed
    );
    out
}

pub fn history_line(entry: &HistoryEntry) -> String {
    let preview: String = entry.task.chars().take(60).collect();
    format!(
        "{}  {}  {}  {}",
        entry.id,
        entry.timestamp,
        if entry.result.success { "ok  " } else { "FAIL" },
        preview
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_common::{Provider, SubRequest, TaskCategory};

    #[test]
    fn plan_lists_steps_with_providers() {
        let plan = ExecutionPlan::new(vec![SubRequest {
            id: 1,
            description: "Code Review phase".into(),
            category: TaskCategory::CodeReview,
            provider: Provider::Moonshot,
            prompt: String::new(),
            system_prompt: None,
            dependencies: Vec::new(),
        }])
        .unwrap();

        assert_eq!(
            super::plan(&plan),
            "Routing plan:\n  1. [code_review] Code Review phase -> Moonshot\n"
        );
    }

    #[test]
    fn summary_includes_errors() {
        let result = RunResult::planless_failure("t", "no providers");
        assert_eq!(run_summary(&result), "error: no providers\n");
    }
}
