//! Markdown rendering of recorded runs.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::history::HistoryEntry;

/// A recorded run as a standalone Markdown document: when it ran, the
/// task, which provider and model handled each step, and the merged
/// answer.
pub fn markdown(entry: &HistoryEntry) -> String {
    let date = i64::try_from(entry.timestamp)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let task = if entry.task.trim().is_empty() {
        "N/A"
    } else {
        entry.task.as_str()
    };

    let mut md = String::from("# Switchboard Result\n\n");
    let _ = write!(md, "**Date:** {date}\n\n");
    let _ = write!(md, "## Task\n\n{task}\n\n");
    md.push_str("## Models Used\n\n");

    for result in &entry.result.results {
        let model = result
            .metadata
            .get("model")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown");
        let _ = write!(
            md,
            "- **{}** ({model}): {}",
            result.provider_display_name(),
            result.request.category
        );
        if !result.success {
            md.push_str(" (failed)");
        }
        md.push('\n');
    }

    let output = if entry.result.consolidated.trim().is_empty() {
        "No output"
    } else {
        entry.result.consolidated.as_str()
    };
    let _ = writeln!(md, "\n## Result\n\n{output}");

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_common::{Provider, RunResult, SubRequest, SubResult, TaskCategory};

    fn sub_result(
        id: usize,
        category: TaskCategory,
        provider: Provider,
        model: &str,
        success: bool,
    ) -> SubResult {
        let mut metadata = serde_json::Map::new();
        metadata.insert("model".into(), model.into());

        SubResult {
            request: SubRequest {
                id,
                description: format!("{} phase", category.title()),
                category,
                provider,
                prompt: String::new(),
                system_prompt: None,
                dependencies: Vec::new(),
            },
            executed_by: Some(provider),
            content: if success { "done".into() } else { String::new() },
            success,
            error: (!success).then(|| "HTTP 500".to_string()),
            tokens_used: None,
            metadata,
        }
    }

    fn entry(results: Vec<SubResult>, consolidated: &str) -> HistoryEntry {
        HistoryEntry {
            id: "abc".into(),
            // 2024-01-02 03:04:05 UTC
            timestamp: 1_704_164_645_000,
            task: "Design a REST API and implement authentication".into(),
            result: RunResult {
                task: "Design a REST API and implement authentication".into(),
                routing_plan: Vec::new(),
                results,
                consolidated: consolidated.into(),
                success: true,
                errors: Vec::new(),
            },
        }
    }

    #[test]
    fn export_lists_task_models_and_result() {
        let md = markdown(&entry(
            vec![
                sub_result(1, TaskCategory::Architecture, Provider::OpenAi, "gpt-4", true),
                sub_result(2, TaskCategory::Coding, Provider::Anthropic, "claude-3-opus-20240229", false),
            ],
            "## Architecture (OpenAI)\n\ndone",
        ));

        assert_eq!(
            md,
            "# Switchboard Result\n\n\
             **Date:** 2024-01-02 03:04:05 UTC\n\n\
             ## Task\n\nDesign a REST API and implement authentication\n\n\
             ## Models Used\n\n\
             - **OpenAI** (gpt-4): architecture\n\
             - **Anthropic** (claude-3-opus-20240229): coding (failed)\n\
             \n## Result\n\n## Architecture (OpenAI)\n\ndone\n"
        );
    }

    #[test]
    fn export_of_a_planless_failure_says_no_output() {
        let md = markdown(&entry(Vec::new(), ""));
        assert!(md.contains("## Models Used\n\n\n## Result\n\nNo output\n"));
    }
}
