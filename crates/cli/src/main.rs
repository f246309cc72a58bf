//! switchboard command-line client.
//!
//! Usage:
//!   switchboard run "Design a REST API and implement authentication"
//!   switchboard run --action review --file src/lib.rs
//!   git diff | switchboard run "summarize this change" --file -
//!   switchboard plan "fix this bug"
//!   switchboard status
//!   switchboard history show <id>
//!   switchboard history export <id> > run.md
//!   switchboard history rerun <id>
//!
//! # Environment Variables
//!
//! - `SWITCHBOARD_CONFIG` - path to the TOML configuration file
//! - `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `GEMINI_API_KEY`, `MOONSHOT_API_KEY`
//! - `RUST_LOG` - log filter (default: `warn,switchboard=info`)

mod args;
mod render;

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use switchboard_common::RunResult;
use switchboard_coordinator::{
    custom_prompt, export, CodeAction, HistoryEntry, HistoryStore, Orchestrator, ProgressSink,
    SwitchboardConfig,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::{task_text, Cli, Command, HistoryAction};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,switchboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SwitchboardConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SwitchboardConfig::default(),
    };
    debug!(config = ?cli.config, "Configuration loaded");

    match cli.command {
        Command::Run {
            task,
            action,
            file,
            json,
            no_history,
        } => {
            let code = file.as_deref().map(read_code).transpose()?;
            let task = compose_task(&task, action, code.as_deref())?;
            run(&config, &task, json, no_history).await
        }
        Command::Plan { task, json } => {
            let plan = orchestrator(&config).plan(&task_text(&task))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan.routing_plan())?);
            } else {
                print!("{}", render::plan(&plan));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Status { json } => {
            let history = open_history(&config)?;
            let report = switchboard_coordinator::status(&config, &history);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render::status(&report));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::History { action } => {
            history(&config, action.unwrap_or(HistoryAction::List)).await
        }
    }
}

fn orchestrator(config: &SwitchboardConfig) -> Orchestrator {
    Orchestrator::new(
        Arc::new(config.clone()),
        Arc::new(config.client_factory()),
        config.client_settings(),
    )
}

fn open_history(config: &SwitchboardConfig) -> anyhow::Result<HistoryStore> {
    Ok(match &config.history.path {
        Some(path) => HistoryStore::open(path, config.history.max_items)
            .with_context(|| format!("opening history at {}", path.display()))?,
        None => HistoryStore::new(config.history.max_items),
    })
}

/// Task text from the command line, wrapping `--file` contents when given.
fn compose_task(
    words: &[String],
    action: Option<CodeAction>,
    code: Option<&str>,
) -> anyhow::Result<String> {
    let Some(code) = code else {
        return Ok(task_text(words));
    };

    if code.trim().is_empty() {
        anyhow::bail!("no code to work on");
    }

    Ok(match action {
        Some(action) => action.prompt(code),
        None => custom_prompt(&task_text(words), code),
    })
}

fn read_code(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut code = String::new();
        std::io::stdin()
            .read_to_string(&mut code)
            .context("reading code from standard input")?;
        return Ok(code);
    }

    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

async fn run(
    config: &SwitchboardConfig,
    task: &str,
    json: bool,
    no_history: bool,
) -> anyhow::Result<ExitCode> {
    if task.is_empty() {
        anyhow::bail!("task description is empty");
    }

    let progress: ProgressSink<'_> = &|message: &str| eprintln!("{message}");
    let result = orchestrator(config).run(task, Some(progress)).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        eprint!("{}", render::run_summary(&result));
        println!("{}", result.consolidated);
    }

    if !no_history {
        record_run(config, task, &result);
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Best effort: a history failure never changes the outcome of a run.
fn record_run(config: &SwitchboardConfig, task: &str, result: &RunResult) -> Option<HistoryEntry> {
    let recorded = open_history(config)
        .and_then(|mut history| history.record(task, result).context("writing history"));

    match recorded {
        Ok(entry) => {
            info!(entry_id = %entry.id, "Run recorded");
            Some(entry)
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "Run not recorded in history");
            None
        }
    }
}

async fn history(config: &SwitchboardConfig, action: HistoryAction) -> anyhow::Result<ExitCode> {
    let mut history = open_history(config)?;

    match action {
        HistoryAction::List => {
            if history.is_empty() {
                println!("No recorded runs.");
            }
            for entry in history.entries() {
                println!("{}", render::history_line(entry));
            }
        }
        HistoryAction::Show { id } => {
            let entry = history
                .get(&id)
                .with_context(|| format!("no history entry {id}"))?;
            println!("{}", serde_json::to_string_pretty(entry)?);
        }
        HistoryAction::Remove { id } => {
            history.remove(&id)?;
            println!("Removed {id}");
        }
        HistoryAction::Clear => {
            history.clear()?;
            println!("History cleared");
        }
        HistoryAction::Export { id } => {
            let entry = history
                .get(&id)
                .with_context(|| format!("no history entry {id}"))?;
            print!("{}", export::markdown(entry));
        }
        HistoryAction::Rerun { id, json } => {
            let task = history
                .get(&id)
                .map(|entry| entry.task.clone())
                .with_context(|| format!("no history entry {id}"))?;
            info!(entry_id = %id, "Re-running recorded task");
            return run(config, &task, json, false).await;
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_coordinator::HistoryConfig;

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn config_with_history(path: &Path) -> SwitchboardConfig {
        SwitchboardConfig {
            history: HistoryConfig {
                max_items: 5,
                path: Some(path.to_path_buf()),
            },
            ..Default::default()
        }
    }

    #[test]
    fn plain_task_passes_through() {
        let task = compose_task(&words("fix this bug"), None, None).unwrap();
        assert_eq!(task, "fix this bug");
    }

    #[test]
    fn action_wraps_file_contents() {
        let task = compose_task(&[], Some(CodeAction::Explain), Some("let x = 1;\n")).unwrap();
        assert_eq!(
            task,
            "Explain what the following code does step by step:\n\n```\nlet x = 1;\n```"
        );
    }

    #[test]
    fn task_words_become_a_custom_instruction_for_code() {
        let task = compose_task(&words("port this to Go"), None, Some("print(1)")).unwrap();
        assert_eq!(task, "port this to Go\n\n```\nprint(1)\n```");
    }

    #[test]
    fn empty_code_is_rejected() {
        assert!(compose_task(&[], Some(CodeAction::Review), Some("  \n")).is_err());
    }

    #[test]
    fn code_is_read_from_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippet.rs");
        std::fs::write(&path, "fn main() {}").unwrap();

        assert_eq!(read_code(&path).unwrap(), "fn main() {}");
        assert!(read_code(&dir.path().join("missing.rs")).is_err());
    }

    #[test]
    fn run_is_recorded_when_history_is_writable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let result = RunResult::planless_failure("task", "no providers");

        let entry = record_run(&config_with_history(&path), "task", &result).unwrap();
        let store = HistoryStore::open(&path, 5).unwrap();
        assert!(store.get(&entry.id).is_some());
    }

    #[test]
    fn unreadable_history_does_not_fail_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let result = RunResult::planless_failure("task", "no providers");

        // the history path is a directory, so opening it fails
        assert!(record_run(&config_with_history(dir.path()), "task", &result).is_none());

        let corrupt = dir.path().join("history.json");
        std::fs::write(&corrupt, "not json").unwrap();
        assert!(record_run(&config_with_history(&corrupt), "task", &result).is_none());
    }
}
