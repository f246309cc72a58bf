use std::path::PathBuf;

use clap::{Parser, Subcommand};
use switchboard_coordinator::CodeAction;

#[derive(Debug, Parser)]
#[command(
    name = "switchboard",
    version,
    about = "Route a task across several AI providers and merge the answers"
)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, short, global = true, env = "SWITCHBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan, execute and consolidate a task
    Run {
        /// Task description; with --file, the instruction applied to the code
        #[arg(required_unless_present = "action", num_args = 1..)]
        task: Vec<String>,

        /// Canned instruction for the code in --file: review, debug,
        /// refactor, document or explain
        #[arg(long, requires = "file", conflicts_with = "task")]
        action: Option<CodeAction>,

        /// Code to work on; `-` reads standard input
        #[arg(long)]
        file: Option<PathBuf>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// Do not record the run in history
        #[arg(long)]
        no_history: bool,
    },

    /// Show the routing plan without calling any provider
    Plan {
        #[arg(required = true, num_args = 1..)]
        task: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show which providers are configured
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Inspect or prune recorded runs
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
}

#[derive(Debug, Subcommand)]
pub enum HistoryAction {
    /// List recorded runs, newest first
    List,
    /// Print one recorded run as JSON
    Show { id: String },
    /// Delete one recorded run
    Remove { id: String },
    /// Delete every recorded run
    Clear,
    /// Print one recorded run as a Markdown document
    Export { id: String },
    /// Run a recorded task again and record the new result
    Rerun {
        id: String,

        #[arg(long)]
        json: bool,
    },
}

/// Words given on the command line joined back into one task.
pub fn task_text(words: &[String]) -> String {
    words.join(" ").trim().to_string()
}
