//! Prompt templates that wrap a code snippet in a canned instruction.

use std::fmt;
use std::str::FromStr;

use switchboard_common::SwitchboardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeAction {
    Review,
    Debug,
    Refactor,
    Document,
    Explain,
}

impl CodeAction {
    pub const ALL: [CodeAction; 5] = [
        CodeAction::Review,
        CodeAction::Debug,
        CodeAction::Refactor,
        CodeAction::Document,
        CodeAction::Explain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CodeAction::Review => "review",
            CodeAction::Debug => "debug",
            CodeAction::Refactor => "refactor",
            CodeAction::Document => "document",
            CodeAction::Explain => "explain",
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            CodeAction::Review => "Review the following code and provide feedback on quality, best practices, and potential issues:",
            CodeAction::Debug => "Debug and fix any issues in the following code:",
            CodeAction::Refactor => "Improve and refactor the following code for better readability and performance:",
            CodeAction::Document => "Write comprehensive documentation and comments for the following code:",
            CodeAction::Explain => "Explain what the following code does step by step:",
        }
    }

    /// Task text for this action applied to `code`.
    pub fn prompt(&self, code: &str) -> String {
        with_code(self.instruction(), code)
    }
}

/// Task text for a free-form instruction applied to `code`.
pub fn custom_prompt(instruction: &str, code: &str) -> String {
    with_code(instruction.trim(), code)
}

fn with_code(instruction: &str, code: &str) -> String {
    format!("{instruction}\n\n```\n{}\n```", code.trim_end())
}

impl fmt::Display for CodeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeAction {
    type Err = SwitchboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        CodeAction::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| {
                SwitchboardError::Config(format!(
                    "unknown action '{s}' (expected review, debug, refactor, document or explain)"
                ))
            })
    }
}
