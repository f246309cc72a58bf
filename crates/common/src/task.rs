//! Plan and result types for task routing.

use crate::error::{Result, SwitchboardError};
use crate::provider::Provider;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed classification label for a task.
///
/// Declaration order matters: it is the order `detect_all` reports
/// categories in and the tie-break order for `detect_primary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Architecture,
    Roadmap,
    Coding,
    Debugging,
    Reasoning,
    Logic,
    CodeReview,
    Documentation,
    General,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 9] = [
        TaskCategory::Architecture,
        TaskCategory::Roadmap,
        TaskCategory::Coding,
        TaskCategory::Debugging,
        TaskCategory::Reasoning,
        TaskCategory::Logic,
        TaskCategory::CodeReview,
        TaskCategory::Documentation,
        TaskCategory::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Architecture => "architecture",
            TaskCategory::Roadmap => "roadmap",
            TaskCategory::Coding => "coding",
            TaskCategory::Debugging => "debugging",
            TaskCategory::Reasoning => "reasoning",
            TaskCategory::Logic => "logic",
            TaskCategory::CodeReview => "code_review",
            TaskCategory::Documentation => "documentation",
            TaskCategory::General => "general",
        }
    }

    /// Human-readable title, e.g. `code_review` becomes `Code Review`.
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One planned, routed unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubRequest {
    /// 1-based position in the plan
    pub id: usize,

    pub description: String,

    pub category: TaskCategory,

    /// Provider chosen by the router at planning time
    pub provider: Provider,

    pub prompt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Positions this step nominally depends on. Display metadata only:
    /// execution never blocks on them and never feeds their output forward.
    #[serde(default)]
    pub dependencies: Vec<usize>,
}

/// The ordered sequence of sub-requests for one run. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SubRequest>", into = "Vec<SubRequest>")]
pub struct ExecutionPlan {
    steps: Vec<SubRequest>,
}

impl ExecutionPlan {
    /// Validate and wrap planned steps.
    ///
    /// Positions must run 1..=n in order and dependencies may only point
    /// at earlier positions.
    pub fn new(steps: Vec<SubRequest>) -> Result<Self> {
        if steps.is_empty() {
            return Err(SwitchboardError::InvalidPlan(
                "a plan needs at least one step".into(),
            ));
        }

        for (index, step) in steps.iter().enumerate() {
            let expected = index + 1;
            if step.id != expected {
                return Err(SwitchboardError::InvalidPlan(format!(
                    "step at index {index} has position {}, expected {expected}",
                    step.id
                )));
            }
            if let Some(dep) = step.dependencies.iter().find(|&&d| d == 0 || d >= step.id) {
                return Err(SwitchboardError::InvalidPlan(format!(
                    "step {} depends on {dep}, which does not precede it",
                    step.id
                )));
            }
        }

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[SubRequest] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a constructed plan; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubRequest> {
        self.steps.iter()
    }

    pub fn routing_plan(&self) -> Vec<RoutingPlanItem> {
        self.steps.iter().map(RoutingPlanItem::from).collect()
    }
}

impl TryFrom<Vec<SubRequest>> for ExecutionPlan {
    type Error = SwitchboardError;

    fn try_from(steps: Vec<SubRequest>) -> Result<Self> {
        Self::new(steps)
    }
}

impl From<ExecutionPlan> for Vec<SubRequest> {
    fn from(plan: ExecutionPlan) -> Self {
        plan.steps
    }
}

impl<'a> IntoIterator for &'a ExecutionPlan {
    type Item = &'a SubRequest;
    type IntoIter = std::slice::Iter<'a, SubRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Display row for the routing plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingPlanItem {
    pub id: usize,
    pub category: TaskCategory,
    pub provider: Provider,
    pub description: String,
}

impl From<&SubRequest> for RoutingPlanItem {
    fn from(step: &SubRequest) -> Self {
        Self {
            id: step.id,
            category: step.category,
            provider: step.provider,
            description: step.description.clone(),
        }
    }
}

/// Outcome of executing one sub-request.
///
/// Serialized with the executing provider's display name alongside its
/// id, so exported results read without a provider lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SubResultRecord", into = "SubResultRecord")]
pub struct SubResult {
    pub request: SubRequest,

    /// Provider whose client actually ran the step. Differs from
    /// `request.provider` after a fallback; `None` when no client existed.
    pub executed_by: Option<Provider>,

    pub content: String,

    pub success: bool,

    pub error: Option<String>,

    pub tokens_used: Option<u32>,

    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl SubResult {
    /// Identifier of the executing provider, `none` when nothing ran.
    pub fn provider_id(&self) -> &'static str {
        self.executed_by.map(|p| p.as_str()).unwrap_or("none")
    }

    pub fn provider_display_name(&self) -> &'static str {
        self.executed_by.map(|p| p.display_name()).unwrap_or("none")
    }
}

#[derive(Serialize, Deserialize)]
struct SubResultRecord {
    request: SubRequest,
    executed_by: Option<Provider>,
    /// Derived from `executed_by`; ignored when reading.
    #[serde(default, skip_deserializing)]
    provider_name: String,
    content: String,
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tokens_used: Option<u32>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl From<SubResult> for SubResultRecord {
    fn from(result: SubResult) -> Self {
        Self {
            provider_name: result.provider_display_name().to_string(),
            request: result.request,
            executed_by: result.executed_by,
            content: result.content,
            success: result.success,
            error: result.error,
            tokens_used: result.tokens_used,
            metadata: result.metadata,
        }
    }
}

impl From<SubResultRecord> for SubResult {
    fn from(record: SubResultRecord) -> Self {
        Self {
            request: record.request,
            executed_by: record.executed_by,
            content: record.content,
            success: record.success,
            error: record.error,
            tokens_used: record.tokens_used,
            metadata: record.metadata,
        }
    }
}

/// Top-level output of one orchestrated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub task: String,
    pub routing_plan: Vec<RoutingPlanItem>,
    pub results: Vec<SubResult>,
    pub consolidated: String,
    pub success: bool,
    pub errors: Vec<String>,
}

impl RunResult {
    /// A run that failed before any plan was built.
    pub fn planless_failure(task: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            routing_plan: Vec::new(),
            results: Vec::new(),
            consolidated: String::new(),
            success: false,
            errors: vec![error.into()],
        }
    }

    /// A run is successful when nothing failed, or when at least one step
    /// produced output despite other failures.
    pub fn aggregate_success(results: &[SubResult], errors: &[String]) -> bool {
        errors.is_empty() || results.iter().any(|r| r.success)
    }

    pub fn tokens_used(&self) -> u32 {
        self.results.iter().filter_map(|r| r.tokens_used).sum()
    }
}
