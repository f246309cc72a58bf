//! Turns task text into an execution plan.

use switchboard_common::{ExecutionPlan, Result, SubRequest, TaskCategory};

use crate::classifier::detect_all;
use crate::profiles::profile;
use crate::routing::Router;

/// Multi-step plans run high-level planning before implementation.
const PRIORITY: [TaskCategory; 8] = [
    TaskCategory::Architecture,
    TaskCategory::Roadmap,
    TaskCategory::Reasoning,
    TaskCategory::Logic,
    TaskCategory::Coding,
    TaskCategory::Debugging,
    TaskCategory::CodeReview,
    TaskCategory::Documentation,
];

fn priority(category: TaskCategory) -> usize {
    PRIORITY
        .iter()
        .position(|c| *c == category)
        .unwrap_or(PRIORITY.len())
}

/// Plans a task against the providers known to `router`.
#[derive(Debug, Clone)]
pub struct Decomposer {
    router: Router,
}

impl Decomposer {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    pub fn plan(&self, task: &str) -> Result<ExecutionPlan> {
        let mut categories = detect_all(task);

        if let [category] = *categories.as_slice() {
            let step = SubRequest {
                id: 1,
                description: task.to_string(),
                category,
                provider: self.router.resolve(category)?,
                prompt: task.to_string(),
                system_prompt: Some(profile(category).system_prompt.to_string()),
                dependencies: Vec::new(),
            };
            return ExecutionPlan::new(vec![step]);
        }

        // stable: equal priorities keep detection order
        categories.sort_by_key(|c| priority(*c));

        let steps = categories
            .into_iter()
            .enumerate()
            .map(|(index, category)| {
                let profile = profile(category);
                Ok(SubRequest {
                    id: index + 1,
                    description: format!("{} phase", category.title()),
                    category,
                    provider: self.router.resolve(category)?,
                    prompt: format!("{}{task}", profile.prompt_prefix),
                    system_prompt: Some(profile.system_prompt.to_string()),
                    dependencies: if index == 0 { Vec::new() } else { vec![index] },
                })
            })
            .collect::<Result<Vec<_>>>()?;

        ExecutionPlan::new(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_common::{Provider, SwitchboardError};

    fn all_providers() -> Decomposer {
        Decomposer::new(Router::new(Provider::ALL.to_vec()))
    }

    #[test]
    fn single_category_keeps_task_text() {
        let plan = all_providers().plan("fix this bug").unwrap();
        assert_eq!(plan.len(), 1);

        let step = &plan.steps()[0];
        assert_eq!(step.id, 1);
        assert_eq!(step.category, TaskCategory::Debugging);
        assert_eq!(step.provider, Provider::Anthropic);
        assert_eq!(step.prompt, "fix this bug");
        assert_eq!(step.description, "fix this bug");
        assert!(step.dependencies.is_empty());
        assert!(step
            .system_prompt
            .as_deref()
            .is_some_and(|s| s.starts_with("You are a debugging expert")));
    }

    #[test]
    fn unmatched_task_becomes_general_step() {
        let plan = all_providers().plan("hello there").unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.steps()[0].category, TaskCategory::General);
        assert_eq!(plan.steps()[0].prompt, "hello there");
    }

    #[test]
    fn multiple_categories_follow_priority_order() {
        // detected as coding, reasoning, documentation
        let task = "Explain and document the code";
        let plan = all_providers().plan(task).unwrap();

        let categories: Vec<_> = plan.iter().map(|s| s.category).collect();
        assert_eq!(
            categories,
            vec![
                TaskCategory::Reasoning,
                TaskCategory::Coding,
                TaskCategory::Documentation
            ]
        );

        for (index, step) in plan.iter().enumerate() {
            assert_eq!(step.id, index + 1);
            let prefix = profile(step.category).prompt_prefix;
            assert_eq!(step.prompt, format!("{prefix}{task}"));
        }
        assert_eq!(plan.steps()[0].description, "Reasoning phase");
        assert!(plan.steps()[0].dependencies.is_empty());
        assert_eq!(plan.steps()[1].dependencies, vec![1]);
        assert_eq!(plan.steps()[2].dependencies, vec![2]);
    }

    #[test]
    fn multi_word_category_description() {
        let plan = all_providers().plan("implement it, then review").unwrap();
        assert_eq!(plan.steps()[1].description, "Code Review phase");
        assert_eq!(plan.steps()[1].provider, Provider::Moonshot);
    }

    #[test]
    fn planning_without_providers_fails() {
        let decomposer = Decomposer::new(Router::new(Vec::new()));
        assert!(matches!(
            decomposer.plan("fix this bug"),
            Err(SwitchboardError::NoProviderAvailable)
        ));
    }
}
