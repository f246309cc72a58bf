//! Plans a task, dispatches each step to a provider, and merges the results.

use std::sync::Arc;

use switchboard_common::{
    ExecutionPlan, Provider, Result, RunResult, SubRequest, SubResult, SwitchboardError,
};
use switchboard_llm::{ClientFactory, ClientSettings, ProviderClient};
use tracing::{debug, info, warn};

use crate::config::CredentialSource;
use crate::consolidator;
use crate::decomposer::Decomposer;
use crate::routing::Router;

/// Receives human-readable progress lines. Best effort only.
pub type ProgressSink<'a> = &'a (dyn Fn(&str) + Send + Sync);

const DESCRIPTION_PREVIEW_CHARS: usize = 40;

/// Stateless across runs: the client set is rebuilt from the credential
/// source at the start of every run.
pub struct Orchestrator {
    credentials: Arc<dyn CredentialSource>,
    factory: Arc<dyn ClientFactory>,
    settings: ClientSettings,
}

impl Orchestrator {
    pub fn new(
        credentials: Arc<dyn CredentialSource>,
        factory: Arc<dyn ClientFactory>,
        settings: ClientSettings,
    ) -> Self {
        Self {
            credentials,
            factory,
            settings,
        }
    }

    /// One client per provider with a usable credential, in construction order.
    fn build_clients(&self) -> Vec<ProviderClient> {
        Provider::ALL
            .into_iter()
            .filter_map(|provider| {
                let credential = self.credentials.credential(provider)?;
                let model = self.credentials.model(provider);

                match ProviderClient::connect(
                    provider,
                    &credential,
                    &model,
                    &self.settings,
                    self.factory.as_ref(),
                ) {
                    Ok(client) => Some(client),
                    Err(e) => {
                        warn!(provider = %provider, error = %e, "Could not initialize client");
                        None
                    }
                }
            })
            .collect()
    }

    /// Providers a run started now would use.
    pub fn available_providers(&self) -> Vec<Provider> {
        self.build_clients().iter().map(|c| c.provider()).collect()
    }

    /// Plan without executing anything.
    pub fn plan(&self, task: &str) -> Result<ExecutionPlan> {
        let available = self.available_providers();
        if available.is_empty() {
            return Err(SwitchboardError::NoProviderAvailable);
        }
        Decomposer::new(Router::new(available)).plan(task)
    }

    pub async fn run(&self, task: &str, on_progress: Option<ProgressSink<'_>>) -> RunResult {
        // the sink is the user-facing channel; logs only echo it at debug
        let progress = |message: &str| {
            debug!(progress = %message, "Run progress");
            if let Some(sink) = on_progress {
                sink(message);
            }
        };

        let clients = self.build_clients();
        if clients.is_empty() {
            warn!("No providers configured, run aborted");
            return RunResult::planless_failure(
                task,
                SwitchboardError::NoProviderAvailable.to_string(),
            );
        }

        progress("Analyzing task...");

        let router = Router::new(clients.iter().map(|c| c.provider()).collect());
        let plan = match Decomposer::new(router).plan(task) {
            Ok(plan) => plan,
            Err(e) => return RunResult::planless_failure(task, e.to_string()),
        };

        info!(steps = plan.len(), "Execution plan ready");

        let mut results = Vec::with_capacity(plan.len());
        let mut errors = Vec::new();

        for step in &plan {
            let preview: String = step.description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
            progress(&format!(
                "Processing with {}: {preview}...",
                step.provider.display_name()
            ));

            let result = execute_step(step, &clients).await;
            if !result.success {
                let message = result.error.clone().unwrap_or_default();
                errors.push(SwitchboardError::provider(step.provider, message).to_string());
            }
            results.push(result);
        }

        progress("Consolidating results...");

        let consolidated = consolidator::merge(&results);
        let success = RunResult::aggregate_success(&results, &errors);

        info!(
            steps = results.len(),
            failed = errors.len(),
            success,
            "Run finished"
        );

        RunResult {
            task: task.to_string(),
            routing_plan: plan.routing_plan(),
            results,
            consolidated,
            success,
            errors,
        }
    }
}

/// Runs one step on its routed client, or the first client when the
/// routed provider has none.
async fn execute_step(step: &SubRequest, clients: &[ProviderClient]) -> SubResult {
    let client = clients
        .iter()
        .find(|c| c.provider() == step.provider)
        .or_else(|| {
            let fallback = clients.first();
            if let Some(c) = fallback {
                warn!(
                    step = step.id,
                    routed = %step.provider,
                    provider = %c.provider(),
                    "No client for routed provider, using fallback"
                );
            }
            fallback
        });

    let Some(client) = client else {
        return SubResult {
            request: step.clone(),
            executed_by: None,
            content: String::new(),
            success: false,
            error: Some(SwitchboardError::NoClientForRoute(step.provider).to_string()),
            tokens_used: None,
            metadata: Default::default(),
        };
    };

    debug!(
        step = step.id,
        category = ?step.category,
        provider = %client.provider(),
        "Dispatching step"
    );

    let completion = client
        .complete(&step.prompt, step.system_prompt.as_deref())
        .await;

    SubResult {
        request: step.clone(),
        executed_by: Some(completion.provider),
        content: completion.content,
        success: completion.success,
        error: completion.error,
        tokens_used: completion.tokens_used,
        metadata: completion.metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_common::TaskCategory;

    #[tokio::test]
    async fn step_without_any_client_fails_in_place() {
        let step = SubRequest {
            id: 1,
            description: "fix this bug".into(),
            category: TaskCategory::Debugging,
            provider: Provider::Anthropic,
            prompt: "fix this bug".into(),
            system_prompt: None,
            dependencies: Vec::new(),
        };

        let result = execute_step(&step, &[]).await;
        assert!(!result.success);
        assert!(result.executed_by.is_none());
        assert_eq!(result.provider_id(), "none");
        assert_eq!(
            result.error.as_deref(),
            Some("No client available for anthropic")
        );
    }
}
