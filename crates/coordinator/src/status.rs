use serde::{Deserialize, Serialize};
use switchboard_common::Provider;

use crate::config::CredentialSource;
use crate::history::HistoryStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub provider: Provider,
    pub name: String,
    pub active: bool,
    pub specialty: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub providers: Vec<ProviderStatus>,
    pub total_providers: usize,
    pub available_providers: usize,
    pub tasks_completed: u64,
}

/// Snapshot of which providers are configured, in construction order.
pub fn status(credentials: &dyn CredentialSource, history: &HistoryStore) -> StatusReport {
    let providers: Vec<ProviderStatus> = Provider::ALL
        .into_iter()
        .map(|provider| ProviderStatus {
            provider,
            name: provider.display_name().to_string(),
            active: credentials.credential(provider).is_some(),
            specialty: provider.specialty().to_string(),
            model: credentials.model(provider),
        })
        .collect();

    StatusReport {
        total_providers: providers.len(),
        available_providers: providers.iter().filter(|p| p.active).count(),
        providers,
        tasks_completed: history.tasks_completed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticCredentials;
    use switchboard_common::RunResult;

    #[test]
    fn reports_active_providers_and_counter() {
        let creds = StaticCredentials::new()
            .with_key(Provider::Anthropic, "sk-ant")
            .with_key(Provider::Moonshot, "ms");
        let mut history = HistoryStore::new(5);
        history
            .record("t", &RunResult::planless_failure("t", "nope"))
            .unwrap();

        let report = status(&creds, &history);
        assert_eq!(report.total_providers, 4);
        assert_eq!(report.available_providers, 2);
        assert_eq!(report.tasks_completed, 1);

        let names: Vec<_> = report.providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["OpenAI", "Anthropic", "Gemini", "Moonshot"]);
        assert!(!report.providers[0].active);
        assert!(report.providers[1].active);
        assert_eq!(report.providers[3].specialty, "Code Review");
    }
}
