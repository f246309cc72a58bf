//! Provider resolution for a task category.

use switchboard_common::{Provider, Result, SwitchboardError, TaskCategory};
use tracing::debug;

use crate::profiles::profile;

/// Maps categories to providers over a fixed available set.
#[derive(Debug, Clone)]
pub struct Router {
    available: Vec<Provider>,
}

impl Router {
    /// `available` must be in construction order; fallback picks its head.
    pub fn new(available: Vec<Provider>) -> Self {
        Self { available }
    }

    pub fn available(&self) -> &[Provider] {
        &self.available
    }

    /// The category's preferred provider when available, else the first
    /// available one.
    pub fn resolve(&self, category: TaskCategory) -> Result<Provider> {
        let preferred = profile(category).preferred_provider;
        if self.available.contains(&preferred) {
            return Ok(preferred);
        }

        let fallback = self
            .available
            .first()
            .copied()
            .ok_or(SwitchboardError::NoProviderAvailable)?;

        debug!(
            category = ?category,
            preferred = %preferred,
            provider = %fallback,
            "Preferred provider unavailable, falling back"
        );
        Ok(fallback)
    }
}
