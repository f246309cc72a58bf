//! Task routing across multiple AI providers.
//!
//! A task is classified by keyword into one or more categories, each
//! category is routed to a provider, and the per-step answers are merged.
//!
//! ```text
//! task text
//!     │
//!     ▼
//! classifier ──► decomposer ──► router
//!                    │
//!                    ▼ ExecutionPlan
//!              orchestrator ──► ProviderClient (per step, sequential)
//!                    │
//!                    ▼
//!              consolidator ──► RunResult
//! ```

pub mod classifier;
pub mod code_actions;
pub mod config;
pub mod consolidator;
pub mod decomposer;
pub mod export;
pub mod history;
pub mod orchestrator;
pub mod profiles;
pub mod routing;
pub mod status;

pub use code_actions::{custom_prompt, CodeAction};
pub use config::{
    CredentialSource, HistoryConfig, ProviderConfig, RequestConfig, StaticCredentials,
    SwitchboardConfig,
};
pub use decomposer::Decomposer;
pub use history::{HistoryEntry, HistoryStore};
pub use orchestrator::{Orchestrator, ProgressSink};
pub use profiles::CategoryProfile;
pub use routing::Router;
pub use status::{status, ProviderStatus, StatusReport};
