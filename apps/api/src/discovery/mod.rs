pub mod budget;
pub mod dedup;
pub mod export;
pub mod handlers;
pub mod harvest;
pub mod orchestrator;
pub mod queries;
pub mod snippets;

pub use orchestrator::{DiscoveryConfig, DiscoveryOrchestrator, DiscoveryOutcome};
pub use snippets::{SnippetExtractor, SnippetOutcome};
