//! Reply suggestions for social media posts.
//!
//! A tweet plus the user's preferences become one prompt, the prompt goes to
//! one of several text-generation providers, and whatever comes back is
//! squeezed into at most three reply texts. Every failure along the way ends
//! in the same place: an empty list.

/// Cross-context request/response protocol.
pub mod channel;
/// CLI subcommands.
pub mod commands;
/// Config file, profiles and environment resolution.
pub mod config;
/// Error taxonomy.
pub mod error;
/// Ordered model fallback.
pub mod fallback;
/// Tracing setup and key redaction.
pub mod logging;
/// Request and result types.
pub mod model;
/// Top-level pipeline coordinator.
pub mod orchestrator;
/// Model output recovery.
pub mod parser;
/// Prompt construction.
pub mod prompt;
/// Provider adapters.
pub mod providers;
/// Usage counters and their store.
pub mod stats;

pub use model::{GenerationConfig, GenerationRequest, Provider, SuggestionResult, TweetInput};
pub use orchestrator::SuggestionOrchestrator;
