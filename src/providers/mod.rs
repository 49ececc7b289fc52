//! Text-generation provider adapters.
//!
//! Each adapter maps the shared prompt onto one provider's wire schema and
//! pulls the first completion text back out. Parsing that text into
//! suggestions is not their concern.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::model::Provider;

/// Anthropic messages API adapter.
pub mod anthropic;
/// Groq adapter with model fallback.
pub mod groq;
/// OpenAI chat-completions adapter.
pub mod openai;
pub(crate) mod transport;

pub use anthropic::AnthropicClient;
pub use groq::GroqClient;
pub use openai::OpenAiClient;

/// Sampling temperature used for every provider.
pub const TEMPERATURE: f32 = 0.8;
/// Output-length cap used for every provider.
pub const MAX_TOKENS: u32 = 600;
/// Completion text substituted when a 2xx response carries no content.
pub const EMPTY_COMPLETION: &str = "[]";

pub const SYSTEM_INSTRUCTION: &str = "You are a Twitter engagement expert. Always respond with ONLY a valid JSON array of 3 reply strings. No other text.";

/// One provider family's request/response adapter.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Model identifier(s) this client will use, for logs and dry runs.
    fn models(&self) -> Vec<String>;

    /// Sends `prompt` and returns the raw completion text.
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Per-provider overrides read from the `[providers.*]` config tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderOptions {
    /// API root, e.g. `https://api.openai.com/v1`.
    pub base_url: Option<String>,
    /// Single model, for providers without fallback.
    pub model: Option<String>,
    /// Ordered fallback list, for providers that support it.
    pub models: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai: ProviderOptions,
    pub anthropic: ProviderOptions,
    pub groq: ProviderOptions,
}

/// Lookup table from provider family to its client.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    clients: HashMap<Provider, Arc<dyn CompletionClient>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the three built-in adapters sharing one HTTP client.
    pub fn standard(http: &reqwest::Client, config: &ProvidersConfig) -> Self {
        Self::new()
            .with_client(Arc::new(OpenAiClient::from_options(http.clone(), &config.openai)))
            .with_client(Arc::new(AnthropicClient::from_options(http.clone(), &config.anthropic)))
            .with_client(Arc::new(GroqClient::from_options(http.clone(), &config.groq)))
    }

    pub fn with_client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.clients.insert(client.provider(), client);
        self
    }

    pub fn get(&self, provider: Provider) -> Option<Arc<dyn CompletionClient>> {
        self.clients.get(&provider).cloned()
    }
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
