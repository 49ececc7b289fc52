use async_trait::async_trait;

use crate::error::ProviderError;
use crate::fallback::FallbackPolicy;
use crate::model::Provider;
use crate::providers::openai::chat_completion;
use crate::providers::{CompletionClient, ProviderOptions};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Tried in this order; Groq renames and retires models often.
pub const DEFAULT_MODELS: [&str; 4] = [
    "llama-3.3-70b-versatile",
    "llama-3.1-70b-versatile",
    "llama3-70b-8192",
    "mixtral-8x7b-32768",
];

/// OpenAI-compatible Groq endpoint wrapped in a [`FallbackPolicy`].
#[derive(Debug, Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    base_url: String,
    policy: FallbackPolicy,
}

impl GroqClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: GROQ_BASE_URL.to_string(),
            policy: FallbackPolicy::new(Provider::Groq, DEFAULT_MODELS),
        }
    }

    pub fn from_options(http: reqwest::Client, options: &ProviderOptions) -> Self {
        let mut client = Self::new(http);
        if let Some(base_url) = &options.base_url {
            client = client.with_base_url(base_url);
        }
        if let Some(models) = &options.models {
            client = client.with_models(models.iter().cloned());
        } else if let Some(model) = &options.model {
            client = client.with_models([model.clone()]);
        }
        client
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy = FallbackPolicy::new(Provider::Groq, models);
        self
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    fn provider(&self) -> Provider {
        Provider::Groq
    }

    fn models(&self) -> Vec<String> {
        self.policy.models().to_vec()
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, ProviderError> {
        let http = &self.http;
        let base_url = self.base_url.as_str();
        self.policy
            .run(move |model| async move {
                chat_completion(http, Provider::Groq, base_url, api_key, &model, prompt).await
            })
            .await
    }
}
