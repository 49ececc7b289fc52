use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderError;
use crate::model::Provider;
use crate::providers::transport::{completion_or_placeholder, decode_json, send_json};
use crate::providers::{
    ChatMessage, CompletionClient, MAX_TOKENS, ProviderOptions, TEMPERATURE, endpoint,
};

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Appended to the prompt; this API has no system role in our request.
pub const JSON_REMINDER: &str =
    "\n\nRemember: Return ONLY a JSON array with 3 reply strings. Nothing else.";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: ANTHROPIC_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn from_options(http: reqwest::Client, options: &ProviderOptions) -> Self {
        let mut client = Self::new(http);
        if let Some(base_url) = &options.base_url {
            client = client.with_base_url(base_url);
        }
        if let Some(model) = &options.model {
            client = client.with_model(model);
        }
        client
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn models(&self) -> Vec<String> {
        vec![self.model.clone()]
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, ProviderError> {
        let provider = Provider::Anthropic;
        let payload = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![ChatMessage::user(format!("{prompt}{JSON_REMINDER}"))],
        };

        let request = self
            .http
            .post(endpoint(&self.base_url, "messages"))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);
        let response = send_json(provider, request, &payload).await?;
        let body: MessagesResponse = decode_json(provider, response).await?;

        let content = body.content.into_iter().next().and_then(|block| block.text);
        debug!(%provider, model = %self.model, has_content = content.is_some(), "message received");
        Ok(completion_or_placeholder(content))
    }
}
