use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderError;
use crate::model::Provider;
use crate::providers::transport::{completion_or_placeholder, decode_json, send_json};
use crate::providers::{
    ChatMessage, CompletionClient, MAX_TOKENS, ProviderOptions, SYSTEM_INSTRUCTION, TEMPERATURE,
    endpoint,
};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// One chat-completions call against any OpenAI-compatible endpoint.
pub(crate) async fn chat_completion(
    http: &reqwest::Client,
    provider: Provider,
    base_url: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
) -> Result<String, ProviderError> {
    let payload = ChatCompletionRequest {
        model,
        messages: vec![ChatMessage::system(SYSTEM_INSTRUCTION), ChatMessage::user(prompt)],
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    };

    let request = http
        .post(endpoint(base_url, "chat/completions"))
        .bearer_auth(api_key);
    let response = send_json(provider, request, &payload).await?;
    let body: ChatCompletionResponse = decode_json(provider, response).await?;

    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content);
    debug!(%provider, model, has_content = content.is_some(), "chat completion received");
    Ok(completion_or_placeholder(content))
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: OPENAI_BASE_URL.to_string(),
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
impl CompletionClient for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::Openai
    }

    fn models(&self) -> Vec<String> {
        vec![self.model.clone()]
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, ProviderError> {
        chat_completion(
            &self.http,
            Provider::Openai,
            &self.base_url,
            api_key,
            &self.model,
            prompt,
        )
        .await
    }
}
