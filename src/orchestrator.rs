//! Top-level suggestion pipeline: validate, prompt, dispatch, parse, report.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::channel::{OutboundMessage, ResponseSink};
use crate::error::SuggestError;
use crate::logging::redact_key;
use crate::model::{GenerationConfig, GenerationRequest, RoutingHandle, SuggestionResult, TweetInput};
use crate::parser::parse_suggestions;
use crate::prompt::build_prompt;
use crate::providers::ProviderRegistry;
use crate::stats::{self, Store};

/// Stateless between requests: everything a request needs travels with it.
pub struct SuggestionOrchestrator {
    providers: ProviderRegistry,
    store: Arc<dyn Store>,
    sink: Option<Arc<dyn ResponseSink>>,
}

impl SuggestionOrchestrator {
    pub fn new(providers: ProviderRegistry, store: Arc<dyn Store>) -> Self {
        Self {
            providers,
            store,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ResponseSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Runs the pipeline and reports why it failed, if it did.
    ///
    /// Precondition failures (no key, unsupported provider) return before any
    /// network call.
    pub async fn try_generate(
        &self,
        tweet: &TweetInput,
        config: &GenerationConfig,
    ) -> Result<SuggestionResult, SuggestError> {
        if config.api_key.trim().is_empty() {
            return Err(SuggestError::MissingApiKey);
        }
        let client = self
            .providers
            .get(config.provider)
            .ok_or(SuggestError::UnsupportedProvider(config.provider))?;

        info!(provider = %config.provider, key = %redact_key(&config.api_key), "generating suggestions");
        debug!(tweet = %preview(&tweet.text, 50), "tweet text");

        let prompt = build_prompt(tweet, config);
        let raw = client.generate(&config.api_key, &prompt).await?;
        let suggestions = parse_suggestions(&raw);
        if suggestions.is_empty() {
            return Err(SuggestError::ParseRecoveryExhausted);
        }

        info!(count = suggestions.len(), "generated suggestions");
        Ok(SuggestionResult::new(suggestions))
    }

    /// Handles one channel request. Always resolves, always replies through
    /// the attached sink when there is someone to reply to, and never
    /// surfaces an error: any failure becomes an empty result.
    pub async fn handle(&self, request: GenerationRequest) -> SuggestionResult {
        let outcome = match &request.reply_to {
            None => Err(SuggestError::MissingRoutingHandle),
            Some(_) => self.try_generate(&request.tweet, &request.config).await,
        };

        let result = match outcome {
            Ok(result) => result,
            Err(err) if err.is_precondition() => {
                error!(error = %err, "rejecting suggestion request");
                SuggestionResult::empty()
            }
            Err(err) => {
                error!(provider = %request.config.provider, error = %err, "suggestion generation failed");
                SuggestionResult::empty()
            }
        };

        if let Some(reply_to) = &request.reply_to {
            self.deliver(reply_to, &result).await;
        }
        if !result.is_empty() {
            self.record_usage().await;
        }
        result
    }

    /// Counts one successful generation. Failures are logged and dropped.
    pub async fn record_usage(&self) {
        if let Err(err) = stats::record_reply(self.store.as_ref(), &stats::today()).await {
            warn!(error = %err, "failed to update usage stats");
        }
    }

    async fn deliver(&self, to: &RoutingHandle, result: &SuggestionResult) {
        let Some(sink) = &self.sink else {
            warn!(handle = %to, "no channel attached; dropping response");
            return;
        };
        let message = OutboundMessage::SuggestionsReady {
            suggestions: result.clone(),
        };
        if let Err(err) = sink.send(to, message).await {
            warn!(handle = %to, error = %err, "failed to deliver suggestions");
        }
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut shown: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        shown.push_str("...");
    }
    shown
}
