//! Ordered model fallback for provider families whose model names churn.

use std::future::Future;

use tracing::{info, warn};

use crate::error::ProviderError;
use crate::model::Provider;

/// A priority list of model identifiers plus a single rule: on any failure,
/// try the next one. Attempts are strictly sequential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    provider: Provider,
    models: Vec<String>,
}

impl FallbackPolicy {
    pub fn new<I, S>(provider: Provider, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            provider,
            models: models.into_iter().map(Into::into).collect(),
        }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Calls `attempt` with each model in order until one succeeds.
    ///
    /// Returns the first success, or the last error once the list is
    /// exhausted. An empty list fails with [`ProviderError::AllModelsFailed`].
    pub async fn run<T, F, Fut>(&self, mut attempt: F) -> Result<T, ProviderError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut last_error = None;

        for model in &self.models {
            info!(provider = %self.provider, %model, "trying model");
            match attempt(model.clone()).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(provider = %self.provider, %model, error = %err, "model failed");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or(ProviderError::AllModelsFailed {
            provider: self.provider,
        }))
    }
}
