use std::sync::Arc;

use clap::Args;
use tracing::info;

use crate::channel::{self, JsonLinesSink};
use crate::config;
use crate::orchestrator::SuggestionOrchestrator;
use crate::providers::ProviderRegistry;
use crate::stats::FileStore;

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {}

/// Runs the JSON-lines channel on stdin/stdout until stdin closes.
pub async fn run(_args: ServeArgs) -> Result<(), String> {
    let (file, path) = config::load_config().map_err(|err| err.to_string())?;
    if let Some(path) = &path {
        info!(config = %path.display(), "loaded config");
    }

    let providers = ProviderRegistry::standard(
        &reqwest::Client::new(),
        &config::providers_with_env(file.providers),
    );
    let store = FileStore::new(config::state_path().map_err(|err| err.to_string())?);
    let sink = Arc::new(JsonLinesSink::new(tokio::io::stdout()));
    let orchestrator = Arc::new(
        SuggestionOrchestrator::new(providers, Arc::new(store)).with_sink(sink.clone()),
    );

    channel::serve(tokio::io::stdin(), sink, orchestrator)
        .await
        .map(|_| ())
        .map_err(|err| err.to_string())
}
