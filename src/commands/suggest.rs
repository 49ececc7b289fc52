use std::io::{self, IsTerminal, Read};
use std::sync::Arc;

use clap::Args;
use owo_colors::OwoColorize;
use serde_json::json;
use tracing::warn;

use crate::config::{self, Overrides};
use crate::error::SuggestError;
use crate::model::{Length, Provider, TweetInput};
use crate::orchestrator::SuggestionOrchestrator;
use crate::prompt::build_prompt;
use crate::providers::ProviderRegistry;
use crate::stats::FileStore;

#[derive(Debug, Args, Clone)]
pub struct SuggestArgs {
    /// Tweet text to reply to. Read from stdin when omitted.
    pub text: Option<String>,
    /// Display name of the tweet's author.
    #[arg(long, default_value = "")]
    pub author: String,
    /// Handle of the tweet's author, without '@'.
    #[arg(long, default_value = "")]
    pub handle: String,
    /// Profile from the config file to take preferences from.
    #[arg(long)]
    pub profile: Option<String>,
    #[arg(long, value_parser = parse_provider)]
    pub provider: Option<Provider>,
    #[arg(long = "api-key")]
    pub api_key: Option<String>,
    /// professional, casual, witty, thoughtful, provocative, or any free text.
    #[arg(long)]
    pub style: Option<String>,
    /// 0 = friendly, 100 = authoritative.
    #[arg(long, value_parser = clap::value_parser!(i32).range(0..=100))]
    pub tone: Option<i32>,
    #[arg(long, value_parser = parse_length)]
    pub length: Option<Length>,
    /// Area of expertise to draw on. Repeatable.
    #[arg(long = "expertise")]
    pub expertise: Vec<String>,
    #[arg(long)]
    pub emojis: bool,
    #[arg(long)]
    pub hashtags: bool,
    /// Print suggestions as a JSON array.
    #[arg(long)]
    pub json: bool,
    /// Print the prompt and target models without calling the provider.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

fn parse_provider(value: &str) -> Result<Provider, String> {
    value.parse()
}

fn parse_length(value: &str) -> Result<Length, String> {
    value.parse()
}

fn read_tweet_text(text: Option<String>) -> Result<String, String> {
    let text = match text {
        Some(text) => text,
        None if io::stdin().is_terminal() => String::new(),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|err| format!("Failed to read tweet text from stdin: {err}"))?;
            buffer
        }
    };
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err("No tweet text provided. Pass it as an argument or on stdin.".to_string());
    }
    Ok(text)
}

pub async fn run(args: SuggestArgs) -> Result<(), String> {
    let tweet = TweetInput {
        text: read_tweet_text(args.text)?,
        author: args.author,
        handle: args.handle,
    };

    let (file, path) = config::load_config().map_err(|err| err.to_string())?;
    let profile = match (&args.profile, &path) {
        (Some(name), Some(path)) => Some(config::profile(&file, name, path).map_err(|err| err.to_string())?),
        (Some(name), None) => {
            return Err(format!("Profile '{name}' requested but no config file was found."));
        }
        (None, _) => None,
    };

    let overrides = Overrides {
        provider: args.provider,
        api_key: args.api_key,
        expertise: args.expertise,
        style: args.style,
        tone: args.tone,
        length: args.length,
        include_emojis: args.emojis,
        add_hashtags: args.hashtags,
    };
    let generation = config::resolve_generation_config(profile, &overrides).map_err(|err| err.to_string())?;
    let providers = ProviderRegistry::standard(
        &reqwest::Client::new(),
        &config::providers_with_env(file.providers),
    );

    if args.dry_run {
        let models = providers
            .get(generation.provider)
            .map(|client| client.models())
            .unwrap_or_default();
        let body = json!({
            "dry_run": true,
            "provider": generation.provider,
            "models": models,
            "prompt": build_prompt(&tweet, &generation),
        });
        println!("{}", serde_json::to_string_pretty(&body).map_err(|err| err.to_string())?);
        return Ok(());
    }

    if !generation.api_key.is_empty() {
        if let Err(reason) = config::validate_api_key(generation.provider, &generation.api_key) {
            warn!("{reason}");
        }
    }

    let state_path = config::state_path().map_err(|err| err.to_string())?;
    let orchestrator = SuggestionOrchestrator::new(providers, Arc::new(FileStore::new(state_path)));
    let suggestions = orchestrator
        .try_generate(&tweet, &generation)
        .await
        .map_err(|err| describe_failure(&err, generation.provider))?;

    if args.json {
        println!("{}", serde_json::to_string(&suggestions).map_err(|err| err.to_string())?);
    } else {
        let colored = io::stdout().is_terminal();
        for (index, suggestion) in suggestions.as_slice().iter().enumerate() {
            let label = format!("{}.", index + 1);
            if colored {
                println!("{} {suggestion}", label.bold());
            } else {
                println!("{label} {suggestion}");
            }
        }
    }

    orchestrator.record_usage().await;
    Ok(())
}

fn describe_failure(err: &SuggestError, provider: Provider) -> String {
    match err {
        SuggestError::MissingApiKey => {
            let env_hint = config::api_key_env(provider)
                .map(|name| format!(", {name}"))
                .unwrap_or_default();
            format!(
                "No API key configured. Use --api-key, set PLUME_API_KEY{env_hint}, or add api_key to a profile."
            )
        }
        other => format!("Could not generate suggestions: {other}"),
    }
}
