//! Error types for the suggestion pipeline.
//!
//! None of these cross the channel boundary: the orchestrator folds every one
//! of them into an empty suggestion list. They exist for logging and for the
//! CLI's diagnostic output.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::Provider;

/// Failure of one provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Non-2xx response.
    #[error("{provider} API error: {status} - {body}")]
    Http {
        provider: Provider,
        status: u16,
        body: String,
    },

    /// Network-level failure before a response was received.
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    /// 2xx response whose body was not the expected JSON.
    #[error("{provider} returned a malformed response body: {source}")]
    Decode {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    #[error("All {provider} models failed")]
    AllModelsFailed { provider: Provider },
}

/// Why a generation request produced no suggestions.
#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("No API key configured")]
    MissingApiKey,

    #[error("Request has no routing handle to reply to")]
    MissingRoutingHandle,

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(Provider),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Could not recover any suggestions from the model output")]
    ParseRecoveryExhausted,
}

impl SuggestError {
    /// True for failures detected before any network I/O.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingApiKey | Self::MissingRoutingHandle | Self::UnsupportedProvider(_)
        )
    }
}

/// Failure of the usage-stats store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access store file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Store file '{path}' is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stored value under '{key}' has an unexpected shape: {source}")]
    Shape {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to deliver a response over the channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Routing handle '{0}' is no longer connected")]
    UnknownHandle(String),

    #[error("Failed to encode channel message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to write channel message: {0}")]
    Io(#[from] io::Error),
}

/// Failure to load or validate the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot resolve config path: set PLUME_CONFIG or HOME/XDG_CONFIG_HOME.")]
    NoConfigPath,

    #[error("Cannot resolve data directory: set PLUME_DATA_DIR or HOME/XDG_DATA_HOME.")]
    NoDataDir,

    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Profile '{name}' not found in config file '{path}'.")]
    MissingProfile { name: String, path: PathBuf },

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
