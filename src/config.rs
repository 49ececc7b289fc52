use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::{GenerationConfig, Length, Provider, Style};
use crate::providers::ProvidersConfig;

/// Preference defaults stored under `[profiles.<name>]`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProfileConfig {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub expertise: Option<Vec<String>>,
    pub style: Option<String>,
    pub tone: Option<i32>,
    pub length: Option<String>,
    pub include_emojis: Option<bool>,
    pub add_hashtags: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFile {
    pub profiles: HashMap<String, ProfileConfig>,
    pub providers: ProvidersConfig,
}

/// Reads the config file, treating a missing file as empty.
pub fn load_config() -> Result<(ConfigFile, Option<PathBuf>), ConfigError> {
    let path = config_path()?;
    if !path.exists() {
        return Ok((ConfigFile::default(), None));
    }
    let config = read_config(&path)?;
    Ok((config, Some(path)))
}

pub fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn profile<'a>(
    config: &'a ConfigFile,
    name: &str,
    path: &Path,
) -> Result<&'a ProfileConfig, ConfigError> {
    config
        .profiles
        .get(name)
        .ok_or_else(|| ConfigError::MissingProfile {
            name: name.to_string(),
            path: path.to_path_buf(),
        })
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = non_empty_env("PLUME_CONFIG") {
        return Ok(PathBuf::from(path));
    }
    if let Some(xdg) = non_empty_env("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("plume").join("config.toml"));
    }
    let home = non_empty_env("HOME").ok_or(ConfigError::NoConfigPath)?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("plume")
        .join("config.toml"))
}

/// Location of the usage-stats file.
pub fn state_path() -> Result<PathBuf, ConfigError> {
    let dir = if let Some(dir) = non_empty_env("PLUME_DATA_DIR") {
        PathBuf::from(dir)
    } else if let Some(xdg) = non_empty_env("XDG_DATA_HOME") {
        PathBuf::from(xdg).join("plume")
    } else {
        let home = non_empty_env("HOME").ok_or(ConfigError::NoDataDir)?;
        PathBuf::from(home).join(".local").join("share").join("plume")
    };
    Ok(dir.join("state.json"))
}

pub fn api_key_env(provider: Provider) -> Option<&'static str> {
    match provider {
        Provider::Openai => Some("OPENAI_API_KEY"),
        Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
        Provider::Groq => Some("GROQ_API_KEY"),
        Provider::Unsupported => None,
    }
}

fn base_url_env(provider: Provider) -> Option<&'static str> {
    match provider {
        Provider::Openai => Some("PLUME_OPENAI_BASE_URL"),
        Provider::Anthropic => Some("PLUME_ANTHROPIC_BASE_URL"),
        Provider::Groq => Some("PLUME_GROQ_BASE_URL"),
        Provider::Unsupported => None,
    }
}

pub(crate) fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Applies `PLUME_*_BASE_URL` overrides on top of the file's provider tables.
pub fn providers_with_env(mut providers: ProvidersConfig) -> ProvidersConfig {
    for provider in Provider::SUPPORTED {
        let Some(url) = base_url_env(provider).and_then(non_empty_env) else {
            continue;
        };
        let options = match provider {
            Provider::Openai => &mut providers.openai,
            Provider::Anthropic => &mut providers.anthropic,
            Provider::Groq | Provider::Unsupported => &mut providers.groq,
        };
        options.base_url = Some(url);
    }
    providers
}

/// Command-line overrides; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub provider: Option<Provider>,
    pub api_key: Option<String>,
    pub expertise: Vec<String>,
    pub style: Option<String>,
    pub tone: Option<i32>,
    pub length: Option<Length>,
    pub include_emojis: bool,
    pub add_hashtags: bool,
}

/// Resolves a [`GenerationConfig`]: flag, then environment, then profile,
/// then the built-in default.
pub fn resolve_generation_config(
    profile: Option<&ProfileConfig>,
    overrides: &Overrides,
) -> Result<GenerationConfig, ConfigError> {
    let empty = ProfileConfig::default();
    let profile = profile.unwrap_or(&empty);
    let defaults = GenerationConfig::default();

    let provider = match (&overrides.provider, non_empty_env("PLUME_PROVIDER"), &profile.provider) {
        (Some(provider), _, _) => *provider,
        (None, Some(value), _) => parse_provider("PLUME_PROVIDER", &value)?,
        (None, None, Some(value)) => parse_provider("provider", value)?,
        (None, None, None) => defaults.provider,
    };

    let api_key = overrides
        .api_key
        .clone()
        .or_else(|| non_empty_env("PLUME_API_KEY"))
        .or_else(|| api_key_env(provider).and_then(non_empty_env))
        .or_else(|| profile.api_key.clone())
        .unwrap_or_default();

    let tone = overrides.tone.or(profile.tone).unwrap_or(defaults.tone);
    validate_tone(tone)?;

    let length = match (&overrides.length, &profile.length) {
        (Some(length), _) => *length,
        (None, Some(value)) => value
            .parse()
            .map_err(|reason| ConfigError::Invalid { field: "length", reason })?,
        (None, None) => defaults.length,
    };

    let expertise = if overrides.expertise.is_empty() {
        profile.expertise.clone().unwrap_or_default()
    } else {
        overrides.expertise.clone()
    };

    Ok(GenerationConfig {
        provider,
        api_key,
        expertise,
        style: overrides
            .style
            .as_deref()
            .or(profile.style.as_deref())
            .map(Style::from)
            .unwrap_or(defaults.style),
        tone,
        length,
        include_emojis: overrides.include_emojis || profile.include_emojis.unwrap_or(false),
        add_hashtags: overrides.add_hashtags || profile.add_hashtags.unwrap_or(false),
    })
}

fn parse_provider(field: &'static str, value: &str) -> Result<Provider, ConfigError> {
    value
        .parse()
        .map_err(|reason| ConfigError::Invalid { field, reason })
}

fn validate_tone(tone: i32) -> Result<(), ConfigError> {
    if (0..=100).contains(&tone) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field: "tone",
            reason: format!("{tone} is outside 0-100"),
        })
    }
}

/// Checks the key against the provider's published key format.
pub fn validate_api_key(provider: Provider, key: &str) -> Result<(), String> {
    let prefix = match provider {
        Provider::Openai => "sk-",
        Provider::Anthropic => "sk-ant-",
        Provider::Groq => "gsk_",
        Provider::Unsupported => "",
    };
    if key.starts_with(prefix) && key.len() > 20 {
        Ok(())
    } else if prefix.is_empty() {
        Err(format!("API key does not look valid for {provider}"))
    } else {
        Err(format!(
            "API key does not look like a {provider} key (expected '{prefix}…' longer than 20 characters)"
        ))
    }
}

/// Parses the config file and, when given, checks one profile in depth.
pub fn validate_config(profile_name: Option<&str>) -> Result<PathBuf, ConfigError> {
    let path = config_path()?;
    let config = read_config(&path)?;

    if let Some(name) = profile_name {
        let profile = profile(&config, name, &path)?;
        let resolved = resolve_generation_config(Some(profile), &Overrides::default())?;
        if let Some(key) = profile.api_key.as_deref() {
            validate_api_key(resolved.provider, key)
                .map_err(|reason| ConfigError::Invalid { field: "api_key", reason })?;
        }
    }

    Ok(path)
}
