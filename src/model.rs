//! Request and result types shared by the suggestion pipeline.
//!
//! Field names on the wire follow the browser extension's camelCase message
//! schema, so these types can be read straight off a channel envelope.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::logging::redact_key;

/// Upper bound on the number of suggestions ever returned to a caller.
pub const MAX_SUGGESTIONS: usize = 3;

const DEFAULT_TONE: i32 = 50;

/// Tweet being replied to, as scraped by the page-side collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweetInput {
    pub text: String,
    pub author: String,
    pub handle: String,
}

/// Text-generation service family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Openai,
    Anthropic,
    Groq,
    /// Any value the pipeline does not know how to dispatch.
    #[serde(other)]
    Unsupported,
}

impl Provider {
    pub const SUPPORTED: [Provider; 3] = [Provider::Openai, Provider::Anthropic, Provider::Groq];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Anthropic => "anthropic",
            Self::Groq => "groq",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::Openai),
            "anthropic" => Ok(Self::Anthropic),
            "groq" => Ok(Self::Groq),
            other => Err(format!(
                "Invalid provider '{other}'. Supported values: openai, anthropic, groq."
            )),
        }
    }
}

/// Communication style. Values outside the known table are kept verbatim and
/// passed to the model as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Style {
    Professional,
    #[default]
    Casual,
    Witty,
    Thoughtful,
    Provocative,
    Custom(String),
}

impl Style {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Professional => "professional",
            Self::Casual => "casual",
            Self::Witty => "witty",
            Self::Thoughtful => "thoughtful",
            Self::Provocative => "provocative",
            Self::Custom(raw) => raw,
        }
    }
}

impl From<String> for Style {
    fn from(value: String) -> Self {
        match value.as_str() {
            "professional" => Self::Professional,
            "casual" => Self::Casual,
            "witty" => Self::Witty,
            "thoughtful" => Self::Thoughtful,
            "provocative" => Self::Provocative,
            _ => Self::Custom(value),
        }
    }
}

impl From<&str> for Style {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Style> for String {
    fn from(style: Style) -> Self {
        match style {
            Style::Custom(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// Target reply length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Length {
    Concise,
    #[default]
    Medium,
    Detailed,
    /// Unknown length values fall back to the default guide.
    #[serde(other)]
    Unrecognized,
}

impl FromStr for Length {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "concise" => Ok(Self::Concise),
            "medium" => Ok(Self::Medium),
            "detailed" => Ok(Self::Detailed),
            other => Err(format!(
                "Invalid length '{other}'. Supported values: concise, medium, detailed."
            )),
        }
    }
}

/// User preferences attached to every generation request.
///
/// Nothing here is cached between requests: each request carries its own copy.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationConfig {
    pub provider: Provider,
    #[serde(deserialize_with = "null_as_default")]
    pub api_key: String,
    #[serde(alias = "expertiseTags", deserialize_with = "null_as_default")]
    pub expertise: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub style: Style,
    /// 0 is warmest, 100 most authoritative.
    #[serde(deserialize_with = "tone_from_number")]
    pub tone: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub length: Length,
    #[serde(deserialize_with = "null_as_default")]
    pub include_emojis: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub add_hashtags: bool,
}

/// `null` reads as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts any JSON number or `null`. Fractions round away from the balanced
/// band: 66.5 becomes 67 and 32.5 becomes 32.
fn tone_from_number<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(tone) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(DEFAULT_TONE);
    };
    let whole = if tone > 66.0 { tone.ceil() } else { tone.floor() };
    Ok(whole as i32)
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_key: String::new(),
            expertise: Vec::new(),
            style: Style::default(),
            tone: DEFAULT_TONE,
            length: Length::default(),
            include_emojis: false,
            add_hashtags: false,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("provider", &self.provider)
            .field("api_key", &redact_key(&self.api_key))
            .field("expertise", &self.expertise)
            .field("style", &self.style)
            .field("tone", &self.tone)
            .field("length", &self.length)
            .field("include_emojis", &self.include_emojis)
            .field("add_hashtags", &self.add_hashtags)
            .finish()
    }
}

/// Opaque identifier used to route a response back to the requesting caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoutingHandle {
    Id(u64),
    Name(String),
}

impl fmt::Display for RoutingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// One user-initiated request for suggestions.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub tweet: TweetInput,
    pub config: GenerationConfig,
    pub reply_to: Option<RoutingHandle>,
}

/// Between zero and [`MAX_SUGGESTIONS`] reply texts. Empty means failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SuggestionResult(Vec<String>);

impl SuggestionResult {
    pub fn new(mut suggestions: Vec<String>) -> Self {
        suggestions.truncate(MAX_SUGGESTIONS);
        Self(suggestions)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}
