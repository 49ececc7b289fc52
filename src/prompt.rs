//! Prompt construction for reply suggestions.
//!
//! The wording is part of the contract with every provider and with callers
//! asserting on prompt content; change it deliberately.

use crate::model::{GenerationConfig, Length, Style, TweetInput};

pub const TONE_FRIENDLY: &str = "friendly, warm, and approachable";
pub const TONE_BALANCED: &str = "balanced, conversational, and engaging";
pub const TONE_AUTHORITATIVE: &str = "authoritative, confident, and expert";

pub const EMOJIS_ON: &str = "- Include 1-2 relevant emojis naturally";
pub const EMOJIS_OFF: &str = "- Do NOT include any emojis";
pub const HASHTAGS_ON: &str = "- Add 1-2 relevant hashtags if they fit naturally";
pub const HASHTAGS_OFF: &str = "- Do NOT include hashtags";

/// Tone band for a 0..=100 slider value. Below 33 is friendly, above 66 is
/// authoritative, everything else (including 33 and 66) is balanced.
pub fn tone_description(tone: i32) -> &'static str {
    if tone < 33 {
        TONE_FRIENDLY
    } else if tone > 66 {
        TONE_AUTHORITATIVE
    } else {
        TONE_BALANCED
    }
}

pub fn length_guide(length: Length) -> &'static str {
    match length {
        Length::Concise => "1-2 sentences, under 100 characters ideal",
        Length::Detailed => "2-4 sentences, can use up to 280 characters",
        Length::Medium | Length::Unrecognized => "1-3 sentences, around 140-180 characters",
    }
}

pub fn style_description(style: &Style) -> &str {
    match style {
        Style::Professional => "professional and polished, using industry-appropriate language",
        Style::Casual => "casual and relaxed, like talking to a friend",
        Style::Witty => "clever and witty, with subtle humor or wordplay",
        Style::Thoughtful => "thoughtful and insightful, adding depth to the conversation",
        Style::Provocative => "bold and thought-provoking, challenging assumptions constructively",
        Style::Custom(raw) => raw,
    }
}

fn expertise_clause(expertise: &[String]) -> String {
    if expertise.is_empty() {
        return String::new();
    }
    format!(
        "The user has expertise in: {}. Leverage this knowledge when relevant.",
        expertise.join(", ")
    )
}

/// Builds the single prompt sent to every provider.
pub fn build_prompt(tweet: &TweetInput, prefs: &GenerationConfig) -> String {
    let style = style_description(&prefs.style);
    let tone = tone_description(prefs.tone);
    let length = length_guide(prefs.length);
    let expertise = expertise_clause(&prefs.expertise);
    let emojis = if prefs.include_emojis { EMOJIS_ON } else { EMOJIS_OFF };
    let hashtags = if prefs.add_hashtags { HASHTAGS_ON } else { HASHTAGS_OFF };

    format!(
        r#"You are an expert Twitter engagement assistant helping craft authentic, engaging replies.

TWEET TO REPLY TO:
Author: {author} (@{handle})
Content: "{text}"

REPLY REQUIREMENTS:
- Communication Style: {style}
- Tone: {tone}
- Length: {length}
{expertise}
{emojis}
{hashtags}

GUIDELINES FOR GREAT REPLIES:
1. Add genuine value - share insight, ask a thoughtful question, or offer a unique perspective
2. Be authentic - avoid generic responses like "Great point!" or "So true!"
3. Match the energy of the original tweet
4. Spark further conversation when possible
5. Stay relevant to the tweet's topic
6. Never be sycophantic or overly agreeable

Generate exactly 3 different reply options, each taking a slightly different approach.

IMPORTANT: Return ONLY a valid JSON array with 3 string replies. No markdown, no explanation, just the JSON array.
Example format: ["Reply option 1", "Reply option 2", "Reply option 3"]"#,
        author = tweet.author,
        handle = tweet.handle,
        text = tweet.text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tweet() -> TweetInput {
        TweetInput {
            text: "Rust 2024 edition is out".to_string(),
            author: "Ferris".to_string(),
            handle: "rustlang".to_string(),
        }
    }

    fn prefs_with_tone(tone: i32) -> GenerationConfig {
        GenerationConfig {
            tone,
            ..GenerationConfig::default()
        }
    }

    fn tone_phrases(prompt: &str) -> [bool; 3] {
        [
            prompt.contains(TONE_FRIENDLY),
            prompt.contains(TONE_BALANCED),
            prompt.contains(TONE_AUTHORITATIVE),
        ]
    }

    #[test]
    fn tone_bands_select_exactly_one_phrase() {
        assert_eq!(tone_phrases(&build_prompt(&tweet(), &prefs_with_tone(0))), [true, false, false]);
        assert_eq!(tone_phrases(&build_prompt(&tweet(), &prefs_with_tone(50))), [false, true, false]);
        assert_eq!(tone_phrases(&build_prompt(&tweet(), &prefs_with_tone(67))), [false, false, true]);
    }

    #[test]
    fn tone_breakpoints() {
        assert_eq!(tone_description(32), TONE_FRIENDLY);
        assert_eq!(tone_description(33), TONE_BALANCED);
        assert_eq!(tone_description(66), TONE_BALANCED);
        assert_eq!(tone_description(67), TONE_AUTHORITATIVE);
    }

    #[test]
    fn emoji_and_hashtag_directives_are_exclusive() {
        let off = build_prompt(&tweet(), &GenerationConfig::default());
        assert!(off.contains(EMOJIS_OFF));
        assert!(!off.contains(EMOJIS_ON));
        assert!(off.contains(HASHTAGS_OFF));
        assert!(!off.contains(HASHTAGS_ON));

        let on = build_prompt(
            &tweet(),
            &GenerationConfig {
                include_emojis: true,
                add_hashtags: true,
                ..GenerationConfig::default()
            },
        );
        assert!(on.contains(EMOJIS_ON));
        assert!(!on.contains(EMOJIS_OFF));
        assert!(on.contains(HASHTAGS_ON));
        assert!(!on.contains(HASHTAGS_OFF));
    }

    #[test]
    fn expertise_clause_only_when_tags_present() {
        let without = build_prompt(&tweet(), &GenerationConfig::default());
        assert!(!without.contains("The user has expertise in"));

        let with = build_prompt(
            &tweet(),
            &GenerationConfig {
                expertise: vec!["Compilers".to_string(), "Embedded".to_string()],
                ..GenerationConfig::default()
            },
        );
        assert!(with.contains(
            "The user has expertise in: Compilers, Embedded. Leverage this knowledge when relevant."
        ));
    }

    #[test]
    fn style_falls_back_to_raw_value() {
        let prompt = build_prompt(
            &tweet(),
            &GenerationConfig {
                style: Style::from("like a pirate"),
                ..GenerationConfig::default()
            },
        );
        assert!(prompt.contains("- Communication Style: like a pirate"));
    }

    #[test]
    fn unrecognized_length_uses_default_guide() {
        assert_eq!(length_guide(Length::Unrecognized), length_guide(Length::Medium));
        assert_ne!(length_guide(Length::Concise), length_guide(Length::Detailed));
    }

    #[test]
    fn prompt_embeds_tweet_and_json_instruction() {
        let prompt = build_prompt(&tweet(), &GenerationConfig::default());
        assert!(prompt.contains("Author: Ferris (@rustlang)"));
        assert!(prompt.contains("Content: \"Rust 2024 edition is out\""));
        assert!(prompt.contains("Generate exactly 3 different reply options"));
        assert!(prompt.contains("Return ONLY a valid JSON array with 3 string replies"));
    }
}
