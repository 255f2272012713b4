//! Content filters for adapters.
//!
//! PII scrubbing and jailbreak-phrase detection applied to generated text
//! before it leaves an adapter.

use crate::core::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid regex")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\(\d{3}\)\s?|\b\d{3}-)\d{3}-\d{4}\b").expect("valid regex")
});

/// Phrases that indicate an attempt to override instructions.
pub const DEFAULT_JAILBREAK_PHRASES: &[&str] = &[
    "ignore previous instructions",
    "forget everything above",
    "act as if you're",
    "pretend to be",
    "roleplay as",
];

/// Filter applied to adapter output.
#[derive(Clone, Debug)]
pub struct ContentFilter {
    jailbreak_phrases: Vec<String>,
}

impl ContentFilter {
    /// Create a filter with the default phrase list.
    pub fn new() -> Self {
        Self {
            jailbreak_phrases: DEFAULT_JAILBREAK_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }

    /// Add a jailbreak phrase.
    pub fn with_phrase(mut self, phrase: &str) -> Self {
        self.jailbreak_phrases.push(phrase.to_lowercase());
        self
    }

    /// Replace e-mail addresses and phone numbers with placeholders.
    pub fn scrub_pii(&self, text: &str) -> String {
        let scrubbed = EMAIL_RE.replace_all(text, "[EMAIL]");
        PHONE_RE.replace_all(&scrubbed, "[PHONE]").into_owned()
    }

    /// First jailbreak phrase found in `text`, if any.
    pub fn find_jailbreak(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.jailbreak_phrases
            .iter()
            .find(|phrase| lower.contains(phrase.as_str()))
            .map(String::as_str)
    }

    /// Scrub `text`, failing on a jailbreak phrase.
    pub fn apply(&self, text: &str) -> Result<String> {
        if let Some(phrase) = self.find_jailbreak(text) {
            return Err(Error::JailbreakDetected(phrase.to_string()));
        }
        Ok(self.scrub_pii(text))
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new()
    }
}
