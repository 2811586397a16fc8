//! Content safety filter
//!
//! Case-insensitive substring matching against a denylist. There is no word
//! boundary logic: a banned token inside an unrelated word still blocks the
//! message (`"harmony"` contains `"harm"`). This is a known false-positive
//! source and is kept as is.

/// Default denylist
pub const DEFAULT_BANNED_WORDS: &[&str] = &["bomb", "kill", "attack", "suicide", "harm"];

/// Denylist based message filter
#[derive(Debug, Clone)]
pub struct ContentFilter {
    /// Lowercased banned tokens
    banned: Vec<String>,
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new(DEFAULT_BANNED_WORDS.iter().copied())
    }
}

impl ContentFilter {
    /// Create a filter from a list of banned tokens
    ///
    /// Empty tokens are ignored since they would match every message.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let banned = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { banned }
    }

    /// Check whether a message trips the filter
    pub fn is_blocked(&self, message: &str) -> bool {
        let lowered = message.to_lowercase();
        self.banned.iter().any(|word| lowered.contains(word.as_str()))
    }

    /// The banned tokens, lowercased
    pub fn banned_words(&self) -> &[String] {
        &self.banned
    }
}
