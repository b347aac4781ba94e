use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

use super::stop_words;

lazy_static! {
    /// Anything that is not an ASCII letter or whitespace
    static ref NON_ALPHABETIC: Regex = Regex::new(r"[^a-zA-Z\s]").unwrap();
}

/// Cleans complaint narratives before they reach the subword tokenizer
pub struct Normalizer {
    /// Tokens dropped from the output
    stop_words: HashSet<&'static str>,

    /// Reduces each remaining token to its base form
    stemmer: Stemmer,
}

impl Normalizer {
    /// Create a normalizer with the English stop-word list and the Snowball English stemmer
    pub fn english() -> Self {
        Self {
            stop_words: stop_words::ENGLISH.iter().copied().collect(),
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Normalize a narrative that may be missing. Missing input becomes an empty string.
    pub fn normalize(&self, text: Option<&str>) -> String {
        let Some(text) = text else {
            return String::new();
        };

        let lowered = text.to_lowercase();
        let cleaned = NON_ALPHABETIC.replace_all(&lowered, " ");

        cleaned
            .split_whitespace()
            .filter(|token| !self.stop_words.contains(token))
            .map(|token| self.stemmer.stem(token).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Normalize a batch of narratives, preserving order
    pub fn normalize_all<'a, I>(&self, texts: I) -> Vec<String>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        texts.into_iter().map(|text| self.normalize(text)).collect()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::english()
    }
}
