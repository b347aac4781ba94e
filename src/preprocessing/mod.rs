/// Narrative cleaning
pub mod normalizer;

/// Stop-word lists
pub mod stop_words;

pub use normalizer::Normalizer;
