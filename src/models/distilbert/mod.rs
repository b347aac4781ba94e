/// Model configuration
pub mod config;

/// Pretrained weight loading
pub mod loader;

/// The base encoder and the sequence classification model
pub mod model;

pub use config::{Config, DistilBertConfig};
pub use loader::{load_for_classification, load_pretrained, LoadError};
pub use model::{DistilBertModel, Model};

/// Supported pretrained DistilBERT checkpoints on the Hugging Face Hub
pub static MODELS: &[&str] = &["distilbert-base-uncased", "distilbert-base-cased"];

/// The checkpoint fine-tuned when none is given
pub static DEFAULT_MODEL: &str = "distilbert-base-uncased";
