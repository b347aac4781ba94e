/// Experiment configuration
pub mod config;

/// Label Encoding
pub mod labels;

/// Tokenized Dataset
pub mod dataset;

/// Batcher
pub mod batcher;

/// Learning rate schedule
pub mod schedule;

/// Dynamic loss scaling
pub mod scaler;

/// Training
pub mod training;

/// Inference
pub mod inference;

/// Prediction tables
pub mod output;

pub use batcher::{Infer, InferBatcher, Train, TrainBatcher};
pub use config::Config;
pub use dataset::{Item, TokenizedDataset};
pub use inference::{infer, predict, Classifier};
pub use labels::{Encoders, LabelEncoder, LabelError};
pub use output::Predictions;
pub use training::{fit, train};

