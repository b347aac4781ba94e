//! # Cybercrime Complaint Classifier
//!
//! Fine-tunes DistilBERT twice, once per label taxonomy, to classify cybercrime complaint
//! narratives, then predicts a test file and scores the predictions.
#![forbid(unsafe_code)]

/// Models
pub mod models;

/// Pipelines
pub mod pipelines;

/// Datasets
pub mod datasets;

/// Text preprocessing
pub mod preprocessing;

/// Scoring of prediction tables
pub mod evaluation;

/// Utilities
pub mod utils;

/// CLI indexes and utilities
pub mod cli;

/// Error macros
#[macro_use]
extern crate anyhow;
