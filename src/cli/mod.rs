/// CLI Indexes: DistilBERT models
pub mod models;

/// Shared argument handling for the binaries
pub mod args;

pub use args::{init_logger, load_config, Overrides};
pub use models::Model;
