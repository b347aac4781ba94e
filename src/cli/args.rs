use burn::config::Config as _;

use crate::pipelines::text_classification::Config;

use super::models::Model;

/// Settings given on the command line, applied on top of the experiment configuration
#[derive(Debug, Default)]
pub struct Overrides {
    /// The path to the top-level data directory
    pub data_dir: Option<String>,

    /// The pretrained model to fine-tune
    pub model: Option<Model>,

    /// Number of epochs to train for
    pub num_epochs: Option<usize>,

    /// Training batch size
    pub batch_size: Option<usize>,
}

impl Overrides {
    /// Apply every given setting to the configuration
    pub fn apply(self, mut config: Config) -> Config {
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }

        if let Some(model) = self.model {
            config.model = model.to_string();
        }

        if let Some(num_epochs) = self.num_epochs {
            config.num_epochs = num_epochs;
        }

        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }

        config
    }
}

/// Load the experiment configuration from a JSON file, or use the defaults
pub fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .map_err(|e| anyhow!("Unable to load config file {}: {}", path, e)),
        None => Ok(Config::new()),
    }
}

/// Initialize logging, defaulting to the `info` level when `RUST_LOG` is unset
pub fn init_logger() {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();
}
