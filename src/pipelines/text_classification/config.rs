use std::path::PathBuf;

use burn::LearningRate;

use crate::{datasets::Taxonomy, models::distilbert};

/// Name of the fine-tuned model configuration inside an artifact directory
pub static CONFIG_FILE: &str = "config.json";

/// Name of the fine-tuned model record inside an artifact directory (the recorder adds
/// its own extension)
pub static MODEL_FILE: &str = "model";

/// Define configuration struct for the experiment
#[derive(burn::config::Config)]
pub struct Config {
    /// Model name (e.g., "distilbert-base-uncased")
    #[config(default = "distilbert::DEFAULT_MODEL.to_string()")]
    pub model: String,

    /// The path to the top-level data directory
    #[config(default = "\"data\".to_string()")]
    pub data_dir: String,

    /// Maximum sequence length
    #[config(default = 256)]
    pub max_seq_length: usize,

    /// Training batch size
    #[config(default = 32)]
    pub batch_size: usize,

    /// Inference batch size
    #[config(default = 256)]
    pub infer_batch_size: usize,

    /// Number of epochs
    #[config(default = 3)]
    pub num_epochs: usize,

    /// Initial learning rate
    #[config(default = 2e-5)]
    pub learning_rate: LearningRate,

    /// Number of optimizer steps spent warming up the learning rate
    #[config(default = 0)]
    pub warmup_steps: usize,

    /// Adam epsilon
    #[config(default = 1e-8)]
    pub adam_epsilon: f32,

    /// AdamW weight decay
    #[config(default = 0.01)]
    pub weight_decay: f32,

    /// Base seed for the per-epoch shuffle
    #[config(default = 42)]
    pub seed: u64,
}

impl Config {
    /// The labeled training file
    pub fn train_file(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("train.csv")
    }

    /// The test file to predict
    pub fn test_file(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("test.csv")
    }

    /// The directory holding the fine-tuned model for a taxonomy
    pub fn artifact_dir(&self, taxonomy: Taxonomy) -> PathBuf {
        PathBuf::from(&self.data_dir)
            .join("models")
            .join(taxonomy.artifact_name())
    }

    /// The prediction table written by inference
    pub fn predictions_file(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("predictions_output.csv")
    }

    /// The confusion matrix heatmap written by evaluation
    pub fn heatmap_file(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("confusion_matrix.svg")
    }

    /// The classification reports written by evaluation
    pub fn metrics_file(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("metrics.json")
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use burn::config::Config as _;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn defaults_match_the_fine_tuning_recipe() {
        let config = Config::new();

        assert_eq!(config.model, "distilbert-base-uncased");
        assert_eq!(config.max_seq_length, 256);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.infer_batch_size, 256);
        assert_eq!(config.num_epochs, 3);
        assert_eq!(config.learning_rate, 2e-5);
        assert_eq!(config.warmup_steps, 0);
        assert_eq!(config.adam_epsilon, 1e-8);
        assert_eq!(config.weight_decay, 0.01);
    }

    #[test]
    fn paths_live_under_the_data_dir() {
        let config = Config::new().with_data_dir("/srv/complaints".to_string());

        assert_eq!(config.train_file(), Path::new("/srv/complaints/train.csv"));
        assert_eq!(
            config.artifact_dir(Taxonomy::SubCategory),
            Path::new("/srv/complaints/models/subcategory_classifier")
        );
        assert_eq!(
            config.predictions_file(),
            Path::new("/srv/complaints/predictions_output.csv")
        );
    }

    #[test]
    fn saved_overrides_are_restored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("experiment.json");

        Config::new()
            .with_num_epochs(1)
            .with_seed(7)
            .save(&path)
            .unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.num_epochs, 1);
        assert_eq!(config.seed, 7);
        assert_eq!(config.batch_size, 32);
    }
}
