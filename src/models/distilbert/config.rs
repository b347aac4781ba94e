//! Adapt DistilBERT for Sequence Classification to the Text Classification pipeline

use burn::{
    nn::{
        transformer::TransformerEncoderConfig, DropoutConfig, EmbeddingConfig, LayerNormConfig,
        LinearConfig,
    },
    tensor::backend::Backend,
};

use super::{DistilBertModel, Model};

/// Epsilon of the embedding layer normalization
pub const LAYER_NORM_EPS: f64 = 1e-12;

/// The base DistilBERT configuration, as published in the Hugging Face `config.json`
#[derive(burn::config::Config)]
pub struct DistilBertConfig {
    /// Size of the vocabulary
    pub vocab_size: usize,
    /// Number of learned position embeddings
    pub max_position_embeddings: usize,
    /// Size of the hidden state (768 for distilbert-base)
    pub dim: usize,
    /// Number of transformer blocks
    pub n_layers: usize,
    /// Number of attention heads in each block
    pub n_heads: usize,
    /// Size of the intermediate position wise feedforward layer
    pub hidden_dim: usize,
    /// Dropout value across embeddings, attention weights and feedforward layers
    pub dropout: f64,
    /// Dropout value in the classification head
    pub seq_classif_dropout: f64,
}

impl DistilBertConfig {
    /// Initialize the base model with random weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> DistilBertModel<B> {
        DistilBertModel {
            word_embeddings: EmbeddingConfig::new(self.vocab_size, self.dim).init(device),
            position_embeddings: EmbeddingConfig::new(self.max_position_embeddings, self.dim)
                .init(device),
            embedding_norm: LayerNormConfig::new(self.dim)
                .with_epsilon(LAYER_NORM_EPS)
                .init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            encoder: self.encoder().init(device),
        }
    }

    /// The transformer stack: post-norm blocks with a GELU feedforward
    pub fn encoder(&self) -> TransformerEncoderConfig {
        TransformerEncoderConfig::new(self.dim, self.hidden_dim, self.n_heads, self.n_layers)
            .with_dropout(self.dropout)
            .with_norm_first(false)
    }
}

/// The Model Configuration, saved next to the fine-tuned weights
#[derive(burn::config::Config)]
pub struct Config {
    /// The base DistilBERT config
    pub model: DistilBertConfig,

    /// The fitted class labels, ordered by class id
    pub labels: Vec<String>,

    /// The fixed length of every tokenized input
    #[config(default = 256)]
    pub max_seq_length: usize,

    /// The pretrained model the weights were fine-tuned from (e.g., "distilbert-base-uncased")
    #[config(default = "\"distilbert-base-uncased\".to_string()")]
    pub base_model: String,
}

impl Config {
    /// Initialize the classifier with random weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> Model<B> {
        self.init_with(self.model.init(device), device)
    }

    /// Initialize randomly weighted classification heads on top of a base model
    pub fn init_with<B: Backend>(
        &self,
        distilbert: DistilBertModel<B>,
        device: &B::Device,
    ) -> Model<B> {
        let n_classes = self.labels.len();

        Model {
            distilbert,
            pre_classifier: LinearConfig::new(self.model.dim, self.model.dim).init(device),
            classifier: LinearConfig::new(self.model.dim, n_classes).init(device),
            dropout: DropoutConfig::new(self.model.seq_classif_dropout).init(),
            n_classes,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A DistilBERT small enough to run in unit tests
    pub(crate) fn tiny() -> DistilBertConfig {
        DistilBertConfig::new(16, 32, 8, 2, 2, 16, 0.1, 0.2)
    }

    #[test]
    fn reads_hugging_face_config() {
        let json = r#"{
            "activation": "gelu",
            "architectures": ["DistilBertForMaskedLM"],
            "attention_dropout": 0.1,
            "dim": 768,
            "dropout": 0.1,
            "hidden_dim": 3072,
            "initializer_range": 0.02,
            "max_position_embeddings": 512,
            "model_type": "distilbert",
            "n_heads": 12,
            "n_layers": 6,
            "pad_token_id": 0,
            "qa_dropout": 0.1,
            "seq_classif_dropout": 0.2,
            "sinusoidal_pos_embds": false,
            "tie_weights_": true,
            "transformers_version": "4.10.0.dev0",
            "vocab_size": 30522
        }"#;

        let config: DistilBertConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.dim, 768);
        assert_eq!(config.n_layers, 6);
        assert_eq!(config.n_heads, 12);
        assert_eq!(config.vocab_size, 30522);
        assert_eq!(config.seq_classif_dropout, 0.2);

        let encoder = config.encoder();
        assert_eq!(encoder.d_ff, 3072);
        assert!(!encoder.norm_first);
    }

    #[test]
    fn classifier_config_defaults() {
        let config = Config::new(tiny(), vec!["A".to_string(), "B".to_string()]);

        assert_eq!(config.max_seq_length, 256);
        assert_eq!(config.base_model, "distilbert-base-uncased");
    }
}
