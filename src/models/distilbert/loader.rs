use std::{collections::HashMap, path::Path};

use burn::{
    module::{ConstantRecord, Module, Param},
    nn::{
        DropoutConfig, Embedding, EmbeddingConfig, EmbeddingRecord, LayerNormConfig,
        LayerNormRecord, LinearRecord,
    },
    tensor::{backend::Backend, Data, Shape, Tensor},
};
use candle_core::{DType, Device};

use super::{config::LAYER_NORM_EPS, Config, DistilBertConfig, DistilBertModel, Model};

/// Prefix used by checkpoints saved from a task-specific head
const PREFIX: &str = "distilbert.";

/// Weight Loading Error
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    /// The safetensors file could not be read
    #[error("unable to read weights: {0}")]
    Read(#[from] candle_core::Error),

    /// A tensor the architecture needs is absent from the file
    #[error("missing tensor {0}")]
    Missing(String),

    /// A tensor has a different rank than the layer expects
    #[error("tensor {name} has rank {found}, expected {expected}")]
    Rank {
        /// The tensor name, without the task-specific prefix
        name: String,
        /// The rank the layer expects
        expected: usize,
        /// The rank stored in the file
        found: usize,
    },
}

/// Load pretrained DistilBERT weights from a Hugging Face safetensors file
pub fn load_pretrained<B: Backend>(
    path: &Path,
    config: &DistilBertConfig,
    device: &B::Device,
) -> Result<DistilBertModel<B>, LoadError> {
    let tensors = candle_core::safetensors::load(path, &Device::Cpu)?
        .into_iter()
        .map(|(name, tensor)| {
            let name = name.strip_prefix(PREFIX).map(str::to_string).unwrap_or(name);
            (name, tensor)
        })
        .collect();

    let weights = Weights::<B> { tensors, device };

    // Hugging Face block names mapped onto the burn encoder's record fields
    let encoder = config.encoder().init::<B>(device);
    let mut record = encoder.clone().into_record();

    for (i, layer) in record.layers.iter_mut().enumerate() {
        let prefix = format!("transformer.layer.{i}");

        layer.mha.query = weights.linear(&format!("{prefix}.attention.q_lin"))?;
        layer.mha.key = weights.linear(&format!("{prefix}.attention.k_lin"))?;
        layer.mha.value = weights.linear(&format!("{prefix}.attention.v_lin"))?;
        layer.mha.output = weights.linear(&format!("{prefix}.attention.out_lin"))?;
        layer.norm_1 = weights.layer_norm(&format!("{prefix}.sa_layer_norm"))?;
        layer.pwff.linear_inner = weights.linear(&format!("{prefix}.ffn.lin1"))?;
        layer.pwff.linear_outer = weights.linear(&format!("{prefix}.ffn.lin2"))?;
        layer.norm_2 = weights.layer_norm(&format!("{prefix}.output_layer_norm"))?;
    }

    let n_layers = record.layers.len();

    let model = DistilBertModel {
        word_embeddings: weights.embedding("embeddings.word_embeddings")?,
        position_embeddings: weights.embedding("embeddings.position_embeddings")?,
        embedding_norm: LayerNormConfig::new(config.dim)
            .with_epsilon(LAYER_NORM_EPS)
            .init(device)
            .load_record(weights.layer_norm("embeddings.LayerNorm")?),
        dropout: DropoutConfig::new(config.dropout).init(),
        encoder: encoder.load_record(record),
    };

    log::info!(
        "Loaded {} pretrained transformer blocks from {}",
        n_layers,
        path.display()
    );

    Ok(model)
}

/// Load pretrained DistilBERT weights beneath freshly initialized classification heads
pub fn load_for_classification<B: Backend>(
    path: &Path,
    config: &Config,
    device: &B::Device,
) -> Result<Model<B>, LoadError> {
    let distilbert = load_pretrained(path, &config.model, device)?;

    Ok(config.init_with(distilbert, device))
}

/// Named safetensors weights, converted to Burn tensors on demand
struct Weights<'a, B: Backend> {
    tensors: HashMap<String, candle_core::Tensor>,
    device: &'a B::Device,
}

impl<B: Backend> Weights<'_, B> {
    fn tensor<const D: usize>(&self, name: &str) -> Result<Tensor<B, D>, LoadError> {
        let tensor = self
            .tensors
            .get(name)
            .ok_or_else(|| LoadError::Missing(name.to_string()))?;

        let dims: [usize; D] = tensor.dims().try_into().map_err(|_| LoadError::Rank {
            name: name.to_string(),
            expected: D,
            found: tensor.rank(),
        })?;

        let values = tensor.to_dtype(DType::F32)?.flatten_all()?.to_vec1::<f32>()?;

        Ok(Tensor::from_floats(
            Data::new(values, Shape::new(dims)),
            self.device,
        ))
    }

    /// Older checkpoints name layer norm parameters `gamma` and `beta`
    fn either<const D: usize>(&self, name: &str, legacy: &str) -> Result<Tensor<B, D>, LoadError> {
        if self.tensors.contains_key(legacy) && !self.tensors.contains_key(name) {
            self.tensor(legacy)
        } else {
            self.tensor(name)
        }
    }

    fn linear(&self, prefix: &str) -> Result<LinearRecord<B>, LoadError> {
        // PyTorch stores linear weights as [d_output, d_input]
        let weight = self.tensor::<2>(&format!("{prefix}.weight"))?.transpose();
        let bias = self.tensor::<1>(&format!("{prefix}.bias"))?;

        Ok(LinearRecord {
            weight: Param::from_tensor(weight),
            bias: Some(Param::from_tensor(bias)),
        })
    }

    fn layer_norm(&self, prefix: &str) -> Result<LayerNormRecord<B>, LoadError> {
        let gamma =
            self.either::<1>(&format!("{prefix}.weight"), &format!("{prefix}.gamma"))?;
        let beta = self.either::<1>(&format!("{prefix}.bias"), &format!("{prefix}.beta"))?;

        Ok(LayerNormRecord {
            gamma: Param::from_tensor(gamma),
            beta: Param::from_tensor(beta),
            epsilon: ConstantRecord::new(),
        })
    }

    fn embedding(&self, prefix: &str) -> Result<Embedding<B>, LoadError> {
        let weight = self.tensor::<2>(&format!("{prefix}.weight"))?;
        let [n_embedding, d_model] = weight.dims();

        let record = EmbeddingRecord {
            weight: Param::from_tensor(weight),
        };

        Ok(EmbeddingConfig::new(n_embedding, d_model)
            .init(self.device)
            .load_record(record))
    }
}
