use std::path::PathBuf;

use hf_hub::api::tokio::Api;
use tokenizers::Tokenizer;

/// Local paths of a pretrained model's files
#[derive(Clone, Debug)]
pub struct PretrainedFiles {
    /// The Hugging Face `config.json`
    pub config: PathBuf,

    /// The `model.safetensors` weights
    pub weights: PathBuf,
}

/// Download model config and weights from Hugging Face Hub
/// If file exists in cache, it will not be downloaded again
pub async fn download_hf_model(model_name: &str) -> anyhow::Result<PretrainedFiles> {
    let repo = Api::new()?.model(model_name.to_string());

    let weights = repo.get("model.safetensors").await.map_err(|e| {
        anyhow!(
            "Failed to download: {} weights with name: model.safetensors from HuggingFace Hub: {}",
            model_name,
            e
        )
    })?;

    let config = repo.get("config.json").await.map_err(|e| {
        anyhow!(
            "Failed to download: {} config with name: config.json from HuggingFace Hub: {}",
            model_name,
            e
        )
    })?;

    Ok(PretrainedFiles { config, weights })
}

/// Download and load the tokenizer that matches a pretrained model
pub async fn load_tokenizer(model_name: &str) -> anyhow::Result<Tokenizer> {
    let repo = Api::new()?.model(model_name.to_string());

    let path = repo.get("tokenizer.json").await.map_err(|e| {
        anyhow!(
            "Failed to download: {} tokenizer with name: tokenizer.json from HuggingFace Hub: {}",
            model_name,
            e
        )
    })?;

    Tokenizer::from_file(&path)
        .map_err(|e| anyhow!("Unable to load tokenizer from {}: {}", path.display(), e))
}
