use std::path::Path;

use burn::{
    config::Config as _,
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::backend::Backend,
};

use crate::{
    datasets::{complaints, Taxonomy},
    models::distilbert::{self, Model},
    preprocessing::Normalizer,
    utils::hugging_face::load_tokenizer,
};

use super::{
    batcher::{Infer, InferBatcher},
    config::{Config, CONFIG_FILE, MODEL_FILE},
    dataset::TokenizedDataset,
    labels::LabelEncoder,
    output::{write_predictions, Predictions},
};

/// A fine-tuned model together with the label list it was trained on
pub struct Classifier<B: Backend> {
    model: Model<B>,
    encoder: LabelEncoder,
    config: distilbert::Config,
}

impl<B: Backend> Classifier<B> {
    /// Wrap a model and its configuration
    pub fn new(model: Model<B>, config: distilbert::Config) -> Self {
        let encoder = LabelEncoder::from_classes(config.labels.clone());

        Self {
            model,
            encoder,
            config,
        }
    }

    /// Load a fine-tuned model from its artifact directory
    pub fn load(artifact_dir: &Path, device: &B::Device) -> anyhow::Result<Self> {
        // Load experiment configuration
        let config = distilbert::Config::load(artifact_dir.join(CONFIG_FILE))
            .map_err(|e| anyhow!("Unable to load config file: {}", e))?;

        let record = CompactRecorder::new()
            .load(artifact_dir.join(MODEL_FILE), device)
            .map_err(|e| anyhow!("Unable to load trained model weights: {}", e))?;

        // Create model using loaded weights
        let model = config.init::<B>(device).load_record(record);

        log::info!(
            "Loaded {} class model from {}",
            config.labels.len(),
            artifact_dir.display()
        );

        Ok(Self::new(model, config))
    }

    /// The configuration stored with the model
    pub fn config(&self) -> &distilbert::Config {
        &self.config
    }

    /// The label encoder rebuilt from the stored class list
    pub fn encoder(&self) -> &LabelEncoder {
        &self.encoder
    }

    /// Decoded class labels for a batch, in batch order
    pub fn predict(&self, batch: Infer<B>) -> anyhow::Result<Vec<String>> {
        self.model
            .predict(batch)
            .into_iter()
            .map(|class_id| Ok(self.encoder.decode(class_id)?.to_string()))
            .collect()
    }
}

/// Predict both taxonomies for every row of an unlabeled dataset. Batches keep the dataset
/// order and each prediction is stored at its source row.
pub fn predict<B: Backend>(
    category: &Classifier<B>,
    sub_category: &Classifier<B>,
    dataset: TokenizedDataset,
    batch_size: usize,
    device: &B::Device,
) -> anyhow::Result<Predictions> {
    let num_rows = dataset.len();

    let dataloader = DataLoaderBuilder::new(InferBatcher::<B>::new(device.clone()))
        .batch_size(batch_size)
        .build(dataset);

    let mut categories: Vec<Option<String>> = vec![None; num_rows];
    let mut sub_categories: Vec<Option<String>> = vec![None; num_rows];

    for batch in dataloader.iter() {
        let indexes = batch.indexes.clone();

        let predicted_categories = category.predict(batch.clone())?;
        let predicted_sub_categories = sub_category.predict(batch)?;

        for ((index, category), sub_category) in indexes
            .iter()
            .zip(predicted_categories)
            .zip(predicted_sub_categories)
        {
            categories[*index] = Some(category);
            sub_categories[*index] = Some(sub_category);
        }

        log::debug!("Predicted rows {:?}", indexes.first().zip(indexes.last()));
    }

    let collect = |predictions: Vec<Option<String>>, taxonomy: Taxonomy| {
        predictions
            .into_iter()
            .enumerate()
            .map(|(row, prediction)| {
                prediction.ok_or_else(|| anyhow!("No {} prediction for row {}", taxonomy, row))
            })
            .collect::<anyhow::Result<Vec<_>>>()
    };

    Ok(Predictions {
        category: collect(categories, Taxonomy::Category)?,
        sub_category: collect(sub_categories, Taxonomy::SubCategory)?,
    })
}

/// Load both fine-tuned models, predict the test file and write the prediction table
pub async fn infer<B: Backend>(device: &B::Device, config: &Config) -> anyhow::Result<Predictions> {
    let category = Classifier::<B>::load(&config.artifact_dir(Taxonomy::Category), device)?;
    let sub_category = Classifier::<B>::load(&config.artifact_dir(Taxonomy::SubCategory), device)?;

    let test_file = config.test_file();
    let dataset = complaints::Dataset::load(&test_file)
        .map_err(|e| anyhow!("Unable to read {}: {}", test_file.display(), e))?;

    log::info!("Predicting {} complaints", dataset.len());

    let texts = Normalizer::english().normalize_all(
        dataset
            .narratives()
            .iter()
            .map(|narrative| narrative.as_deref()),
    );

    let tokenizer = load_tokenizer(&category.config().base_model).await?;
    let dataset = TokenizedDataset::new(
        texts,
        None,
        tokenizer,
        category.config().max_seq_length,
    )?;

    let predictions = predict(
        &category,
        &sub_category,
        dataset,
        config.infer_batch_size,
        device,
    )?;

    write_predictions(&test_file, &config.predictions_file(), &predictions)?;

    log::info!(
        "Wrote {} predictions to {}",
        predictions.len(),
        config.predictions_file().display()
    );

    Ok(predictions)
}
