use std::{path::Path, sync::Arc};

use burn::{
    config::Config as _,
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::{transform::ShuffledDataset, Dataset},
    },
    module::Module,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    record::{CompactRecorder, Recorder},
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion,
    },
};

use crate::{
    datasets::{complaints, Taxonomy},
    models::distilbert::{self, DistilBertConfig, Model},
    preprocessing::Normalizer,
    utils::hugging_face::{download_hf_model, load_tokenizer},
};

use super::{
    batcher::{Train, TrainBatcher},
    config::{Config, CONFIG_FILE, MODEL_FILE},
    dataset::TokenizedDataset,
    labels::Encoders,
    scaler::GradScaler,
    schedule::WarmupLinearDecay,
};

/// Fine-tune one classifier per requested taxonomy on the training file, saving each to its
/// artifact directory
pub async fn train<B: AutodiffBackend>(
    device: &B::Device,
    dataset: &complaints::Dataset,
    taxonomies: &[Taxonomy],
    config: &Config,
) -> anyhow::Result<()> {
    if !(config.learning_rate > 0.0 && config.learning_rate <= 1.0) {
        return Err(anyhow!(
            "The learning rate must be in (0, 1], got {}",
            config.learning_rate
        ));
    }

    let encoders = Encoders::fit(dataset);

    for taxonomy in Taxonomy::ALL {
        log::info!(
            "Fitted {} {} classes",
            encoders.get(taxonomy).len(),
            taxonomy
        );
    }

    if !dataset.has_labels(Taxonomy::SubCategory) || !dataset.has_labels(Taxonomy::Category) {
        log::warn!("The training file has a taxonomy without any labels");
    }

    let labels = encoders.encode(dataset)?;

    let texts = Normalizer::english().normalize_all(
        dataset
            .narratives()
            .iter()
            .map(|narrative| narrative.as_deref()),
    );

    let tokenizer = load_tokenizer(&config.model).await?;
    let dataset = TokenizedDataset::new(texts, Some(labels), tokenizer, config.max_seq_length)?;

    let files = download_hf_model(&config.model).await?;

    let base_config = DistilBertConfig::load(&files.config)
        .map_err(|e| anyhow!("Unable to load pre-trained model config file: {}", e))?;

    for &taxonomy in taxonomies {
        let model_config = distilbert::Config::new(
            base_config.clone(),
            encoders.get(taxonomy).classes(),
        )
        .with_max_seq_length(config.max_seq_length)
        .with_base_model(config.model.clone());

        if model_config.labels.is_empty() {
            return Err(anyhow!("No {} classes to train on", taxonomy));
        }

        log::info!("Training the {} classifier", taxonomy);

        let model =
            distilbert::load_for_classification::<B>(&files.weights, &model_config, device)?;

        let (model, _losses) = fit(model, dataset.clone(), taxonomy, config, device);

        save(model, &model_config, &config.artifact_dir(taxonomy))?;
    }

    Ok(())
}

/// Run the fine-tuning loop, returning the trained model and the mean loss of each epoch.
///
/// # Panics
///
/// If the learning rate is not in `(0, 1]`.
pub fn fit<B: AutodiffBackend>(
    mut model: Model<B>,
    dataset: TokenizedDataset,
    taxonomy: Taxonomy,
    config: &Config,
    device: &B::Device,
) -> (Model<B>, Vec<f64>) {
    // A single loader stream keeps every batch but the last one full
    let steps_per_epoch = dataset.len().div_ceil(config.batch_size.max(1));

    let mut schedule = WarmupLinearDecay::new(
        config.learning_rate,
        config.warmup_steps,
        steps_per_epoch * config.num_epochs,
    );

    let mut scaler = GradScaler::default();

    let mut optimizer = AdamWConfig::new()
        .with_epsilon(config.adam_epsilon)
        .with_weight_decay(config.weight_decay)
        .init();

    let batcher = TrainBatcher::<B>::new(taxonomy, device.clone());

    let mut losses = Vec::with_capacity(config.num_epochs);

    for epoch in 1..=config.num_epochs {
        let dataloader = shuffled_batches(batcher.clone(), dataset.clone(), config, epoch);

        let mut total_loss = 0.0;
        let mut num_batches = 0;

        for batch in dataloader.iter() {
            let output = model.forward(batch);
            let loss: f64 = output.loss.clone().into_scalar().elem();

            let learning_rate = schedule.step::<B>();

            let grads = scaler.scale_loss(output.loss).backward();
            let mut grads = GradientsParams::from_grads(grads, &model);

            let finite = scaler.unscale::<B, _>(&model, &mut grads);

            if finite {
                model = optimizer.step(learning_rate, model, grads);
            } else {
                log::warn!(
                    "Skipping optimizer step {} with non-finite gradients at scale {}",
                    schedule.steps_taken(),
                    scaler.scale()
                );
            }

            scaler.update(finite);

            log::debug!(
                "Epoch {} batch {}: loss = {}, lr = {}",
                epoch,
                num_batches + 1,
                loss,
                learning_rate
            );

            total_loss += loss;
            num_batches += 1;
        }

        let mean_loss = total_loss / num_batches.max(1) as f64;
        log::info!("Epoch {}: Loss = {}", epoch, mean_loss);

        losses.push(mean_loss);
    }

    (model, losses)
}

/// Training batches for one epoch, in a fresh order seeded by the epoch
pub(crate) fn shuffled_batches<B: AutodiffBackend>(
    batcher: TrainBatcher<B>,
    dataset: TokenizedDataset,
    config: &Config,
    epoch: usize,
) -> Arc<dyn DataLoader<Train<B>>> {
    DataLoaderBuilder::new(batcher)
        .batch_size(config.batch_size)
        .build(ShuffledDataset::with_seed(
            dataset,
            config.seed + epoch as u64,
        ))
}

/// Save the configuration and the trained model
pub fn save<B: Backend>(
    model: Model<B>,
    model_config: &distilbert::Config,
    artifact_dir: &Path,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(artifact_dir).map_err(|e| {
        anyhow!(
            "Unable to create artifact directory {}: {}",
            artifact_dir.display(),
            e
        )
    })?;

    model_config.save(artifact_dir.join(CONFIG_FILE))?;

    CompactRecorder::new()
        .record(model.into_record(), artifact_dir.join(MODEL_FILE))
        .map_err(|e| anyhow!("Unable to save model to {}: {}", artifact_dir.display(), e))?;

    log::info!("Saved model to {}", artifact_dir.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use burn::backend::{Autodiff, NdArray};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::{
        models::distilbert::config::tests::tiny,
        pipelines::text_classification::{
            dataset::{tests::word_level_tokenizer, Labels},
            inference::Classifier,
        },
    };

    type B = Autodiff<NdArray<f32>>;

    fn dataset() -> TokenizedDataset {
        let texts = ["upi fraud money", "bank account hack", "free money call", "hack"]
            .map(str::to_string)
            .to_vec();
        let labels = vec![
            Labels::new(0, 1),
            Labels::new(1, 0),
            Labels::new(0, 1),
            Labels::new(1, 0),
        ];

        TokenizedDataset::new(texts, Some(labels), word_level_tokenizer(), 8).unwrap()
    }

    fn config() -> Config {
        Config::new()
            .with_batch_size(2)
            .with_num_epochs(2)
            .with_max_seq_length(8)
            .with_learning_rate(1e-3)
    }

    #[test]
    fn reports_a_finite_loss_per_epoch() {
        let device = Default::default();
        let model_config = distilbert::Config::new(tiny(), vec!["A".into(), "B".into()]);
        let model = model_config.init::<B>(&device);

        let (_model, losses) = fit(model, dataset(), Taxonomy::Category, &config(), &device);

        assert_eq!(losses.len(), 2);
        assert!(losses.iter().all(|loss| loss.is_finite() && *loss > 0.0));
    }

    #[test]
    fn every_epoch_has_full_batches_matching_the_schedule() {
        let device = Default::default();
        let texts = (0..20).map(|i| format!("fraud {i}")).collect();
        let labels = (0..20).map(|i| Labels::new(i % 2, 0)).collect();
        let dataset =
            TokenizedDataset::new(texts, Some(labels), word_level_tokenizer(), 8).unwrap();
        let config = Config::new().with_batch_size(4);
        let batcher = TrainBatcher::<B>::new(Taxonomy::Category, device);

        for epoch in 1..=2 {
            let sizes: Vec<_> = shuffled_batches(batcher.clone(), dataset.clone(), &config, epoch)
                .iter()
                .map(|batch| batch.targets.dims()[0])
                .collect();

            assert_eq!(sizes, vec![4; 5]);
        }

        let mut rows: Vec<_> = shuffled_batches(batcher, dataset, &config, 1)
            .iter()
            .flat_map(|batch| batch.input.indexes)
            .collect();
        rows.sort();
        assert_eq!(rows, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn saved_model_reloads_for_inference() {
        let device = Default::default();
        let dir = TempDir::new().unwrap();
        let model_config = distilbert::Config::new(tiny(), vec!["A".into(), "B".into()])
            .with_max_seq_length(8);
        let model = model_config.init::<B>(&device);

        let (model, _) = fit(model, dataset(), Taxonomy::SubCategory, &config(), &device);
        save(model, &model_config, dir.path()).unwrap();

        assert!(dir.path().join(CONFIG_FILE).exists());

        let classifier = Classifier::<NdArray<f32>>::load(dir.path(), &device).unwrap();

        assert_eq!(classifier.config().labels, vec!["A", "B"]);
        assert_eq!(classifier.config().max_seq_length, 8);
    }
}
