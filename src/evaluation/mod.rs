/// Confusion matrix over a label axis
pub mod confusion;

/// SVG heatmap rendering
pub mod heatmap;

/// Precision, recall and F1 reports
pub mod report;

use std::{fs, path::Path};

use burn::config::Config as _;
use serde::Serialize;

use crate::{
    datasets::{Taxonomy, MISSING_LABEL},
    models::distilbert,
    pipelines::text_classification::{
        config::{Config, CONFIG_FILE},
        labels::LabelEncoder,
        output::{read_predictions, Scored},
    },
};

pub use confusion::ConfusionMatrix;
pub use report::ClassificationReport;

/// Scores for both taxonomies and the category confusion matrix
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Evaluation {
    /// The category report
    pub category: ClassificationReport,

    /// The sub-category report
    pub sub_category: ClassificationReport,

    /// Category confusion matrix
    #[serde(skip)]
    pub confusion: ConfusionMatrix,
}

impl Evaluation {
    /// Score a prediction table, laying the confusion matrix out along the category encoder
    pub fn new(scored: &Scored, category_encoder: &LabelEncoder) -> Self {
        let report = |taxonomy: Taxonomy| {
            ClassificationReport::new(scored.truth.get(taxonomy), scored.predicted.get(taxonomy))
        };

        let truth = scored.truth.get(Taxonomy::Category);
        let predicted = scored.predicted.get(Taxonomy::Category);
        let axis = ConfusionMatrix::axis(category_encoder, truth, predicted);

        Self {
            category: report(Taxonomy::Category),
            sub_category: report(Taxonomy::SubCategory),
            confusion: ConfusionMatrix::new(axis, truth, predicted),
        }
    }

    /// The report for a taxonomy
    pub fn report(&self, taxonomy: Taxonomy) -> &ClassificationReport {
        match taxonomy {
            Taxonomy::Category => &self.category,
            Taxonomy::SubCategory => &self.sub_category,
        }
    }

    /// Write both reports as JSON
    pub fn save_metrics(&self, path: &Path) -> anyhow::Result<()> {
        let file = fs::File::create(path)
            .map_err(|e| anyhow!("Unable to create {}: {}", path.display(), e))?;

        serde_json::to_writer_pretty(file, self)?;

        Ok(())
    }
}

/// Score the prediction table in the data directory, writing the heatmap and the metrics
pub fn evaluate(config: &Config) -> anyhow::Result<Evaluation> {
    let predictions_file = config.predictions_file();
    let scored = read_predictions(&predictions_file)?;

    log::info!(
        "Scoring {} predictions from {}",
        scored.predicted.len(),
        predictions_file.display()
    );

    if scored.truth.category.iter().all(|label| label == MISSING_LABEL) {
        log::warn!("The prediction table has no true category labels");
    }

    let category_dir = config.artifact_dir(Taxonomy::Category);
    let category_config = distilbert::Config::load(category_dir.join(CONFIG_FILE))
        .map_err(|e| anyhow!("Unable to load config file: {}", e))?;

    let encoder = LabelEncoder::from_classes(category_config.labels);
    let evaluation = Evaluation::new(&scored, &encoder);

    let heatmap_file = config.heatmap_file();
    fs::write(&heatmap_file, heatmap::render(&evaluation.confusion)?)
        .map_err(|e| anyhow!("Unable to write {}: {}", heatmap_file.display(), e))?;

    evaluation.save_metrics(&config.metrics_file())?;

    log::info!(
        "Wrote {} and {}",
        heatmap_file.display(),
        config.metrics_file().display()
    );

    Ok(evaluation)
}
