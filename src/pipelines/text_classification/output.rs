use std::path::Path;

use serde::Deserialize;

use crate::datasets::{Taxonomy, MISSING_LABEL};

/// Predicted labels for every row of a test file, in row order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Predictions {
    /// Predicted categories
    pub category: Vec<String>,

    /// Predicted sub-categories
    pub sub_category: Vec<String>,
}

impl Predictions {
    /// The number of predicted rows
    pub fn len(&self) -> usize {
        self.category.len()
    }

    /// Whether no rows were predicted
    pub fn is_empty(&self) -> bool {
        self.category.is_empty()
    }

    /// The predictions for a taxonomy
    pub fn get(&self, taxonomy: Taxonomy) -> &[String] {
        match taxonomy {
            Taxonomy::Category => &self.category,
            Taxonomy::SubCategory => &self.sub_category,
        }
    }
}

/// Copy every column of the source table and append the two prediction columns, overwriting
/// the destination
pub fn write_predictions(
    source: &Path,
    destination: &Path,
    predictions: &Predictions,
) -> anyhow::Result<()> {
    if predictions.category.len() != predictions.sub_category.len() {
        return Err(anyhow!(
            "Got {} category predictions but {} sub-category predictions",
            predictions.category.len(),
            predictions.sub_category.len()
        ));
    }

    let mut reader = csv::Reader::from_path(source)
        .map_err(|e| anyhow!("Unable to read {}: {}", source.display(), e))?;

    let mut headers = reader.headers()?.clone();
    headers.push_field(Taxonomy::Category.prediction_column());
    headers.push_field(Taxonomy::SubCategory.prediction_column());

    let records = reader.records().collect::<Result<Vec<_>, _>>()?;

    // The destination is only touched once every row has a prediction
    if records.len() != predictions.len() {
        return Err(anyhow!(
            "{} has {} rows but {} predictions were made",
            source.display(),
            records.len(),
            predictions.len()
        ));
    }

    let mut writer = csv::Writer::from_path(destination)
        .map_err(|e| anyhow!("Unable to write {}: {}", destination.display(), e))?;

    writer.write_record(&headers)?;

    let rows = predictions.category.iter().zip(&predictions.sub_category);

    for (mut record, (category, sub_category)) in records.into_iter().zip(rows) {
        record.push_field(category);
        record.push_field(sub_category);

        writer.write_record(&record)?;
    }

    writer.flush()?;

    Ok(())
}

/// The true and predicted labels of one row of the prediction table
#[derive(Clone, Debug, Deserialize)]
struct Row {
    #[serde(default)]
    category: Option<String>,

    #[serde(default)]
    sub_category: Option<String>,

    predicted_category: String,

    predicted_subcategory: String,
}

/// True labels alongside predictions, read back from a prediction table
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scored {
    /// True labels, with missing values replaced by the missing label
    pub truth: Predictions,

    /// Predicted labels
    pub predicted: Predictions,
}

/// Read a prediction table written by [`write_predictions`]
pub fn read_predictions(path: &Path) -> anyhow::Result<Scored> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| anyhow!("Unable to read {}: {}", path.display(), e))?;

    let mut scored = Scored::default();

    for row in reader.deserialize() {
        let row: Row = row?;

        let missing = || MISSING_LABEL.to_string();

        scored
            .truth
            .category
            .push(row.category.unwrap_or_else(missing));
        scored
            .truth
            .sub_category
            .push(row.sub_category.unwrap_or_else(missing));
        scored.predicted.category.push(row.predicted_category);
        scored.predicted.sub_category.push(row.predicted_subcategory);
    }

    Ok(scored)
}
