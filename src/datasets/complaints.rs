use std::{fmt::Display, path::Path};

use burn::data::dataset::{self, Dataset as _, InMemDataset};
use derive_new::new;
use serde::{Deserialize, Serialize};

/// The label used for rows whose class is missing from the source file
pub static MISSING_LABEL: &str = "<missing>";

/// A single complaint as it appears in the train or test CSV
#[derive(Clone, Debug, Serialize, Deserialize, new)]
pub struct Item {
    /// The free-text narrative of the complaint
    #[serde(rename = "crimeaditionalinfo", default)]
    pub narrative: Option<String>,

    /// The top-level crime category
    #[serde(default)]
    pub category: Option<String>,

    /// The finer-grained crime sub-category
    #[serde(default)]
    pub sub_category: Option<String>,
}

/// The two label taxonomies a complaint is classified under
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Taxonomy {
    /// Top-level crime category
    Category,

    /// Crime sub-category
    SubCategory,
}

impl Taxonomy {
    /// Every taxonomy, in training order
    pub const ALL: [Taxonomy; 2] = [Taxonomy::Category, Taxonomy::SubCategory];

    /// Returns the item's label for this taxonomy, if present
    pub fn label<'a>(&self, item: &'a Item) -> Option<&'a str> {
        match self {
            Taxonomy::Category => item.category.as_deref(),
            Taxonomy::SubCategory => item.sub_category.as_deref(),
        }
    }

    /// The directory name the fine-tuned model for this taxonomy is saved under
    pub fn artifact_name(&self) -> &'static str {
        match self {
            Taxonomy::Category => "category_classifier",
            Taxonomy::SubCategory => "subcategory_classifier",
        }
    }

    /// The column holding this taxonomy's predictions in the output table
    pub fn prediction_column(&self) -> &'static str {
        match self {
            Taxonomy::Category => "predicted_category",
            Taxonomy::SubCategory => "predicted_subcategory",
        }
    }
}

impl TryFrom<&str> for Taxonomy {
    type Error = TaxonomyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().replace('_', "-").as_str() {
            "category" => Ok(Taxonomy::Category),
            "sub-category" | "subcategory" => Ok(Taxonomy::SubCategory),
            _ => Err(TaxonomyError::Unknown(value.to_string())),
        }
    }
}

impl Display for Taxonomy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Taxonomy::Category => "category",
            Taxonomy::SubCategory => "sub-category",
        };

        write!(f, "{}", name)
    }
}

/// Taxonomy Error
#[derive(thiserror::Error, Debug)]
pub enum TaxonomyError {
    /// No taxonomy found for the given string
    #[error("no taxonomy found for {0}")]
    Unknown(String),
}

/// Struct for a complaints CSV file
pub struct Dataset {
    /// Underlying In-Memory dataset
    dataset: InMemDataset<Item>,
}

/// Implement the Dataset trait for the complaints dataset
impl dataset::Dataset<Item> for Dataset {
    /// Returns a specific item from the dataset
    fn get(&self, index: usize) -> Option<Item> {
        self.dataset.get(index)
    }

    /// Returns the length of the dataset
    fn len(&self) -> usize {
        self.dataset.len()
    }
}

impl Dataset {
    /// Loads a complaints CSV file
    pub fn load<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let reader = csv::ReaderBuilder::new();

        let dataset: InMemDataset<Item> = InMemDataset::from_csv(path, &reader)?;

        Ok(Self { dataset })
    }

    /// Builds a dataset from items already in memory
    pub fn from_items(items: Vec<Item>) -> Self {
        Self {
            dataset: InMemDataset::new(items),
        }
    }

    /// The narrative of every row, in file order
    pub fn narratives(&self) -> Vec<Option<String>> {
        self.dataset.iter().map(|item| item.narrative).collect()
    }

    /// The label of every row for a taxonomy, in file order. Missing labels become
    /// [`MISSING_LABEL`].
    pub fn labels(&self, taxonomy: Taxonomy) -> Vec<String> {
        self.dataset
            .iter()
            .map(|item| {
                taxonomy
                    .label(&item)
                    .map(str::to_string)
                    .unwrap_or_else(|| MISSING_LABEL.to_string())
            })
            .collect()
    }

    /// Whether at least one row carries a label for the taxonomy
    pub fn has_labels(&self, taxonomy: Taxonomy) -> bool {
        self.dataset
            .iter()
            .any(|item| taxonomy.label(&item).is_some())
    }
}
