use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::datasets::{complaints, Taxonomy};

use super::dataset::Labels;

/// Maps each distinct class label to a dense index and back. Classes are kept in ascending
/// order, so index `i` is the `i`-th smallest label seen at fit time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LabelEncoder {
    /// A mapping from class ids to class name labels
    id2label: BTreeMap<usize, String>,

    /// A mapping from class name labels to class ids
    label2id: BTreeMap<String, usize>,
}

impl LabelEncoder {
    /// Records the sorted set of distinct labels as the index space
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: BTreeSet<String> = labels
            .into_iter()
            .map(|label| label.as_ref().to_string())
            .collect();

        let id2label: BTreeMap<usize, String> = classes.into_iter().enumerate().collect();
        let label2id = id2label
            .iter()
            .map(|(&id, label)| (label.clone(), id))
            .collect();

        Self { id2label, label2id }
    }

    /// Rebuilds an encoder from a persisted class list
    pub fn from_classes(classes: Vec<String>) -> Self {
        Self::fit(classes)
    }

    /// Returns the index of a fitted label
    pub fn encode(&self, label: &str) -> Result<usize, LabelError> {
        self.label2id
            .get(label)
            .copied()
            .ok_or_else(|| LabelError::Unknown(label.to_string()))
    }

    /// Encodes every label, failing on the first one outside the fitted set
    pub fn encode_all<I, S>(&self, labels: I) -> Result<Vec<usize>, LabelError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels
            .into_iter()
            .map(|label| self.encode(label.as_ref()))
            .collect()
    }

    /// Returns the label for a class index
    pub fn decode(&self, index: usize) -> Result<&str, LabelError> {
        self.id2label
            .get(&index)
            .map(String::as_str)
            .ok_or(LabelError::OutOfRange {
                index,
                num_classes: self.id2label.len(),
            })
    }

    /// Whether the label was seen at fit time
    pub fn contains(&self, label: &str) -> bool {
        self.label2id.contains_key(label)
    }

    /// The fitted classes, ordered by index
    pub fn classes(&self) -> Vec<String> {
        self.id2label.values().cloned().collect()
    }

    /// The number of classes
    pub fn len(&self) -> usize {
        self.id2label.len()
    }

    /// Whether the encoder has no classes
    pub fn is_empty(&self) -> bool {
        self.id2label.is_empty()
    }
}

impl From<Vec<String>> for LabelEncoder {
    fn from(classes: Vec<String>) -> Self {
        Self::from_classes(classes)
    }
}

impl From<LabelEncoder> for Vec<String> {
    fn from(encoder: LabelEncoder) -> Self {
        encoder.classes()
    }
}

/// Label Error
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum LabelError {
    /// The label was not part of the fitted set
    #[error("label {0:?} was not seen when the encoder was fitted")]
    Unknown(String),

    /// The index is not a valid class id
    #[error("class index {index} is out of range for {num_classes} classes")]
    OutOfRange {
        /// The requested index
        index: usize,

        /// The number of fitted classes
        num_classes: usize,
    },
}

/// One fitted encoder per taxonomy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Encoders {
    /// Encoder for the `category` column
    pub category: LabelEncoder,

    /// Encoder for the `sub_category` column
    pub sub_category: LabelEncoder,
}

impl Encoders {
    /// Fit both encoders on the labels of a training file
    pub fn fit(dataset: &complaints::Dataset) -> Self {
        Self {
            category: LabelEncoder::fit(dataset.labels(Taxonomy::Category)),
            sub_category: LabelEncoder::fit(dataset.labels(Taxonomy::SubCategory)),
        }
    }

    /// The encoder for a taxonomy
    pub fn get(&self, taxonomy: Taxonomy) -> &LabelEncoder {
        match taxonomy {
            Taxonomy::Category => &self.category,
            Taxonomy::SubCategory => &self.sub_category,
        }
    }

    /// Encode the label pair of every row, in file order
    pub fn encode(&self, dataset: &complaints::Dataset) -> Result<Vec<Labels>, LabelError> {
        let categories = self
            .category
            .encode_all(dataset.labels(Taxonomy::Category))?;
        let sub_categories = self
            .sub_category
            .encode_all(dataset.labels(Taxonomy::SubCategory))?;

        Ok(categories
            .into_iter()
            .zip(sub_categories)
            .map(|(category, sub_category)| Labels::new(category, sub_category))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn fit_sorts_and_deduplicates() {
        let encoder = LabelEncoder::fit(["Ransomware", "Cyber Terrorism", "Ransomware"]);

        assert_eq!(encoder.classes(), vec!["Cyber Terrorism", "Ransomware"]);
        assert_eq!(encoder.encode("Cyber Terrorism"), Ok(0));
        assert_eq!(encoder.encode("Ransomware"), Ok(1));
    }

    #[test]
    fn two_categories_over_three_rows() {
        let encoder = LabelEncoder::fit(["B", "A", "B"]);

        let a = encoder.encode("A").unwrap();
        let b = encoder.encode("B").unwrap();

        assert_ne!(a, b);
        assert!(a < 2 && b < 2);
        assert_eq!(encoder.decode(a), Ok("A"));
        assert_eq!(encoder.decode(b), Ok("B"));
    }

    #[test]
    fn decode_inverts_encode() {
        let labels = [
            "Online Financial Fraud",
            "Online and Social Media Related Crime",
            "Any Other Cyber Crime",
            "Cryptocurrency Crime",
            "Report Unlawful Content",
        ];
        let encoder = LabelEncoder::fit(labels);

        for label in labels {
            let index = encoder.encode(label).unwrap();
            assert_eq!(encoder.decode(index).unwrap(), label);
        }
    }

    #[test]
    fn unseen_labels_and_indexes_are_errors() {
        let encoder = LabelEncoder::fit(["A", "B"]);

        assert_eq!(
            encoder.encode("C"),
            Err(LabelError::Unknown("C".to_string()))
        );
        assert_eq!(
            encoder.decode(2),
            Err(LabelError::OutOfRange {
                index: 2,
                num_classes: 2
            })
        );
        assert!(encoder.encode_all(["A", "C"]).is_err());
    }

    #[test]
    fn serializes_as_class_list() {
        let encoder = LabelEncoder::fit(["beta", "alpha"]);

        let json = serde_json::to_string(&encoder).unwrap();
        assert_eq!(json, r#"["alpha","beta"]"#);

        let restored: LabelEncoder = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, encoder);
    }

    #[test]
    fn encoders_fit_each_taxonomy_with_missing_labels() {
        let dataset = complaints::Dataset::from_items(vec![
            complaints::Item::new(
                Some("upi fraud".to_string()),
                Some("Online Financial Fraud".to_string()),
                Some("UPI Related Frauds".to_string()),
            ),
            complaints::Item::new(
                Some("hacked account".to_string()),
                Some("Hacking".to_string()),
                None,
            ),
        ]);

        let encoders = Encoders::fit(&dataset);

        assert_eq!(
            encoders.get(Taxonomy::Category).classes(),
            vec!["Hacking", "Online Financial Fraud"]
        );
        assert_eq!(
            encoders.get(Taxonomy::SubCategory).classes(),
            vec!["<missing>", "UPI Related Frauds"]
        );
        assert_eq!(
            encoders.encode(&dataset).unwrap(),
            vec![Labels::new(1, 1), Labels::new(0, 0)]
        );
    }
}
