use std::{
    collections::{BTreeSet, HashMap},
    fmt::{self, Display},
};

use crate::pipelines::text_classification::labels::LabelEncoder;

/// Counts of (true label, predicted label) pairs over a fixed label axis
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfusionMatrix {
    /// Row and column labels, in axis order
    labels: Vec<String>,

    /// `counts[row][column]` is the number of rows with true label `labels[row]` predicted as
    /// `labels[column]`
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// The axis for a taxonomy: the encoder's classes in index order, followed by any other
    /// label seen in the truth or the predictions, sorted
    pub fn axis(encoder: &LabelEncoder, truth: &[String], predicted: &[String]) -> Vec<String> {
        let unseen: BTreeSet<&String> = truth
            .iter()
            .chain(predicted)
            .filter(|label| !encoder.contains(label))
            .collect();

        encoder
            .classes()
            .into_iter()
            .chain(unseen.into_iter().cloned())
            .collect()
    }

    /// Count label pairs by position. Pairs with a label outside the axis are not counted.
    pub fn new(labels: Vec<String>, truth: &[String], predicted: &[String]) -> Self {
        let index: HashMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.as_str(), i))
            .collect();

        let mut counts = vec![vec![0; labels.len()]; labels.len()];

        for (truth, predicted) in truth.iter().zip(predicted) {
            if let (Some(&row), Some(&column)) =
                (index.get(truth.as_str()), index.get(predicted.as_str()))
            {
                counts[row][column] += 1;
            }
        }

        Self { labels, counts }
    }

    /// Row and column labels
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Rows of counts, one per true label
    pub fn counts(&self) -> &[Vec<usize>] {
        &self.counts
    }

    /// The count for a pair of labels
    pub fn get(&self, truth: &str, predicted: &str) -> Option<usize> {
        let row = self.labels.iter().position(|label| label == truth)?;
        let column = self.labels.iter().position(|label| label == predicted)?;

        Some(self.counts[row][column])
    }

    /// The largest count
    pub fn max(&self) -> usize {
        self.counts
            .iter()
            .flatten()
            .copied()
            .max()
            .unwrap_or_default()
    }

    /// The total number of counted pairs
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

/// Rows are true labels; columns are numbered in the same order as the rows
impl Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_width = self
            .labels
            .iter()
            .map(String::len)
            .max()
            .unwrap_or_default();
        let cell_width = self
            .max()
            .to_string()
            .len()
            .max(self.labels.len().to_string().len())
            .max(3);
        let index_width = self.labels.len().to_string().len();

        write!(f, "{:>index_width$} {:<label_width$} |", "", "")?;
        for column in 0..self.labels.len() {
            write!(f, " {:>cell_width$}", column)?;
        }
        writeln!(f)?;

        for (row, (label, counts)) in self.labels.iter().zip(&self.counts).enumerate() {
            write!(f, "{:>index_width$} {:<label_width$} |", row, label)?;
            for count in counts {
                write!(f, " {:>cell_width$}", count)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn axis_follows_the_encoder_then_sorted_unseen_labels() {
        let encoder = LabelEncoder::fit(["Hacking", "Online Financial Fraud"]);
        let truth = labels(&["Ransomware", "Hacking", "<missing>"]);
        let predicted = labels(&["Hacking", "Online Financial Fraud", "Hacking"]);

        assert_eq!(
            ConfusionMatrix::axis(&encoder, &truth, &predicted),
            labels(&["Hacking", "Online Financial Fraud", "<missing>", "Ransomware"])
        );
    }

    #[test]
    fn counts_pairs_by_position() {
        let truth = labels(&["A", "A", "B", "C"]);
        let predicted = labels(&["A", "B", "B", "A"]);

        let matrix = ConfusionMatrix::new(labels(&["A", "B", "C"]), &truth, &predicted);

        assert_eq!(
            matrix.counts(),
            &[vec![1, 1, 0], vec![0, 1, 0], vec![1, 0, 0]]
        );
        assert_eq!(matrix.get("C", "A"), Some(1));
        assert_eq!(matrix.get("D", "A"), None);
        assert_eq!(matrix.max(), 1);
        assert_eq!(matrix.total(), 4);
    }

    #[test]
    fn prints_a_text_table() {
        let matrix = ConfusionMatrix::new(
            labels(&["A", "Bee"]),
            &labels(&["A", "Bee", "Bee"]),
            &labels(&["A", "Bee", "A"]),
        );

        assert_eq!(
            matrix.to_string(),
            "      |   0   1\n\
             0 A   |   1   0\n\
             1 Bee |   1   1\n"
        );
    }
}
