use std::{
    collections::BTreeSet,
    fmt::{self, Display},
};

use serde::Serialize;

/// Digits printed after the decimal point
const DIGITS: usize = 3;

/// Precision, recall and F1 for one class
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassMetrics {
    /// The class label
    pub label: String,

    /// Correct predictions of the class over all predictions of the class
    pub precision: f64,

    /// Correct predictions of the class over all true members of the class
    pub recall: f64,

    /// Harmonic mean of precision and recall
    pub f1_score: f64,

    /// Number of true members of the class
    pub support: usize,
}

/// An averaged row of the report
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Average {
    /// Averaged precision
    pub precision: f64,
    /// Averaged recall
    pub recall: f64,
    /// Averaged F1 score
    pub f1_score: f64,
    /// Number of rows scored
    pub support: usize,
}

/// Per-class precision, recall, F1 and support with accuracy and averages.
///
/// Classes are the sorted union of true and predicted labels. A ratio with a zero
/// denominator is reported as 0.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// One entry per class, in label order
    pub classes: Vec<ClassMetrics>,

    /// Fraction of rows predicted correctly
    pub accuracy: f64,

    /// Unweighted mean over classes
    pub macro_avg: Average,

    /// Mean over classes weighted by support
    pub weighted_avg: Average,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl ClassificationReport {
    /// Score predictions against true labels, pairing them by position
    pub fn new(truth: &[String], predicted: &[String]) -> Self {
        let labels: BTreeSet<&str> = truth
            .iter()
            .chain(predicted)
            .map(String::as_str)
            .collect();

        let pairs: Vec<(&str, &str)> = truth
            .iter()
            .zip(predicted)
            .map(|(truth, predicted)| (truth.as_str(), predicted.as_str()))
            .collect();

        let classes: Vec<ClassMetrics> = labels
            .into_iter()
            .map(|label| {
                let true_positives = pairs
                    .iter()
                    .filter(|(truth, predicted)| *truth == label && *predicted == label)
                    .count();
                let support = pairs.iter().filter(|(truth, _)| *truth == label).count();
                let predictions = pairs
                    .iter()
                    .filter(|(_, predicted)| *predicted == label)
                    .count();

                let precision = ratio(true_positives, predictions);
                let recall = ratio(true_positives, support);
                let f1_score = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };

                ClassMetrics {
                    label: label.to_string(),
                    precision,
                    recall,
                    f1_score,
                    support,
                }
            })
            .collect();

        let correct = pairs
            .iter()
            .filter(|(truth, predicted)| truth == predicted)
            .count();

        let total: usize = classes.iter().map(|class| class.support).sum();
        let num_classes = classes.len().max(1) as f64;

        let macro_avg = Average {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / num_classes,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / num_classes,
            f1_score: classes.iter().map(|c| c.f1_score).sum::<f64>() / num_classes,
            support: total,
        };

        let weighted = |metric: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                return 0.0;
            }

            classes
                .iter()
                .map(|class| metric(class) * class.support as f64)
                .sum::<f64>()
                / total as f64
        };

        let weighted_avg = Average {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1_score: weighted(|c| c.f1_score),
            support: total,
        };

        Self {
            accuracy: ratio(correct, pairs.len()),
            classes,
            macro_avg,
            weighted_avg,
        }
    }

    /// The metrics of a class, if it appeared in the truth or the predictions
    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|class| class.label == label)
    }
}

impl Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|class| class.label.len())
            .chain(["weighted avg".len(), DIGITS])
            .max()
            .unwrap_or_default();

        write!(f, "{:>width$} ", "")?;
        for header in ["precision", "recall", "f1-score", "support"] {
            write!(f, " {:>9}", header)?;
        }
        writeln!(f)?;
        writeln!(f)?;

        let row = |f: &mut fmt::Formatter<'_>,
                   name: &str,
                   precision: f64,
                   recall: f64,
                   f1_score: f64,
                   support: usize| {
            writeln!(
                f,
                "{:>width$}  {:>9.DIGITS$} {:>9.DIGITS$} {:>9.DIGITS$} {:>9}",
                name, precision, recall, f1_score, support
            )
        };

        for class in &self.classes {
            row(
                f,
                &class.label,
                class.precision,
                class.recall,
                class.f1_score,
                class.support,
            )?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.DIGITS$} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;

        for (name, average) in [
            ("macro avg", &self.macro_avg),
            ("weighted avg", &self.weighted_avg),
        ] {
            row(
                f,
                name,
                average.precision,
                average.recall,
                average.f1_score,
                average.support,
            )?;
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

    fn close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "{actual} != {expected}"
        );
    }

    fn report() -> ClassificationReport {
        ClassificationReport::new(&labels(&["A", "A", "B", "C"]), &labels(&["A", "B", "B", "A"]))
    }

    #[test]
    fn matches_hand_computed_metrics() {
        let report = report();

        let a = report.class("A").unwrap();
        close(a.precision, 0.5);
        close(a.recall, 0.5);
        close(a.f1_score, 0.5);
        assert_eq!(a.support, 2);

        let b = report.class("B").unwrap();
        close(b.precision, 0.5);
        close(b.recall, 1.0);
        close(b.f1_score, 2.0 / 3.0);

        // Never predicted: zero division yields 0
        let c = report.class("C").unwrap();
        close(c.precision, 0.0);
        close(c.f1_score, 0.0);

        close(report.accuracy, 0.5);
        close(report.macro_avg.precision, 1.0 / 3.0);
        close(report.macro_avg.recall, 0.5);
        close(report.macro_avg.f1_score, (0.5 + 2.0 / 3.0) / 3.0);
        close(report.weighted_avg.precision, 0.375);
        close(report.weighted_avg.recall, 0.5);
        close(report.weighted_avg.f1_score, (1.0 + 2.0 / 3.0) / 4.0);
        assert_eq!(report.weighted_avg.support, 4);
    }

    #[test]
    fn labels_are_the_sorted_union_of_truth_and_predictions() {
        let report = ClassificationReport::new(&labels(&["b", "c"]), &labels(&["a", "c"]));

        let names: Vec<_> = report.classes.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let a = report.class("a").unwrap();
        assert_eq!(a.support, 0);
        close(a.recall, 0.0);
    }

    #[test]
    fn prints_three_digit_rows() {
        let text = report().to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "              precision    recall  f1-score   support"
        );
        assert_eq!(lines[1], "");
        assert_eq!(
            lines[2],
            "           A      0.500     0.500     0.500         2"
        );
        assert_eq!(
            lines[6],
            format!("    accuracy {}     0.500         4", " ".repeat(20))
        );
        assert_eq!(
            lines[8],
            "weighted avg      0.375     0.500     0.417         4"
        );
    }
}
