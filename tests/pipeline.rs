use std::{fs, str::FromStr};

use burn::backend::{Autodiff, NdArray};
use cybercrime_classifier::{
    datasets::{complaints, Taxonomy},
    evaluation,
    models::distilbert::{self, DistilBertConfig},
    pipelines::text_classification::{
        fit, output::write_predictions, predict, training::save, Classifier, Config, Encoders,
        LabelEncoder, TokenizedDataset,
    },
    preprocessing::Normalizer,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokenizers::Tokenizer;

type B = NdArray<f32>;

const TRAIN: &str = "category,sub_category,crimeaditionalinfo
Online Financial Fraud,UPI Related Frauds,Money lost in a UPI fraud call!!
Hacking,Email Hacking,My bank account was HACKED
Online Financial Fraud,,Free money offered on a call
Hacking,Email Hacking,hack of my email account
";

const TEST: &str = "category,sub_category,crimeaditionalinfo
Hacking,Email Hacking,account hacked yesterday
Online Financial Fraud,UPI Related Frauds,upi fraud money
Ransomware,,
";

fn tokenizer() -> Tokenizer {
    let json = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {
                "[PAD]": 0, "[UNK]": 1, "fraud": 2, "upi": 3, "bank": 4,
                "account": 5, "hack": 6, "money": 7, "call": 8, "free": 9
            },
            "unk_token": "[UNK]"
        }
    }"#;

    Tokenizer::from_str(json).unwrap()
}

fn tiny() -> DistilBertConfig {
    DistilBertConfig::new(16, 32, 8, 2, 2, 16, 0.1, 0.2)
}

fn normalized(dataset: &complaints::Dataset) -> Vec<String> {
    Normalizer::english().normalize_all(
        dataset
            .narratives()
            .iter()
            .map(|narrative| narrative.as_deref()),
    )
}

#[test]
fn two_categories_over_three_rows_round_trip() {
    let encoder = LabelEncoder::fit(["A", "B", "A"]);

    let encoded = encoder.encode_all(["A", "B", "A"]).unwrap();

    assert_eq!(encoded[0], encoded[2]);
    assert_ne!(encoded[0], encoded[1]);
    assert!(encoded.iter().all(|&index| index < 2));

    let decoded: Vec<_> = encoded
        .iter()
        .map(|&index| encoder.decode(index).unwrap())
        .collect();
    assert_eq!(decoded, vec!["A", "B", "A"]);
}

#[test]
fn shouting_spam_normalizes_to_base_words() {
    let normalizer = Normalizer::english();

    assert_eq!(normalizer.normalize(Some("FREE MONEY!!! call now")), "free money call");
    assert_eq!(normalizer.normalize(None), "");
}

#[test]
fn train_predict_and_evaluate_end_to_end() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("train.csv"), TRAIN).unwrap();
    fs::write(dir.path().join("test.csv"), TEST).unwrap();

    let config = Config::new()
        .with_data_dir(dir.path().to_string_lossy().to_string())
        .with_batch_size(2)
        .with_num_epochs(1)
        .with_max_seq_length(8);

    let device = Default::default();

    let train = complaints::Dataset::load(config.train_file()).unwrap();
    let encoders = Encoders::fit(&train);

    assert_eq!(
        encoders.get(Taxonomy::SubCategory).classes(),
        vec!["<missing>", "Email Hacking", "UPI Related Frauds"]
    );

    let labeled = TokenizedDataset::new(
        normalized(&train),
        Some(encoders.encode(&train).unwrap()),
        tokenizer(),
        config.max_seq_length,
    )
    .unwrap();

    for taxonomy in Taxonomy::ALL {
        let model_config = distilbert::Config::new(tiny(), encoders.get(taxonomy).classes())
            .with_max_seq_length(config.max_seq_length);
        let model = model_config.init::<Autodiff<B>>(&device);

        let (model, losses) = fit(model, labeled.clone(), taxonomy, &config, &device);
        assert_eq!(losses.len(), 1);

        save(model, &model_config, &config.artifact_dir(taxonomy)).unwrap();
    }

    let category = Classifier::<B>::load(&config.artifact_dir(Taxonomy::Category), &device).unwrap();
    let sub_category =
        Classifier::<B>::load(&config.artifact_dir(Taxonomy::SubCategory), &device).unwrap();

    let test = complaints::Dataset::load(config.test_file()).unwrap();
    let unlabeled =
        TokenizedDataset::new(normalized(&test), None, tokenizer(), config.max_seq_length).unwrap();

    let first = predict(&category, &sub_category, unlabeled.clone(), 2, &device).unwrap();
    assert_eq!(first.len(), 3);

    write_predictions(&config.test_file(), &config.predictions_file(), &first).unwrap();
    let written = fs::read(config.predictions_file()).unwrap();

    // Forward-only inference is deterministic
    let second = predict(&category, &sub_category, unlabeled, 256, &device).unwrap();
    write_predictions(&config.test_file(), &config.predictions_file(), &second).unwrap();
    assert_eq!(fs::read(config.predictions_file()).unwrap(), written);

    let evaluation = evaluation::evaluate(&config).unwrap();

    assert!(config.heatmap_file().exists());
    assert!(config.metrics_file().exists());
    assert_eq!(
        evaluation.confusion.labels(),
        &["Hacking", "Online Financial Fraud", "Ransomware"]
    );
    assert_eq!(evaluation.confusion.total(), 3);
    assert!(evaluation
        .report(Taxonomy::SubCategory)
        .class("<missing>")
        .is_some());
}
