use std::sync::Arc;

use burn::data::dataset::Dataset;
use derive_new::new;
use tokenizers::{
    PaddingDirection, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams,
};

use crate::datasets::Taxonomy;

/// The label indexes of a single complaint, one per taxonomy
#[derive(Clone, Copy, Debug, PartialEq, Eq, new)]
pub struct Labels {
    /// Index into the category encoder
    pub category: usize,

    /// Index into the sub-category encoder
    pub sub_category: usize,
}

impl Labels {
    /// The index for the given taxonomy
    pub fn get(&self, taxonomy: Taxonomy) -> usize {
        match taxonomy {
            Taxonomy::Category => self.category,
            Taxonomy::SubCategory => self.sub_category,
        }
    }
}

/// A fixed-length tokenized complaint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    /// The position of the complaint in its source file
    pub index: usize,

    /// Subword token ids, truncated or padded to the max sequence length
    pub token_ids: Vec<u32>,

    /// 1 for real tokens, 0 for padding
    pub attention_mask: Vec<u32>,

    /// Label indexes, when the dataset was built with labels
    pub labels: Option<Labels>,
}

/// Normalized complaint text that is tokenized on every access
#[derive(Clone)]
pub struct TokenizedDataset {
    /// Normalized narratives
    texts: Arc<Vec<String>>,

    /// Label indexes aligned with `texts`, absent for inference
    labels: Option<Arc<Vec<Labels>>>,

    /// Subword tokenizer configured for fixed-length output
    tokenizer: Arc<Tokenizer>,
}

impl TokenizedDataset {
    /// Wraps normalized texts and optional labels. The tokenizer is reconfigured to truncate
    /// and pad every sequence to exactly `max_seq_length` tokens.
    pub fn new(
        texts: Vec<String>,
        labels: Option<Vec<Labels>>,
        mut tokenizer: Tokenizer,
        max_seq_length: usize,
    ) -> anyhow::Result<Self> {
        if let Some(labels) = &labels {
            if labels.len() != texts.len() {
                return Err(anyhow!(
                    "Expected {} label pairs to match the texts, found {}",
                    texts.len(),
                    labels.len()
                ));
            }
        }

        let pad_id = tokenizer.token_to_id(PAD_TOKEN).unwrap_or(0);

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_seq_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Unable to configure truncation: {}", e))?;

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_seq_length),
            direction: PaddingDirection::Right,
            pad_id,
            pad_token: PAD_TOKEN.to_string(),
            ..Default::default()
        }));

        Ok(Self {
            texts: Arc::new(texts),
            labels: labels.map(Arc::new),
            tokenizer: Arc::new(tokenizer),
        })
    }

    /// Tokenizes the text at the given position
    pub fn encode(&self, index: usize) -> anyhow::Result<Item> {
        let text = self
            .texts
            .get(index)
            .ok_or_else(|| anyhow!("No text at position {}", index))?;

        let encoding = self
            .tokenizer
            .encode(text.as_str(), true)
            .map_err(|e| anyhow!("Unable to encode text at position {}: {}", index, e))?;

        let labels = self
            .labels
            .as_ref()
            .and_then(|labels| labels.get(index).copied());

        Ok(Item {
            index,
            token_ids: encoding.get_ids().to_vec(),
            attention_mask: encoding.get_attention_mask().to_vec(),
            labels,
        })
    }
}

/// The padding token of the BERT family of tokenizers
pub static PAD_TOKEN: &str = "[PAD]";

impl Dataset<Item> for TokenizedDataset {
    fn get(&self, index: usize) -> Option<Item> {
        if index >= self.texts.len() {
            return None;
        }

        // Tokenizer failures have no recovery path, so they abort the loader thread
        let item = self
            .encode(index)
            .unwrap_or_else(|e| panic!("Unable to tokenize narrative {}: {}", index, e));

        Some(item)
    }

    fn len(&self) -> usize {
        self.texts.len()
    }
}
