use std::fmt::Debug;

use burn::{
    data::dataloader,
    tensor::{backend::Backend, Bool, Int, Tensor},
};
use derive_new::new;

use crate::{
    datasets::Taxonomy,
    utils::tensors::{int_matrix, int_vector},
};

use super::dataset::Item;

/// An inference batch for text classification
#[derive(Debug, Clone, new)]
pub struct Infer<B: Backend> {
    /// Tokenized text as 2D tensor: [batch_size, max_seq_length]
    pub tokens: Tensor<B, 2, Int>,

    /// Padding mask for the tokenized text containing booleans for padding locations
    pub mask_pad: Tensor<B, 2, Bool>,

    /// Source row of each example in the batch
    pub indexes: Vec<usize>,
}

/// A training batch for text classification
#[derive(Clone, Debug, new)]
pub struct Train<B: Backend> {
    /// Model input
    pub input: Infer<B>,

    /// Class ids for the batch
    pub targets: Tensor<B, 1, Int>,
}

/// Collects tokenized complaints into inference batches
#[derive(Clone, new)]
pub struct InferBatcher<B: Backend> {
    /// Device on which to perform computation (e.g., CPU or CUDA device)
    device: B::Device,
}

/// Collects labeled tokenized complaints into training batches for one taxonomy
#[derive(Clone, new)]
pub struct TrainBatcher<B: Backend> {
    /// The taxonomy whose labels become the targets
    taxonomy: Taxonomy,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    device: B::Device,
}

fn collect_input<B: Backend>(items: &[Item], device: &B::Device) -> Infer<B> {
    let token_ids: Vec<Vec<u32>> = items.iter().map(|item| item.token_ids.clone()).collect();
    let attention: Vec<Vec<u32>> = items
        .iter()
        .map(|item| item.attention_mask.clone())
        .collect();

    let tokens = int_matrix::<B>(&token_ids, device);
    let mask_pad = int_matrix::<B>(&attention, device).equal_elem(0);

    Infer {
        tokens,
        mask_pad,
        indexes: items.iter().map(|item| item.index).collect(),
    }
}

impl<B: Backend> dataloader::batcher::Batcher<Item, Infer<B>> for InferBatcher<B> {
    fn batch(&self, items: Vec<Item>) -> Infer<B> {
        collect_input(&items, &self.device)
    }
}

impl<B: Backend> dataloader::batcher::Batcher<Item, Train<B>> for TrainBatcher<B> {
    fn batch(&self, items: Vec<Item>) -> Train<B> {
        let input = collect_input(&items, &self.device);

        let class_ids: Vec<usize> = items
            .iter()
            .map(|item| {
                item.labels
                    .expect("training items carry labels")
                    .get(self.taxonomy)
            })
            .collect();

        Train {
            input,
            targets: int_vector::<B>(&class_ids, &self.device),
        }
    }
}
