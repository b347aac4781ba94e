use burn::{
    module::Module,
    nn::{
        loss::CrossEntropyLossConfig,
        transformer::{TransformerEncoder, TransformerEncoderInput},
        Dropout, Embedding, LayerNorm, Linear,
    },
    tensor::{activation::relu, backend::Backend, Bool, Int, Tensor},
    train::ClassificationOutput,
};

use crate::pipelines::text_classification::batcher::{Infer, Train};

/// The base DistilBERT encoder
#[derive(Module, Debug)]
pub struct DistilBertModel<B: Backend> {
    /// Token embeddings
    pub word_embeddings: Embedding<B>,

    /// Learned absolute position embeddings
    pub position_embeddings: Embedding<B>,

    /// Normalizes the summed embeddings
    pub embedding_norm: LayerNorm<B>,

    /// Dropout on the normalized embeddings
    pub dropout: Dropout,

    /// The stack of post-norm transformer blocks
    pub encoder: TransformerEncoder<B>,
}

impl<B: Backend> DistilBertModel<B> {
    /// Encode a batch of token ids into hidden states: [batch_size, seq_length, dim]
    pub fn forward(&self, tokens: Tensor<B, 2, Int>, mask_pad: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let [_batch_size, seq_length] = tokens.dims();
        let device = tokens.device();

        let positions = Tensor::arange(0..seq_length as i64, &device).reshape([1, seq_length]);

        let embeddings =
            self.word_embeddings.forward(tokens) + self.position_embeddings.forward(positions);
        let embeddings = self.dropout.forward(self.embedding_norm.forward(embeddings));

        self.encoder
            .forward(TransformerEncoderInput::new(embeddings).mask_pad(mask_pad))
    }
}

/// DistilBERT for sequence classification
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    /// The base DistilBERT model
    pub distilbert: DistilBertModel<B>,

    /// Dense layer applied to the first token's hidden state
    pub pre_classifier: Linear<B>,

    /// Linear layer for sequence classification
    pub classifier: Linear<B>,

    /// Dropout between the two classification layers
    pub dropout: Dropout,

    /// Total number of classes
    pub n_classes: usize,
}

/// Define model behavior
impl<B: Backend> Model<B> {
    /// Unnormalized class scores: [batch_size, n_classes]
    pub fn logits(&self, input: Infer<B>) -> Tensor<B, 2> {
        let hidden = self.distilbert.forward(input.tokens, input.mask_pad);
        let [batch_size, _seq_length, dim] = hidden.dims();

        let pooled = hidden
            .slice([0..batch_size, 0..1, 0..dim])
            .reshape([batch_size, dim]);

        let pooled = relu(self.pre_classifier.forward(pooled));

        self.classifier.forward(self.dropout.forward(pooled))
    }

    /// Defines forward pass for training
    pub fn forward(&self, item: Train<B>) -> ClassificationOutput<B> {
        let output = self.logits(item.input);
        let targets = item.targets.to_device(&output.device());

        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), targets.clone());

        ClassificationOutput {
            loss,
            output,
            targets,
        }
    }

    /// The most likely class id for each example, in batch order
    pub fn predict(&self, input: Infer<B>) -> Vec<usize> {
        self.logits(input)
            .argmax(1)
            .into_data()
            .convert::<i64>()
            .value
            .into_iter()
            .map(|class_id| class_id as usize)
            .collect()
    }
}
