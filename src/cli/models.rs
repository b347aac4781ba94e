use std::fmt::Display;

use crate::models::distilbert;

/// Available Models
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Model {
    /// The DistilBERT family of models, with the specific model name contained within
    DistilBert(String),
}

impl Model {
    /// Get the model type
    pub fn model_type(&self) -> &str {
        match self {
            Model::DistilBert(_) => "distilbert",
        }
    }

    /// The Hugging Face Hub name of the pretrained checkpoint
    pub fn name(&self) -> &str {
        let Model::DistilBert(name) = self;

        name
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::DistilBert(distilbert::DEFAULT_MODEL.to_string())
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl TryFrom<&str> for Model {
    type Error = ModelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if distilbert::MODELS.contains(&value) {
            Ok(Model::DistilBert(value.to_string()))
        } else {
            Err(ModelError::Unknown(value.to_string()))
        }
    }
}

/// Model Error
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    /// No model found for the given string
    #[error("no model found for {0}")]
    Unknown(String),
}
