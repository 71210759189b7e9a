//! Pretrained tokenizer and sequence-classification models.

use thiserror::Error;

pub mod backend;
pub mod classifier;
pub mod hub;
pub mod tokenizer;

pub const SENTIMENT_MODEL: &str = "agentlans/multilingual-e5-small-aligned-sentiment";
pub const CLASSIFICATION_MODEL: &str = "distilbert-base-uncased-finetuned-sst-2-english";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to load model '{model}': {reason}")]
    Load { model: String, reason: String },
    #[error("Failed to save model '{model}' to '{dir}': {reason}")]
    Save {
        model: String,
        dir: String,
        reason: String,
    },
    #[error("Tokenizer '{model}' failed: {reason}")]
    Tokenizer { model: String, reason: String },
    #[error("Inference with '{model}' failed: {reason}")]
    Inference { model: String, reason: String },
}
