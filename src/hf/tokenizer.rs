use std::path::Path;

use serde::Serialize;
use tokenizers::{Encoding, PaddingParams, Tokenizer, TruncationParams};

use crate::hf::ModelError;
use crate::hf::hub::ModelFiles;

/// A pretrained tokenizer with truncation and padding enabled.
pub struct TextTokenizer {
    name: String,
    inner: Tokenizer,
}

/// The tensors a model consumes for one input, as printed by `tokenize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedText {
    pub input_ids: Vec<u32>,
    pub token_type_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
}

impl From<&Encoding> for EncodedText {
    fn from(encoding: &Encoding) -> Self {
        Self {
            input_ids: encoding.get_ids().to_vec(),
            token_type_ids: encoding.get_type_ids().to_vec(),
            attention_mask: encoding.get_attention_mask().to_vec(),
        }
    }
}

impl TextTokenizer {
    pub fn from_file(path: &Path, name: impl Into<String>) -> Result<Self, ModelError> {
        let name = name.into();
        let mut inner = Tokenizer::from_file(path).map_err(|err| ModelError::Load {
            model: name.clone(),
            reason: err.to_string(),
        })?;

        inner
            .with_truncation(Some(TruncationParams::default()))
            .map_err(|err| ModelError::Tokenizer {
                model: name.clone(),
                reason: err.to_string(),
            })?;
        if inner.get_padding().is_none() {
            let mut padding = PaddingParams::default();
            if let Some(id) = inner.token_to_id(&padding.pad_token) {
                padding.pad_id = id;
            }
            inner.with_padding(Some(padding));
        }

        Ok(Self { name, inner })
    }

    pub fn from_files(files: &ModelFiles) -> Result<Self, ModelError> {
        Self::from_file(&files.tokenizer, files.origin.clone())
    }

    /// Size of the model vocabulary, excluding added tokens.
    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(false)
    }

    pub fn encode(&self, text: &str) -> Result<Encoding, ModelError> {
        self.inner
            .encode(text, true)
            .map_err(|err| self.tokenizer_error(err))
    }

    pub fn input_ids(&self, text: &str) -> Result<Vec<u32>, ModelError> {
        Ok(self.encode(text)?.get_ids().to_vec())
    }

    /// Decodes a batch of id sequences, dropping special tokens.
    pub fn detokenize(&self, batch: &[Vec<u32>]) -> Result<Vec<String>, ModelError> {
        let sequences = batch.iter().map(Vec::as_slice).collect::<Vec<_>>();
        self.inner
            .decode_batch(&sequences, true)
            .map_err(|err| self.tokenizer_error(err))
    }

    fn tokenizer_error(&self, err: tokenizers::Error) -> ModelError {
        ModelError::Tokenizer {
            model: self.name.clone(),
            reason: err.to_string(),
        }
    }
}
