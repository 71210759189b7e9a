use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::hf::ModelError;
use crate::rchain::provider::ProviderError;
use crate::rchain::retrieval::RagError;

/// Top-level error for every command.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Rag(#[from] RagError),
    #[error(transparent)]
    Model(#[from] ModelError),
    /// Carries the remediation text shown to the user.
    #[error("{0}")]
    BackendUnavailable(String),
    #[error("Failed to read input: {0}")]
    Input(#[from] io::Error),
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Error {
    /// Every failure exits 1; benign no-input outcomes never reach here.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
