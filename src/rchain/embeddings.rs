use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;
use crate::rchain::chat_runtime::send_once;
use crate::rchain::provider::{Provider, ProviderError, api_key_env};

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Largest `input` array the embeddings endpoint accepts per request.
pub const MAX_BATCH_INPUTS: usize = 2048;

/// Turns text into dense vectors. Implementations keep input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let provider = Provider::Openai;
        self.embed_documents(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse { provider })
    }
}

/// OpenAI embeddings client.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddings {
    model: String,
    api_key: String,
    url: String,
    batch_size: usize,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbeddings {
    /// Fails before any request when `OPENAI_API_KEY` is absent.
    pub fn new(model: impl Into<String>, settings: &Settings) -> Result<Self, ProviderError> {
        let provider = Provider::Openai;
        let key_env = api_key_env(provider);
        let api_key = settings
            .credentials
            .get(key_env)
            .ok_or(ProviderError::MissingApiKey { provider, key_env })?;

        Ok(Self {
            model: model.into(),
            api_key: api_key.to_string(),
            url: format!(
                "{}/embeddings",
                settings
                    .endpoints
                    .chat_base_url(provider)
                    .trim_end_matches('/')
            ),
            batch_size: MAX_BATCH_INPUTS,
            http: reqwest::Client::new(),
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_INPUTS);
        self
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let provider = Provider::Openai;
        let request = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            });
        let response = send_once(request, None)
            .await
            .map_err(|failure| failure.into_provider_error(provider))?;

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|source| ProviderError::Request { provider, source })?;

        let vectors = order_by_index(body.data);
        if vectors.len() != texts.len() {
            return Err(ProviderError::EmptyResponse { provider });
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbeddings {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(
            model = %self.model,
            inputs = texts.len(),
            batches = texts.len().div_ceil(self.batch_size),
            "requesting embeddings"
        );

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(batch).await?);
        }
        Ok(vectors)
    }
}

fn order_by_index(mut data: Vec<EmbeddingData>) -> Vec<Vec<f32>> {
    data.sort_by_key(|item| item.index);
    data.into_iter().map(|item| item.embedding).collect()
}
