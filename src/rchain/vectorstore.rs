//! In-process similarity index over embedded chunks, backed by `ares-vector`.

use ares_vector::{Config, DistanceMetric, VectorDb};
use tracing::debug;

use crate::rchain::embeddings::Embedder;
use crate::rchain::loaders::Document;
use crate::rchain::retrieval::RagError;

const COLLECTION: &str = "documents";

#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

/// Embedded chunks for one query session. Vector ids are positions in
/// `documents`.
pub struct VectorIndex {
    db: VectorDb,
    documents: Vec<Document>,
}

impl VectorIndex {
    pub async fn from_documents(
        documents: Vec<Document>,
        embedder: &dyn Embedder,
    ) -> Result<Self, RagError> {
        if documents.is_empty() {
            return Err(RagError::EmptyCorpus("document set".to_string()));
        }

        let texts = documents
            .iter()
            .map(|document| document.content.clone())
            .collect::<Vec<_>>();
        let vectors = embedder.embed_documents(&texts).await?;
        let dimensions = vectors.first().map(Vec::len).unwrap_or_default();

        let db = VectorDb::open(Config::memory()).await?;
        db.create_collection(COLLECTION, dimensions, DistanceMetric::Cosine)
            .await?;

        let ids = (0..documents.len())
            .map(|position| position.to_string())
            .collect::<Vec<_>>();
        let inserted = db
            .insert_batch(
                COLLECTION,
                ids.iter()
                    .zip(&vectors)
                    .map(|(id, vector)| (id.as_str(), vector.as_slice(), None)),
            )
            .await?;
        debug!(inserted, dimensions, "indexed chunks");

        Ok(Self { db, documents })
    }

    /// Nearest chunks to `query`, best first.
    pub async fn similarity_search(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredDocument>, RagError> {
        let limit = k.min(self.documents.len());
        if limit == 0 {
            return Ok(Vec::new());
        }

        let hits = self.db.search(COLLECTION, query, limit).await?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let position = hit.id.parse::<usize>().ok()?;
                let document = self.documents.get(position)?.clone();
                Some(ScoredDocument {
                    document,
                    score: hit.score,
                })
            })
            .collect())
    }
}
