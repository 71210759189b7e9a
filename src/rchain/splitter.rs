use text_splitter::{ChunkConfig, TextSplitter};

use crate::rchain::loaders::Document;
use crate::rchain::retrieval::RagError;

pub const DEFAULT_CHUNK_SIZE: usize = 1_000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Splits each document into character-sized chunks with a fixed overlap.
/// Chunks keep the source of the document they came from.
pub fn split_documents(
    documents: &[Document],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<Document>, RagError> {
    let config = ChunkConfig::new(chunk_size)
        .with_overlap(chunk_overlap)
        .map_err(|err| RagError::Split(err.to_string()))?;
    let splitter = TextSplitter::new(config);

    Ok(documents
        .iter()
        .flat_map(|document| {
            splitter
                .chunks(&document.content)
                .map(|chunk| Document::new(chunk, document.source.clone()))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_documents_stay_whole() {
        let docs = vec![Document::new("Rust 101 starts in May.", "sample.txt")];
        let chunks = split_documents(&docs, DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
            .expect("valid config");
        assert_eq!(chunks, docs);
    }

    #[test]
    fn long_documents_are_bounded_and_cover_the_text() {
        let sentence = "Each course runs for six weeks and ends with a project. ";
        let text = sentence.repeat(60);
        let docs = vec![Document::new(text.clone(), "long.txt")];

        let chunks = split_documents(&docs, 200, 50).expect("valid config");

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|chunk| chunk.content.chars().count() <= 200));
        assert!(chunks.iter().all(|chunk| chunk.source == "long.txt"));
        assert!(text.trim_end().ends_with(chunks.last().map(|c| c.content.as_str()).unwrap_or("")));
    }

    #[test]
    fn overlap_larger_than_chunk_is_rejected() {
        let docs = vec![Document::new("text", "a")];
        let err = split_documents(&docs, 100, 200).expect_err("invalid overlap");
        assert!(matches!(err, RagError::Split(_)));
    }
}
