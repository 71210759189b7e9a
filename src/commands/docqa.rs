//! Question answering over a local text document.

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use crate::commands::{CallDefaults, ModelArgs};
use crate::config::Settings;
use crate::error::Result;
use crate::rchain::embeddings::{DEFAULT_EMBEDDING_MODEL, Embedder, OpenAiEmbeddings};
use crate::rchain::loaders::{Document, load_text_file};
use crate::rchain::provider::{AskOptions, ChatModel};
use crate::rchain::retrieval::{ConversationalRetrieval, DEFAULT_K, RagError, RetrievalAnswer};
use crate::rchain::splitter::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, split_documents};
use crate::rchain::vectorstore::VectorIndex;

pub const DEFAULT_DOCUMENT: &str = "sample_docs/sample.txt";
pub const DEFAULT_QUESTION: &str = "Summarize the content of the document.";

const DEFAULTS: CallDefaults = CallDefaults {
    temperature: 0.0,
    max_tokens: None,
};

#[derive(Debug, Clone, Args)]
pub struct DocQaArgs {
    /// Question about the document
    #[arg(default_value = DEFAULT_QUESTION)]
    pub question: String,
    /// Text file to index [default: the bundled sample_docs/sample.txt]
    #[arg(long)]
    pub file: Option<PathBuf>,
    #[command(flatten)]
    pub model: ModelArgs,
    /// Chunks retrieved per question
    #[arg(short = 'k', long, default_value_t = DEFAULT_K)]
    pub top_k: usize,
    /// Print the chunks the answer was built from
    #[arg(long)]
    pub show_sources: bool,
}

/// The given file, or the bundled sample. A `sample_docs/sample.txt` in the
/// working directory takes precedence over the one shipped with the crate.
pub fn document_path(file: Option<PathBuf>) -> PathBuf {
    if let Some(file) = file {
        return file;
    }
    let local = Path::new(DEFAULT_DOCUMENT);
    if local.is_file() {
        return local.to_path_buf();
    }
    Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_DOCUMENT)
}

/// Splits, embeds and indexes `documents`, then asks one question.
pub async fn answer_from_documents(
    chat: &dyn ChatModel,
    embedder: &dyn Embedder,
    documents: &[Document],
    question: &str,
    options: AskOptions,
    top_k: usize,
) -> Result<RetrievalAnswer, RagError> {
    let chunks = split_documents(documents, DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)?;
    info!(
        documents = documents.len(),
        chunks = chunks.len(),
        "split documents"
    );
    let index = VectorIndex::from_documents(chunks, embedder).await?;
    let mut chain = ConversationalRetrieval::new(chat, embedder, index, options).with_k(top_k);
    chain.ask(question).await
}

pub fn print_sources(answer: &RetrievalAnswer) {
    for (position, hit) in answer.sources.iter().enumerate() {
        println!(
            "--- source {} ({}, score {:.3}) ---",
            position + 1,
            hit.document.source,
            hit.score
        );
        println!("{}", hit.document.content.trim());
    }
}

pub async fn run(args: DocQaArgs, settings: &Settings) -> Result<()> {
    let choice = args.model.resolve(DEFAULTS)?;
    let chat = choice.client(settings)?;
    let embedder = OpenAiEmbeddings::new(DEFAULT_EMBEDDING_MODEL, settings)?;

    let question = match args.question.trim() {
        "" => DEFAULT_QUESTION,
        question => question,
    };
    let documents = load_text_file(&document_path(args.file))?;
    let answer = answer_from_documents(
        &chat,
        &embedder,
        &documents,
        question,
        choice.options,
        args.top_k,
    )
    .await?;

    println!("Response: {}", answer.answer);
    if args.show_sources {
        print_sources(&answer);
    }
    Ok(())
}
