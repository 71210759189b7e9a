//! Conversational retrieval over an embedded document set.
//!
//! A question is embedded, the nearest chunks are "stuffed" into the system
//! prompt and the chat model answers from them. Previous turns are kept in a
//! [`ChatHistory`]; when it is non-empty a follow-up question is first
//! rewritten into a standalone one.

use thiserror::Error;
use tracing::debug;

use crate::adapter::normalize_text;
use crate::rchain::embeddings::Embedder;
use crate::rchain::prompts;
use crate::rchain::provider::{AskOptions, ChatModel, ProviderError};
use crate::rchain::vectorstore::{ScoredDocument, VectorIndex};

/// Chunks handed to the model per question.
pub const DEFAULT_K: usize = 4;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("Failed to load '{source_name}': {reason}")]
    Load { source_name: String, reason: String },
    #[error("No text could be loaded from {0}")]
    EmptyCorpus(String),
    #[error("Invalid chunk configuration: {0}")]
    Split(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("Vector index error: {0}")]
    Index(#[from] ares_vector::Error),
}

/// Buffer memory of completed question/answer turns.
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    turns: Vec<(String, String)>,
}

impl ChatHistory {
    pub fn push(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push((question.into(), answer.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|(question, answer)| format!("Human: {question}\nAssistant: {answer}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalAnswer {
    pub answer: String,
    /// The question actually used for retrieval.
    pub standalone_question: String,
    pub sources: Vec<ScoredDocument>,
}

pub struct ConversationalRetrieval<'a> {
    chat: &'a dyn ChatModel,
    embedder: &'a dyn Embedder,
    index: VectorIndex,
    options: AskOptions,
    k: usize,
    memory: ChatHistory,
}

impl<'a> ConversationalRetrieval<'a> {
    pub fn new(
        chat: &'a dyn ChatModel,
        embedder: &'a dyn Embedder,
        index: VectorIndex,
        options: AskOptions,
    ) -> Self {
        Self {
            chat,
            embedder,
            index,
            options,
            k: DEFAULT_K,
            memory: ChatHistory::default(),
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn history(&self) -> &ChatHistory {
        &self.memory
    }

    pub async fn ask(&mut self, question: &str) -> Result<RetrievalAnswer, RagError> {
        let standalone_question = if self.memory.is_empty() {
            question.to_string()
        } else {
            self.condense(question).await?
        };

        let query = self.embedder.embed_query(&standalone_question).await?;
        let sources = self.index.similarity_search(&query, self.k).await?;
        debug!(retrieved = sources.len(), "retrieved context chunks");

        let messages = prompts::qa_messages(
            sources.iter().map(|hit| hit.document.content.as_str()),
            &standalone_question,
        );
        let response = self.chat.complete(&messages, &self.options).await?;
        let answer = normalize_text(&response.content);

        self.memory.push(question, answer.clone());
        Ok(RetrievalAnswer {
            answer,
            standalone_question,
            sources,
        })
    }

    async fn condense(&self, question: &str) -> Result<String, RagError> {
        let messages = prompts::condense_messages(&self.memory.render(), question);
        let response = self.chat.complete(&messages, &self.options).await?;
        let condensed = normalize_text(&response.content);
        if condensed.is_empty() {
            return Ok(question.to_string());
        }
        Ok(condensed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rchain::loaders::Document;
    use crate::testing::{FakeChat, KeywordEmbedder};

    async fn index(embedder: &KeywordEmbedder) -> VectorIndex {
        let docs = vec![
            Document::new("SQL for beginners opens on June 3.", "schedule"),
            Document::new("Rust in production opens on July 8.", "schedule"),
        ];
        VectorIndex::from_documents(docs, embedder)
            .await
            .expect("index builds")
    }

    #[tokio::test]
    async fn first_question_is_answered_from_retrieved_context() {
        let embedder = KeywordEmbedder::new(["sql", "rust"]);
        let chat = FakeChat::replying(["  The Rust course opens on July 8.\n"]);
        let mut chain =
            ConversationalRetrieval::new(&chat, &embedder, index(&embedder).await, AskOptions::default());

        let answer = chain.ask("When does Rust start?").await.expect("answer");

        assert_eq!(answer.answer, "The Rust course opens on July 8.");
        assert_eq!(answer.standalone_question, "When does Rust start?");
        assert_eq!(chat.calls(), 1);
        let sent = chat.last_messages();
        assert!(sent[0].content.contains("Rust in production opens on July 8."));
        assert_eq!(chain.history().len(), 1);
    }

    #[tokio::test]
    async fn follow_up_is_condensed_with_history_first() {
        let embedder = KeywordEmbedder::new(["sql", "rust"]);
        let chat = FakeChat::replying([
            "SQL for beginners opens on June 3.",
            "When does the SQL course start?",
            "June 3.",
        ]);
        let mut chain =
            ConversationalRetrieval::new(&chat, &embedder, index(&embedder).await, AskOptions::default())
                .with_k(1);

        chain.ask("What SQL course is there?").await.expect("first answer");
        let follow_up = chain.ask("When does it start?").await.expect("second answer");

        assert_eq!(chat.calls(), 3);
        assert_eq!(follow_up.standalone_question, "When does the SQL course start?");
        assert_eq!(follow_up.answer, "June 3.");
        assert_eq!(follow_up.sources.len(), 1);
        assert_eq!(chain.history().len(), 2);
    }

    #[test]
    fn history_renders_turns_in_order() {
        let mut history = ChatHistory::default();
        history.push("hi", "hello");
        history.push("next?", "done");
        assert_eq!(
            history.render(),
            "Human: hi\nAssistant: hello\nHuman: next?\nAssistant: done"
        );
    }
}
