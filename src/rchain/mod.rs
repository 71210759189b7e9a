//! Lightweight LLM and retrieval helpers.
//!
//! Typed wrappers for hosted chat models and embeddings, plus the document
//! loading, splitting, indexing and retrieval steps used by the RAG commands.

/// Anthropic messages API.
pub mod anthropic;
pub(crate) mod chat_runtime;
/// Embedding model clients.
pub mod embeddings;
/// File and web page loaders.
pub mod loaders;
/// OpenAI-compatible chat completions.
pub mod openai;
/// Prompt text.
pub mod prompts;
/// Provider-agnostic chat interfaces and dispatch.
pub mod provider;
/// Conversational retrieval chain.
pub mod retrieval;
pub mod splitter;
pub mod vectorstore;
