//! Fakes shared by unit tests.

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::adapter::{Prompter, Read};
use crate::rchain::embeddings::Embedder;
use crate::rchain::provider::{AskOptions, AskResponse, ChatMessage, ChatModel, ProviderError};

/// Chat model that replays canned replies and records what it was sent.
#[derive(Default)]
pub struct FakeChat {
    replies: Mutex<VecDeque<String>>,
    sent: Mutex<Vec<Vec<ChatMessage>>>,
    calls: AtomicUsize,
}

impl FakeChat {
    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.sent
            .lock()
            .expect("fake chat lock")
            .last()
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for FakeChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _options: &AskOptions,
    ) -> Result<AskResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent
            .lock()
            .expect("fake chat lock")
            .push(messages.to_vec());
        let content = self
            .replies
            .lock()
            .expect("fake chat lock")
            .pop_front()
            .unwrap_or_default();
        Ok(AskResponse {
            content,
            usage: None,
        })
    }
}

/// Prompter that replays scripted reads; runs dry as EOF.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    reads: VecDeque<Read>,
    pub prompts: Vec<String>,
    pub finished: usize,
}

impl ScriptedPrompter {
    pub fn new<I: IntoIterator<Item = Read>>(reads: I) -> Self {
        Self {
            reads: reads.into_iter().collect(),
            ..Self::default()
        }
    }

    fn next(&mut self, prompt: &str) -> io::Result<Read> {
        self.prompts.push(prompt.to_string());
        Ok(self.reads.pop_front().unwrap_or(Read::Eof))
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn read_line(&mut self, prompt: &str) -> io::Result<Read> {
        self.next(prompt)
    }

    async fn read_to_end(&mut self, prompt: &str) -> io::Result<Read> {
        self.next(prompt)
    }

    fn finish(&mut self) {
        self.finished += 1;
    }
}

/// Bag-of-keywords embedder: one dimension per keyword plus a constant bias
/// so no vector is all zeros.
pub struct KeywordEmbedder {
    keywords: Vec<String>,
}

impl KeywordEmbedder {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut vector = self
            .keywords
            .iter()
            .map(|keyword| lower.matches(keyword.as_str()).count() as f32)
            .collect::<Vec<_>>();
        vector.push(0.1);
        vector
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }
}
