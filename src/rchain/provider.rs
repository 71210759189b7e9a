use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::Settings;
use crate::rchain::{anthropic, openai};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Openai,
    Deepseek,
    Anthropic,
}

impl Provider {
    pub const SUPPORTED: &'static str = "openai, deepseek, anthropic";

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Deepseek => "deepseek",
            Self::Anthropic => "anthropic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::Openai),
            "deepseek" => Some(Self::Deepseek),
            "anthropic" => Some(Self::Anthropic),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn api_key_env(provider: Provider) -> &'static str {
    match provider {
        Provider::Openai => "OPENAI_API_KEY",
        Provider::Deepseek => "DEEPSEEK_API_KEY",
        Provider::Anthropic => "ANTHROPIC_API_KEY",
    }
}

pub fn default_model(provider: Provider) -> &'static str {
    match provider {
        Provider::Openai => "gpt-4o-mini",
        Provider::Deepseek => "deepseek-chat",
        Provider::Anthropic => "claude-3-5-haiku-latest",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    pub fn is_system(&self) -> bool {
        self.role == "system"
    }
}

/// Fixed per-call sampling parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AskOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Usage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct AskResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(
        "{key_env} is not set. Create a .env file with {key_env}=... (or export it) and try again."
    )]
    MissingApiKey {
        provider: Provider,
        key_env: &'static str,
    },
    #[error("{provider} request failed: {source}")]
    Request {
        provider: Provider,
        source: reqwest::Error,
    },
    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: Provider,
        status: StatusCode,
        body: String,
    },
    #[error("{provider} response did not contain a message")]
    EmptyResponse { provider: Provider },
}

/// A chat-completion backend. One call per invocation; no retries.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &AskOptions,
    ) -> Result<AskResponse, ProviderError>;
}

/// Connection details shared by the wire-format modules.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Endpoint<'a> {
    pub provider: Provider,
    pub base_url: &'a str,
    pub api_key: &'a str,
    pub model: &'a str,
}

/// Hosted chat model bound to one provider, model id and credential.
#[derive(Debug, Clone)]
pub struct ChatClient {
    provider: Provider,
    model: String,
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl ChatClient {
    /// Fails with [`ProviderError::MissingApiKey`] before any network activity
    /// when the provider's credential is absent.
    pub fn new(
        provider: Provider,
        model: impl Into<String>,
        settings: &Settings,
    ) -> Result<Self, ProviderError> {
        let key_env = api_key_env(provider);
        let api_key = settings
            .credentials
            .get(key_env)
            .ok_or(ProviderError::MissingApiKey { provider, key_env })?;

        Ok(Self {
            provider,
            model: model.into(),
            api_key: api_key.to_string(),
            base_url: settings.endpoints.chat_base_url(provider).to_string(),
            http: reqwest::Client::new(),
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> Endpoint<'_> {
        Endpoint {
            provider: self.provider,
            base_url: &self.base_url,
            api_key: &self.api_key,
            model: &self.model,
        }
    }
}

#[async_trait]
impl ChatModel for ChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &AskOptions,
    ) -> Result<AskResponse, ProviderError> {
        debug!(
            provider = %self.provider,
            model = %self.model,
            messages = messages.len(),
            "dispatching chat completion"
        );
        let response = match self.provider {
            Provider::Openai | Provider::Deepseek => {
                openai::complete(&self.http, self.endpoint(), messages, options).await
            }
            Provider::Anthropic => {
                anthropic::complete(&self.http, self.endpoint(), messages, options).await
            }
        }?;
        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = ?usage.prompt_tokens,
                completion_tokens = ?usage.completion_tokens,
                total_tokens = ?usage.total_tokens,
                "token usage"
            );
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, Endpoints};

    fn settings_with(keys: &[(&str, &str)]) -> Settings {
        Settings {
            credentials: Credentials::from_pairs(keys.iter().copied()),
            endpoints: Endpoints::default(),
        }
    }

    #[test]
    fn provider_parse_accepts_known_names_case_insensitively() {
        assert_eq!(Provider::parse("OpenAI"), Some(Provider::Openai));
        assert_eq!(Provider::parse(" deepseek "), Some(Provider::Deepseek));
        assert_eq!(Provider::parse("anthropic"), Some(Provider::Anthropic));
        assert_eq!(Provider::parse("google"), None);
    }

    #[test]
    fn client_requires_the_provider_credential() {
        let settings = settings_with(&[("DEEPSEEK_API_KEY", "ds")]);

        let err = ChatClient::new(Provider::Openai, "gpt-4o-mini", &settings)
            .expect_err("openai key is absent");
        assert!(matches!(
            err,
            ProviderError::MissingApiKey {
                key_env: "OPENAI_API_KEY",
                ..
            }
        ));
        assert!(err.to_string().starts_with("OPENAI_API_KEY is not set."));

        let client = ChatClient::new(Provider::Deepseek, "deepseek-chat", &settings)
            .expect("deepseek key is present");
        assert_eq!(client.provider(), Provider::Deepseek);
        assert_eq!(client.model(), "deepseek-chat");
    }
}
