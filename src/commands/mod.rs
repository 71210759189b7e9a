//! Command implementations shared by `apikit` and the standalone binaries.

use std::path::Path;

use clap::Args;
use tracing::debug;

use crate::adapter::{self, Input, InputPolicy, Prompter, Reply};
use crate::config::{Settings, load_profile};
use crate::error::{Error, Result};
use crate::hf::backend::{self, Backend};
use crate::hf::classifier::SequenceClassifier;
use crate::hf::hub::ModelFiles;
use crate::rchain::provider::{self, AskOptions, ChatClient, Provider};

pub mod classify;
pub mod config;
pub mod docqa;
pub mod keywords;
pub mod schedule;
pub mod sentiment;
pub mod tokenize;

/// Model selection flags shared by the chat-backed commands.
#[derive(Debug, Clone, Default, Args)]
pub struct ModelArgs {
    /// Profile from the config file supplying defaults for the flags below
    #[arg(long)]
    pub profile: Option<String>,
    /// Provider to call (openai, deepseek, anthropic)
    #[arg(long, value_parser = parse_provider)]
    pub provider: Option<Provider>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub temperature: Option<f32>,
    #[arg(long)]
    pub max_tokens: Option<u32>,
    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

fn parse_provider(value: &str) -> std::result::Result<Provider, String> {
    Provider::parse(value).ok_or_else(|| {
        format!(
            "Invalid provider '{value}'. Supported values: {}.",
            Provider::SUPPORTED
        )
    })
}

/// Fixed per-command parameters used when neither a flag nor a profile sets them.
#[derive(Debug, Clone, Copy)]
pub struct CallDefaults {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// A fully resolved model choice.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelChoice {
    pub provider: Provider,
    pub model: String,
    pub options: AskOptions,
}

impl ModelArgs {
    /// Flag > profile > command default.
    pub fn resolve(&self, defaults: CallDefaults) -> Result<ModelChoice> {
        let profile = match self.profile.as_deref() {
            Some(name) => Some((name, load_profile(name)?)),
            None => None,
        };
        let profile_provider = match &profile {
            Some((name, profile)) => profile.provider(name)?,
            None => None,
        };
        let profile = profile.map(|(_, profile)| profile).unwrap_or_default();

        let provider = self
            .provider
            .or(profile_provider)
            .unwrap_or(Provider::Openai);
        let model = self
            .model
            .clone()
            .or(profile.model)
            .unwrap_or_else(|| provider::default_model(provider).to_string());

        let choice = ModelChoice {
            provider,
            model,
            options: AskOptions {
                temperature: Some(
                    self.temperature
                        .or(profile.temperature)
                        .unwrap_or(defaults.temperature),
                ),
                max_tokens: self
                    .max_tokens
                    .or(profile.max_tokens)
                    .or(defaults.max_tokens),
                timeout_secs: self.timeout.or(profile.timeout),
            },
        };
        debug!(
            provider = %choice.provider,
            model = %choice.model,
            temperature = ?choice.options.temperature,
            max_tokens = ?choice.options.max_tokens,
            "resolved model"
        );
        Ok(choice)
    }
}

impl ModelChoice {
    /// Fails on a missing credential before any input is read.
    pub fn client(&self, settings: &Settings) -> Result<ChatClient> {
        debug!(
            provider = %self.provider,
            api_key_present = settings
                .credentials
                .is_present(provider::api_key_env(self.provider)),
            "building chat client"
        );
        Ok(ChatClient::new(self.provider, self.model.clone(), settings)?)
    }
}

/// Prints a reply: the answer, or the benign no-input message.
pub fn print_reply(reply: &Reply) {
    println!("{}", reply.message());
}

/// Acquires input, then refuses to go further without an inference backend.
///
/// Blank or interrupted input is still a benign no-op when the backend is
/// missing.
pub async fn gated_input(
    backend: &Backend,
    task: &str,
    prompter: &mut dyn Prompter,
    argument: Option<&str>,
    policy: &InputPolicy,
) -> Result<Input> {
    let input = adapter::acquire(argument, prompter, policy).await?;
    if matches!(input, Input::Text(_)) && !backend.is_available() {
        return Err(Error::BackendUnavailable(backend::remediation(task, backend)));
    }
    Ok(input)
}

/// A local directory is used as-is; anything else is a hub model id.
pub async fn resolve_model_files(model: &str, with_weights: bool) -> Result<ModelFiles> {
    let path = Path::new(model.trim());
    if path.is_dir() {
        return Ok(ModelFiles::from_dir(path)?);
    }
    Ok(ModelFiles::from_hub(model, with_weights).await?)
}

#[cfg(feature = "local-inference")]
pub fn load_classifier(files: &ModelFiles) -> Result<Box<dyn SequenceClassifier>> {
    Ok(Box::new(crate::hf::classifier::LocalClassifier::load(files)?))
}

#[cfg(not(feature = "local-inference"))]
pub fn load_classifier(files: &ModelFiles) -> Result<Box<dyn SequenceClassifier>> {
    let task = format!("classification with '{}'", files.origin);
    Err(Error::BackendUnavailable(backend::remediation(
        &task,
        &backend::probe(),
    )))
}
