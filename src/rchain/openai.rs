//! OpenAI-compatible chat completions. DeepSeek serves the same wire format.

use serde::{Deserialize, Serialize};

use crate::rchain::chat_runtime::send_once;
use crate::rchain::provider::{
    AskOptions, AskResponse, ChatMessage, Endpoint, ProviderError, Usage,
};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsagePayload>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsagePayload {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

pub(crate) fn chat_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

pub(crate) async fn complete(
    http: &reqwest::Client,
    endpoint: Endpoint<'_>,
    messages: &[ChatMessage],
    options: &AskOptions,
) -> Result<AskResponse, ProviderError> {
    let provider = endpoint.provider;
    let payload = ChatCompletionRequest {
        model: endpoint.model,
        messages,
        temperature: options.temperature,
        max_tokens: options.max_tokens,
    };

    let request = http
        .post(chat_url(endpoint.base_url))
        .bearer_auth(endpoint.api_key)
        .json(&payload);
    let response = send_once(request, options.timeout_secs)
        .await
        .map_err(|failure| failure.into_provider_error(provider))?;

    let body: ChatCompletionResponse = response
        .json()
        .await
        .map_err(|source| ProviderError::Request { provider, source })?;

    extract(body).ok_or(ProviderError::EmptyResponse { provider })
}

/// The first choice carries the answer; a null content is an empty answer.
fn extract(body: ChatCompletionResponse) -> Option<AskResponse> {
    let choice = body.choices.into_iter().next()?;
    let content = choice.message.content.unwrap_or_default();
    let usage = body.usage.map(|usage| Usage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
    });
    Some(AskResponse { content, usage })
}
