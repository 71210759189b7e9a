//! Anthropic messages API.

use serde::{Deserialize, Serialize};

use crate::rchain::chat_runtime::send_once;
use crate::rchain::provider::{
    AskOptions, AskResponse, ChatMessage, Endpoint, ProviderError, Usage,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";
// The messages API rejects requests without an explicit output budget.
const DEFAULT_MAX_TOKENS: u32 = 1_024;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<&'a ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<UsagePayload>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsagePayload {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}

pub(crate) fn messages_url(base_url: &str) -> String {
    format!("{}/v1/messages", base_url.trim_end_matches('/'))
}

fn build_request<'a>(
    model: &'a str,
    messages: &'a [ChatMessage],
    options: &AskOptions,
) -> MessagesRequest<'a> {
    let system = messages
        .iter()
        .filter(|message| message.is_system())
        .map(|message| message.content.as_str())
        .collect::<Vec<_>>();

    MessagesRequest {
        model,
        max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        system: (!system.is_empty()).then(|| system.join("\n\n")),
        messages: messages.iter().filter(|m| !m.is_system()).collect(),
        temperature: options.temperature,
    }
}

pub(crate) async fn complete(
    http: &reqwest::Client,
    endpoint: Endpoint<'_>,
    messages: &[ChatMessage],
    options: &AskOptions,
) -> Result<AskResponse, ProviderError> {
    let provider = endpoint.provider;
    let payload = build_request(endpoint.model, messages, options);

    let request = http
        .post(messages_url(endpoint.base_url))
        .header("x-api-key", endpoint.api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&payload);
    let response = send_once(request, options.timeout_secs)
        .await
        .map_err(|failure| failure.into_provider_error(provider))?;

    let body: MessagesResponse = response
        .json()
        .await
        .map_err(|source| ProviderError::Request { provider, source })?;

    extract(body).ok_or(ProviderError::EmptyResponse { provider })
}

fn extract(body: MessagesResponse) -> Option<AskResponse> {
    let text = body
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>();
    if text.is_empty() {
        return None;
    }

    let usage = body.usage.map(|usage| Usage {
        prompt_tokens: usage.input_tokens,
        completion_tokens: usage.output_tokens,
        total_tokens: match (usage.input_tokens, usage.output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        },
    });

    Some(AskResponse {
        content: text.concat(),
        usage,
    })
}
