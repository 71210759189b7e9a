use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use tracing::debug;

use crate::rchain::provider::{Provider, ProviderError};

#[derive(Debug)]
pub(crate) enum RequestFailure {
    Request(reqwest::Error),
    Api { status: StatusCode, body: String },
}

impl RequestFailure {
    pub(crate) fn into_provider_error(self, provider: Provider) -> ProviderError {
        match self {
            Self::Request(source) => ProviderError::Request { provider, source },
            Self::Api { status, body } => ProviderError::Api {
                provider,
                status,
                body,
            },
        }
    }
}

/// Sends one request. Non-2xx responses are returned as [`RequestFailure::Api`]
/// with the body kept for the error message. There is no retry.
pub(crate) async fn send_once(
    request: RequestBuilder,
    timeout_secs: Option<u64>,
) -> Result<reqwest::Response, RequestFailure> {
    let request = match timeout_secs {
        Some(secs) => request.timeout(Duration::from_secs(secs)),
        None => request,
    };

    let response = request.send().await.map_err(RequestFailure::Request)?;
    let status = response.status();
    debug!(%status, "provider responded");

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RequestFailure::Api {
        status,
        body: truncate_body(&body),
    })
}

const MAX_ERROR_BODY_CHARS: usize = 2_000;

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let mut short: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    short.push_str("...");
    short
}
