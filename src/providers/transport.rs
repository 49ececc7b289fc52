use reqwest::RequestBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ProviderError;
use crate::model::Provider;

/// Sends a JSON POST and maps every non-2xx status to [`ProviderError::Http`]
/// with the response body attached. No retries and no timeout beyond the
/// client's own.
pub(crate) async fn send_json<T: Serialize + ?Sized>(
    provider: Provider,
    request: RequestBuilder,
    payload: &T,
) -> Result<reqwest::Response, ProviderError> {
    let response = request
        .json(payload)
        .send()
        .await
        .map_err(|source| ProviderError::Transport { provider, source })?;

    let status = response.status();
    debug!(%provider, status = status.as_u16(), "provider responded");
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Http {
        provider,
        status: status.as_u16(),
        body,
    })
}

pub(crate) async fn decode_json<R: DeserializeOwned>(
    provider: Provider,
    response: reqwest::Response,
) -> Result<R, ProviderError> {
    response
        .json()
        .await
        .map_err(|source| ProviderError::Decode { provider, source })
}

/// Falls back to the empty-array placeholder for missing or blank content.
pub(crate) fn completion_or_placeholder(content: Option<String>) -> String {
    content
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| super::EMPTY_COMPLETION.to_string())
}
