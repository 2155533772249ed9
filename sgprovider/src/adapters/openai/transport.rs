//! The HTTP seam of the OpenAI adapter.

use async_stream::try_stream;
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};

use crate::{BoxedEventStream, ModelResponse, ProviderError, ProviderFuture, SecretString};

use super::request::ChatCompletionRequest;
use super::response::{ApiError, ChunkDecoder, CompletionResponse};
use super::sse::{SseData, SseLineBuffer};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Sends chat-completion requests. Implemented over HTTP by
/// [`OpenAiHttpTransport`]; tests substitute their own.
pub trait OpenAiTransport: Send + Sync + std::fmt::Debug {
    fn complete<'a>(
        &'a self,
        request: ChatCompletionRequest,
        api_key: SecretString,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>>;

    /// Resolves once the endpoint has accepted the request, so request-level
    /// rejections surface here and not mid-stream.
    fn stream<'a>(
        &'a self,
        request: ChatCompletionRequest,
        api_key: SecretString,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct OpenAiHttpTransport {
    client: Client,
    base_url: String,
}

impl OpenAiHttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }

    /// Points the transport at an OpenAI-compatible gateway.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Lists models with `api_key` to learn whether the endpoint accepts it.
    ///
    /// `Ok(false)` means the key was refused (401/403). Any other failure is
    /// an error, since it says nothing about the key itself.
    pub async fn check_api_key(&self, api_key: &SecretString) -> Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url.trim_end_matches('/'));
        tracing::debug!(phase = "provider", event = "key_check_start");

        let response = self
            .client
            .get(url)
            .bearer_auth(api_key.expose())
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            tracing::debug!(
                phase = "provider",
                event = "key_rejected",
                status = status.as_u16()
            );
            return Ok(false);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_error(status, &body))
    }

    async fn post(
        &self,
        request: &ChatCompletionRequest,
        api_key: &SecretString,
    ) -> Result<Response, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        tracing::debug!(
            phase = "provider",
            event = "request_start",
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            stream = request.stream
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key.expose())
            .json(request)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = classify_error(status, &body);
        tracing::debug!(
            phase = "provider",
            event = "request_rejected",
            status = status.as_u16(),
            kind = ?error.kind
        );
        Err(error)
    }
}

fn from_reqwest(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(err.to_string())
    } else {
        ProviderError::transport(err.to_string())
    }
}

/// Maps a non-success status and its body to a provider error.
///
/// Tool rejection is read from the structured `param`/`code` fields of the
/// error envelope; the human-readable message is never inspected.
pub(crate) fn classify_error(status: StatusCode, body: &str) -> ProviderError {
    let api_error = ApiError::parse(body);
    let message = api_error
        .as_ref()
        .map(|error| error.message.trim())
        .filter(|message| !message.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("OpenAI request failed with status {status}"));

    let request_rejected = matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY
    );
    let error = if request_rejected && api_error.as_ref().is_some_and(ApiError::rejects_tools) {
        ProviderError::tools_unsupported(message)
    } else {
        match status {
            _ if request_rejected => ProviderError::invalid_request(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ProviderError::authentication(message)
            }
            StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                ProviderError::timeout(message)
            }
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
                ProviderError::unavailable(message)
            }
            _ => ProviderError::transport(message),
        }
    };

    error.with_status(status.as_u16())
}

impl OpenAiTransport for OpenAiHttpTransport {
    fn complete<'a>(
        &'a self,
        mut request: ChatCompletionRequest,
        api_key: SecretString,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            request.stream = false;
            let response = self.post(&request, &api_key).await?;
            let body: CompletionResponse = response
                .json()
                .await
                .map_err(|err| ProviderError::transport(format!("malformed completion: {err}")))?;
            body.into_model_response()
        })
    }

    fn stream<'a>(
        &'a self,
        mut request: ChatCompletionRequest,
        api_key: SecretString,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            request.stream = true;
            let response = self.post(&request, &api_key).await?;
            let mut decoder = ChunkDecoder::new(request.model);

            let events = try_stream! {
                let mut body = response.bytes_stream();
                let mut lines = SseLineBuffer::new();
                let mut body_done = false;

                loop {
                    let data = match lines.next_data()? {
                        Some(data) => data,
                        None if body_done => match lines.finish()? {
                            Some(data) => data,
                            None => break,
                        },
                        None => {
                            match body.next().await {
                                Some(bytes) => lines.push(&bytes.map_err(from_reqwest)?),
                                None => body_done = true,
                            }
                            continue;
                        }
                    };

                    let SseData::Payload(payload) = data else {
                        break;
                    };
                    for event in decoder.decode(&payload)? {
                        yield event;
                    }
                }

                let complete = decoder.finish();
                tracing::debug!(phase = "provider", event = "stream_complete", ?complete);
                yield complete;
            };

            Ok(Box::pin(events) as BoxedEventStream<'a>)
        })
    }
}
