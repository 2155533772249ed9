use std::sync::Arc;

use crate::{
    BoxedEventStream, ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderFuture,
    ProviderId, SecureCredentialManager,
};

use super::auth::resolve_openai_key;
use super::request::ChatCompletionRequest;
use super::transport::OpenAiTransport;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// [`ModelProvider`] for the OpenAI chat-completions endpoint.
///
/// The API key is read from the credential manager on every call, so a key
/// stored after construction is picked up by the next request.
#[derive(Clone)]
pub struct OpenAiProvider {
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn OpenAiTransport>,
    fallback_model: String,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("transport", &self.transport)
            .field("fallback_model", &self.fallback_model)
            .finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn OpenAiTransport>,
    ) -> Self {
        Self {
            credentials,
            transport,
            fallback_model: DEFAULT_OPENAI_MODEL.to_string(),
        }
    }

    /// Model used when a request leaves its model blank.
    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    fn prepare(
        &self,
        request: ModelRequest,
        stream: bool,
    ) -> Result<ChatCompletionRequest, ProviderError> {
        request.validate()?;
        ChatCompletionRequest::from_model_request(request, &self.fallback_model, stream)
    }
}

impl ModelProvider for OpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            let api_key = resolve_openai_key(&self.credentials)?;
            let request = self.prepare(request, false)?;
            self.transport.complete(request, api_key).await
        })
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            let api_key = resolve_openai_key(&self.credentials)?;
            let request = self.prepare(request, true)?;
            self.transport.stream(request, api_key).await
        })
    }
}
