//! Wires the OpenAI provider and the SearchAPI backend into a chat service.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sgchat::{ChatConfig, ChatError, ChatService, ChatSession, SessionId};
use sgprovider::{OpenAiHttpTransport, OpenAiProvider, SecureCredentialManager};
use sgsearch::SearchApiProvider;

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone)]
pub struct ChatRuntimeOptions {
    pub config: ChatConfig,
    pub openai_api_key: Option<String>,
    pub search_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub searchapi_base_url: Option<String>,
    pub timeout: Duration,
}

impl ChatRuntimeOptions {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            config,
            openai_api_key: None,
            search_api_key: None,
            openai_base_url: None,
            searchapi_base_url: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn with_openai_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.openai_api_key = Some(api_key.into());
        self
    }

    pub fn with_search_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.search_api_key = Some(api_key.into());
        self
    }

    pub fn with_openai_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openai_base_url = Some(base_url.into());
        self
    }

    pub fn with_searchapi_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.searchapi_base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A ready service plus the one session it will serve.
#[derive(Clone)]
pub struct ChatRuntime {
    pub service: ChatService,
    pub session: ChatSession,
}

impl ChatRuntime {
    pub fn search_enabled(&self) -> bool {
        self.service.has_search() && self.session.config.enable_web_search
    }
}

pub fn http_client(timeout: Duration) -> Result<Client, ChatError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|error| ChatError::configuration(format!("failed to build HTTP client: {error}")))
}

/// Fails with a `Configuration` error when no OpenAI key is available. A
/// missing SearchAPI key only leaves the tools out.
pub fn build_chat_runtime(options: ChatRuntimeOptions) -> Result<ChatRuntime, ChatError> {
    let api_key = options
        .openai_api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ChatError::configuration("no OpenAI API key configured"))?;

    let http = http_client(options.timeout)?;

    let credentials = Arc::new(SecureCredentialManager::new());
    credentials.set_openai_api_key(api_key)?;

    let mut transport = OpenAiHttpTransport::new(http.clone());
    if let Some(base_url) = &options.openai_base_url {
        transport = transport.with_base_url(base_url.clone());
    }
    let provider = OpenAiProvider::new(credentials, Arc::new(transport))
        .with_fallback_model(options.config.model.clone());

    let mut service = ChatService::new(Arc::new(provider));

    let search_key = options
        .search_api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty());
    match (options.config.enable_web_search, search_key) {
        (true, Some(key)) => {
            let mut search = SearchApiProvider::new(http, key)
                .map_err(|error| ChatError::configuration(error.message))?;
            if let Some(base_url) = &options.searchapi_base_url {
                search = search.with_base_url(base_url.clone());
            }
            service = service.with_search(Arc::new(search));
        }
        (true, None) => {
            tracing::info!(
                phase = "runtime",
                event = "search_disabled",
                "no SearchAPI key configured; web search is disabled"
            );
        }
        (false, _) => {}
    }

    let session = ChatSession::new(SessionId::generate(), options.config);
    tracing::debug!(
        phase = "runtime",
        event = "ready",
        session_id = %session.id,
        model = %session.config.model,
        search = service.has_search()
    );

    Ok(ChatRuntime { service, session })
}
