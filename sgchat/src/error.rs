//! Chat-layer errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use sgprovider::{ProviderError, ProviderErrorKind};
use sgsearch::SearchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    Provider,
    ToolArguments,
    Search,
    Configuration,
    Conversation,
}

/// Where in a turn an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorPhase {
    Probe,
    Streaming,
    Tooling,
    Finalization,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub phase: Option<ChatErrorPhase>,
    pub message: String,
    pub provider_kind: Option<ProviderErrorKind>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            phase: None,
            message: message.into(),
            provider_kind: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Provider, message)
    }

    pub fn tool_arguments(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::ToolArguments, message)
    }

    pub fn search(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Search, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Configuration, message)
    }

    pub fn conversation(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Conversation, message)
    }

    pub fn with_phase(mut self, phase: ChatErrorPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub(crate) fn from_provider(error: ProviderError, phase: ChatErrorPhase) -> Self {
        Self::from(error).with_phase(phase)
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.phase {
            Some(phase) => write!(f, "{:?} during {:?}: {}", self.kind, phase, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        let kind = match value.kind {
            ProviderErrorKind::InvalidRequest => ChatErrorKind::InvalidRequest,
            ProviderErrorKind::Authentication => ChatErrorKind::Configuration,
            _ => ChatErrorKind::Provider,
        };

        Self {
            kind,
            phase: None,
            message: value.message,
            provider_kind: Some(value.kind),
        }
    }
}

impl From<SearchError> for ChatError {
    fn from(value: SearchError) -> Self {
        let argument_error = value.is_argument_error();
        let message = value.message;
        if argument_error {
            ChatError::tool_arguments(message)
        } else {
            ChatError::search(message)
        }
        .with_phase(ChatErrorPhase::Tooling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_keep_their_kind() {
        let error = ChatError::from_provider(
            ProviderError::transport("connection reset"),
            ChatErrorPhase::Streaming,
        );

        assert_eq!(error.kind, ChatErrorKind::Provider);
        assert_eq!(error.provider_kind, Some(ProviderErrorKind::Transport));
        assert_eq!(
            error.to_string(),
            "Provider during Streaming: connection reset"
        );
    }

    #[test]
    fn authentication_failures_are_configuration_errors() {
        let error = ChatError::from(ProviderError::authentication("bad key"));
        assert_eq!(error.kind, ChatErrorKind::Configuration);
    }

    #[test]
    fn search_errors_split_by_cause() {
        let arguments = ChatError::from(SearchError::invalid_arguments("missing query"));
        assert_eq!(arguments.kind, ChatErrorKind::ToolArguments);
        assert_eq!(arguments.phase, Some(ChatErrorPhase::Tooling));

        let backend = ChatError::from(SearchError::transport("timed out"));
        assert_eq!(backend.kind, ChatErrorKind::Search);
    }
}
