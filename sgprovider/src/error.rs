//! Errors raised by model providers.
//!
//! ```rust
//! use sgprovider::{ProviderError, ProviderErrorKind};
//!
//! let rejected = ProviderError::tools_unsupported("model does not accept tools").with_status(400);
//! assert!(rejected.is_tools_unsupported());
//! assert!(!rejected.is_retryable());
//! assert_eq!(rejected.to_string(), "ToolsUnsupported (HTTP 400): model does not accept tools");
//!
//! assert!(ProviderErrorKind::RateLimited.is_retryable());
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Missing, malformed or refused API key.
    Authentication,
    RateLimited,
    InvalidRequest,
    /// The endpoint or model rejected the function-calling parameters.
    ToolsUnsupported,
    Timeout,
    Transport,
    Unavailable,
    Other,
}

impl ProviderErrorKind {
    /// Whether the same request may succeed if sent again later.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Timeout | Self::Transport | Self::Unavailable
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    /// HTTP status of the rejected request, when one was received.
    pub status: Option<u16>,
}

macro_rules! kind_constructor {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(
            pub fn $name(message: impl Into<String>) -> Self {
                Self::new(ProviderErrorKind::$kind, message)
            }
        )*
    };
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    kind_constructor! {
        authentication => Authentication,
        rate_limited => RateLimited,
        invalid_request => InvalidRequest,
        tools_unsupported => ToolsUnsupported,
        timeout => Timeout,
        transport => Transport,
        unavailable => Unavailable,
        other => Other,
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    pub fn is_tools_unsupported(&self) -> bool {
        self.kind == ProviderErrorKind::ToolsUnsupported
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{:?} (HTTP {status}): {}", self.kind, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ProviderError {}
