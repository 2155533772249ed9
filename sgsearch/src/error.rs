//! Failures of a search call, split by who caused them.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchErrorKind {
    /// The model sent arguments that do not match the tool schema.
    InvalidArguments,
    /// The model named a tool that is not offered.
    UnknownTool,
    Authentication,
    Transport,
    /// The backend answered, but not with usable results.
    Api,
}

impl SearchErrorKind {
    fn caused_by_model(self) -> bool {
        matches!(self, Self::InvalidArguments | Self::UnknownTool)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchError {
    pub kind: SearchErrorKind,
    pub message: String,
    pub tool_name: Option<String>,
}

impl SearchError {
    pub fn new(kind: SearchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            tool_name: None,
        }
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(SearchErrorKind::InvalidArguments, message)
    }

    pub fn unknown_tool(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            message: format!("unrecognized tool '{name}'"),
            tool_name: Some(name),
            ..Self::new(SearchErrorKind::UnknownTool, "")
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(SearchErrorKind::Authentication, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(SearchErrorKind::Transport, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(SearchErrorKind::Api, message)
    }

    pub fn for_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    /// Errors caused by what the model asked for, as opposed to the search backend.
    pub fn is_argument_error(&self) -> bool {
        self.kind.caused_by_model()
    }
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(tool_name) = &self.tool_name {
            write!(f, "{tool_name}: ")?;
        }
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for SearchError {}
