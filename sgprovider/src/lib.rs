//! Model provider contracts shared by the chat engine, plus the OpenAI
//! chat-completions adapter.

mod credentials;
mod error;
mod model;
mod provider;
mod stream;

#[cfg(feature = "provider-openai")]
pub mod adapters;

pub use credentials::{SecretString, SecureCredentialManager};
pub use error::{ProviderError, ProviderErrorKind};
pub use model::{
    GenerationOptions, Message, MetadataMap, ModelRequest, ModelResponse,
    OutputItem, ProviderId, Role, StopReason, TokenUsage, ToolCall, ToolCallFragment, ToolChoice,
    ToolDefinition,
};
pub use provider::{ModelProvider, ProviderFuture};
pub use stream::{BoxedEventStream, ScriptedEventStream, StreamEvent};

#[cfg(feature = "provider-openai")]
pub use adapters::openai::{
    DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL, OpenAiHttpTransport, OpenAiProvider,
    OpenAiTransport,
};
