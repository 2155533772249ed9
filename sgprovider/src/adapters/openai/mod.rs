//! OpenAI chat-completions adapter.
//!
//! [`request`] and [`response`] hold the wire formats, [`transport`] moves
//! them over HTTP and [`provider`] ties both to the shared contracts.

mod auth;
mod provider;
mod request;
mod response;
mod sse;
mod tests;
mod transport;

pub use provider::{DEFAULT_OPENAI_MODEL, OpenAiProvider};
pub use request::{
    ChatCompletionRequest, ChatMessage, FunctionCall, FunctionCallBody, FunctionSpec, FunctionTool,
};
pub use transport::{DEFAULT_OPENAI_BASE_URL, OpenAiHttpTransport, OpenAiTransport};
