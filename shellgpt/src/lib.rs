//! ShellGPT: a terminal chat client that streams answers from an
//! OpenAI-compatible API and can search the web mid-answer.
//!
//! The library side holds the pieces the `shellgpt` binary is assembled
//! from: the key store, runtime wiring, the interactive loop and terminal
//! rendering. The engine crates are re-exported for embedding.

pub mod config;
pub mod runtime;
pub mod session;
pub mod setup;
pub mod sink;

pub use sgchat;
pub use sgprovider;
pub use sgsearch;

pub use config::{ConfigManager, StoredConfig};
pub use runtime::{ChatRuntime, ChatRuntimeOptions, build_chat_runtime, http_client};
pub use session::{SessionCommand, run_interactive, run_session};
pub use setup::{KeyStatus, openai_key_status, resolve_openai_api_key, search_key_status};
pub use sink::{StdoutSink, TerminalSink};

pub use sgchat::{
    ChatConfig, ChatError, ChatErrorKind, ChatEvent, ChatService, ChatSession, ChatTurnResult,
    TurnSink,
};
