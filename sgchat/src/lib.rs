//! Streaming chat engine: conversation state, the probe/stream/fallback
//! exchange with the model, and search tool orchestration.
//!
//! A turn is driven by [`ChatService::run_turn`], which emits [`ChatEvent`]s
//! to a caller-provided [`TurnSink`] and commits the turn to the session
//! history only when it succeeds.

mod accumulator;
mod conversation;
mod coordinator;
mod error;
mod orator;
mod prompt;
mod service;
mod types;

pub mod prelude {
    pub use crate::{
        ChatConfig, ChatError, ChatErrorKind, ChatErrorPhase, ChatEvent, ChatService,
        ChatSession, ChatTurnResult, SessionId, SystemPromptContext, TurnSink,
    };
}

pub use accumulator::{ToolCallAccumulator, ToolCallRef};
pub use conversation::ConversationState;
pub use coordinator::{ToolBatchOutcome, ToolExecutionCoordinator};
pub use error::{ChatError, ChatErrorKind, ChatErrorPhase};
pub use orator::{
    Completion, DISCARDED_TEXT_NOTICE, OratorOutcome, RequestPhase, StreamingOrator,
};
pub use prompt::{DEFAULT_SYSTEM_PROMPT_TEMPLATE, SystemPromptContext, render_template};
pub use service::ChatService;
pub use types::{
    ChatConfig, ChatEvent, ChatSession, ChatTurnResult, DEFAULT_CHAT_MODEL, DEFAULT_MAX_SEARCH_RESULTS,
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, SessionId, TurnSink,
};
