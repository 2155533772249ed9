//! Chat session, configuration, and turn event types.

use std::fmt::{Display, Formatter};

use sgprovider::{Message, ToolCall};

use crate::{ConversationState, SystemPromptContext};

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_MAX_SEARCH_RESULTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// A fresh id derived from the current time.
    pub fn generate() -> Self {
        Self(format!(
            "session-{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S%3f")
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub enable_web_search: bool,
    pub max_search_results: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            enable_web_search: true,
            max_search_results: DEFAULT_MAX_SEARCH_RESULTS,
        }
    }
}

impl ChatConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_web_search(mut self, enabled: bool) -> Self {
        self.enable_web_search = enabled;
        self
    }

    pub fn with_max_search_results(mut self, max_search_results: usize) -> Self {
        self.max_search_results = max_search_results;
        self
    }
}

/// Per-session state: configuration, the conversation log and the system
/// prompt. Owned by the caller and lent to each turn.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: SessionId,
    pub config: ChatConfig,
    conversation: ConversationState,
    system_prompt: SystemPromptContext,
}

impl ChatSession {
    pub fn new(id: impl Into<SessionId>, config: ChatConfig) -> Self {
        Self {
            id: id.into(),
            config,
            conversation: ConversationState::new(),
            system_prompt: SystemPromptContext::default(),
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: SystemPromptContext) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    pub fn system_prompt(&self) -> &SystemPromptContext {
        &self.system_prompt
    }

    pub fn refresh_system_prompt(&mut self) {
        self.system_prompt.refresh();
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    pub(crate) fn conversation_mut(&mut self) -> &mut ConversationState {
        &mut self.conversation
    }

    pub fn history(&self) -> Vec<Message> {
        self.conversation.snapshot()
    }

    pub fn render_history(&self) -> String {
        self.conversation.render_history()
    }

    pub fn history_len(&self) -> usize {
        self.conversation.count()
    }

    pub fn clear_history(&mut self) {
        self.conversation.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurnResult {
    pub session_id: SessionId,
    pub assistant_message: String,
    pub tool_calls_executed: usize,
    pub tool_calls_skipped: usize,
    /// True when the model rejected tools and the turn was answered without them.
    pub tools_dropped: bool,
    pub history_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    TextDelta(String),
    ToolCallsDetected(Vec<ToolCall>),
    ToolExecuted {
        name: String,
        query: String,
        result_count: usize,
    },
    Notice(String),
    TurnComplete(ChatTurnResult),
}

/// Receives a turn's events in order. `TurnComplete` is always last.
pub trait TurnSink: Send {
    fn emit(&mut self, event: ChatEvent);
}

impl TurnSink for Vec<ChatEvent> {
    fn emit(&mut self, event: ChatEvent) {
        self.push(event);
    }
}
