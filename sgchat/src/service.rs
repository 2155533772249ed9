//! Turn orchestration over the orator and the tool coordinator.

use std::sync::Arc;

use sgprovider::{Message, ModelProvider, ToolDefinition};
use sgsearch::{SearchProvider, search_tool_definitions};

use crate::{
    ChatError, ChatEvent, ChatSession, ChatTurnResult, OratorOutcome, StreamingOrator,
    ToolCallRef, ToolExecutionCoordinator, TurnSink,
};

/// Explicit states of one turn.
#[derive(Debug)]
enum TurnState {
    PlainStreaming,
    /// Probe and tool-declared streaming, both inside the orator.
    Probing,
    ToolCallDetected(Vec<ToolCallRef>),
    ExecutingTools(Vec<ToolCallRef>),
    Finalizing,
    Complete(String),
}

impl TurnState {
    fn name(&self) -> &'static str {
        match self {
            Self::PlainStreaming => "plain_streaming",
            Self::Probing => "probing",
            Self::ToolCallDetected(_) => "tool_call_detected",
            Self::ExecutingTools(_) => "executing_tools",
            Self::Finalizing => "finalizing",
            Self::Complete(_) => "complete",
        }
    }
}

#[derive(Clone)]
pub struct ChatService {
    orator: StreamingOrator,
    coordinator: Option<ToolExecutionCoordinator>,
    tools: Vec<ToolDefinition>,
}

impl ChatService {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            orator: StreamingOrator::new(provider),
            coordinator: None,
            tools: Vec::new(),
        }
    }

    /// Enables the search tools, backed by `search`.
    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.coordinator = Some(ToolExecutionCoordinator::new(search));
        self.tools = search_tool_definitions();
        self
    }

    pub fn has_search(&self) -> bool {
        self.coordinator.is_some()
    }

    /// Runs one user turn to completion.
    ///
    /// The user message, any tool-call/tool message pairs and the final
    /// answer are appended to the session history together, and only when
    /// the turn succeeds.
    pub async fn run_turn(
        &self,
        session: &mut ChatSession,
        input: &str,
        sink: &mut dyn TurnSink,
    ) -> Result<ChatTurnResult, ChatError> {
        if input.trim().is_empty() {
            return Err(ChatError::invalid_request("user input must not be empty"));
        }

        let config = session.config.clone();
        let coordinator = self
            .coordinator
            .as_ref()
            .filter(|_| config.enable_web_search);
        let tools: &[ToolDefinition] = if coordinator.is_some() { &self.tools } else { &[] };

        let mut working = Vec::with_capacity(session.history_len() + 2);
        working.push(session.system_prompt().to_message());
        working.extend(session.conversation().messages().iter().cloned());
        let turn_start = working.len();
        working.push(Message::user(input));

        let mut tools_dropped = false;
        let mut executed = 0;
        let mut skipped = 0;

        let mut state = if tools.is_empty() {
            TurnState::PlainStreaming
        } else {
            TurnState::Probing
        };

        let answer = loop {
            tracing::debug!(
                phase = "turn",
                event = "state",
                session_id = %session.id,
                state = state.name()
            );

            state = match state {
                TurnState::PlainStreaming | TurnState::Probing => {
                    let completion = self
                        .orator
                        .request_completion(&config, &working, tools, sink)
                        .await?;
                    tools_dropped = completion.tools_dropped;

                    match completion.outcome {
                        OratorOutcome::Answer(text) => {
                            working.push(Message::assistant(text.clone()));
                            TurnState::Complete(text)
                        }
                        OratorOutcome::ToolCalls(calls) => TurnState::ToolCallDetected(calls),
                    }
                }
                TurnState::ToolCallDetected(calls) => {
                    sink.emit(ChatEvent::ToolCallsDetected(
                        calls.iter().map(ToolCallRef::to_tool_call).collect(),
                    ));
                    TurnState::ExecutingTools(calls)
                }
                TurnState::ExecutingTools(calls) => {
                    let Some(coordinator) = coordinator else {
                        return Err(ChatError::invalid_request(
                            "model requested tools but search is not configured",
                        ));
                    };
                    let outcome = coordinator
                        .execute_batch(calls, &mut working, config.max_search_results, sink)
                        .await;
                    executed += outcome.executed;
                    skipped += outcome.skipped;
                    TurnState::Finalizing
                }
                TurnState::Finalizing => {
                    let Some(coordinator) = coordinator else {
                        return Err(ChatError::invalid_request(
                            "finalization requires a search coordinator",
                        ));
                    };
                    let text = coordinator
                        .finalize(&self.orator, &config, &mut working, sink)
                        .await?;
                    TurnState::Complete(text)
                }
                TurnState::Complete(text) => break text,
            };
        };

        let turn_messages = working.split_off(turn_start);
        session.conversation_mut().append_all(turn_messages)?;

        let result = ChatTurnResult {
            session_id: session.id.clone(),
            assistant_message: answer,
            tool_calls_executed: executed,
            tool_calls_skipped: skipped,
            tools_dropped,
            history_len: session.history_len(),
        };

        tracing::debug!(
            phase = "turn",
            event = "complete",
            session_id = %session.id,
            history_len = result.history_len,
            tool_calls_executed = executed
        );
        sink.emit(ChatEvent::TurnComplete(result.clone()));
        Ok(result)
    }
}
