//! Decoding of completion bodies, streamed chunks and error envelopes.

use serde::Deserialize;
use serde_json::Value;

use crate::{
    Message, ModelResponse, OutputItem, ProviderError, ProviderId, StopReason, StreamEvent,
    TokenUsage, ToolCall, ToolCallFragment,
};

/// Request parameters that carry function-calling configuration.
const TOOL_PARAMS: &[&str] = &["tools", "tool_choice", "functions", "function_call"];

pub(crate) fn stop_reason(finish_reason: Option<&str>) -> StopReason {
    match finish_reason {
        Some("stop") => StopReason::EndTurn,
        Some("length") => StopReason::MaxTokens,
        Some("tool_calls" | "function_call") => StopReason::ToolUse,
        Some("cancelled") => StopReason::Cancelled,
        _ => StopReason::Other,
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResponse {
    model: String,
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<CompletedToolCall>>,
}

#[derive(Debug, Deserialize)]
struct CompletedToolCall {
    id: String,
    function: CompletedFunction,
}

#[derive(Debug, Deserialize)]
struct CompletedFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl CompletionResponse {
    /// Text first, then tool calls in the order the model listed them.
    pub(crate) fn into_model_response(self) -> Result<ModelResponse, ProviderError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::transport("completion response had no choices"))?;

        let mut output = Vec::new();
        if let Some(content) = choice.message.content.filter(|content| !content.is_empty()) {
            output.push(OutputItem::Message(Message::assistant(content)));
        }
        let tool_calls = choice.message.tool_calls.unwrap_or_default();
        output.extend(tool_calls.into_iter().map(|call| {
            OutputItem::ToolCall(ToolCall::new(
                call.id,
                call.function.name,
                call.function.arguments,
            ))
        }));

        let usage = self
            .usage
            .map(|usage| TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            })
            .unwrap_or_default();

        Ok(ModelResponse {
            provider: ProviderId::OpenAi,
            model: self.model,
            output,
            stop_reason: stop_reason(choice.finish_reason.as_deref()),
            usage,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionChunk {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ChunkToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChunkToolCall {
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<ChunkFunction>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Turns decoded chunks into stream events, remembering the model name and
/// the last finish reason for the closing `ResponseComplete`.
#[derive(Debug)]
pub(crate) struct ChunkDecoder {
    model: Option<String>,
    requested_model: String,
    finish_reason: Option<String>,
}

impl ChunkDecoder {
    pub(crate) fn new(requested_model: impl Into<String>) -> Self {
        Self {
            model: None,
            requested_model: requested_model.into(),
            finish_reason: None,
        }
    }

    pub(crate) fn decode(&mut self, payload: &str) -> Result<Vec<StreamEvent>, ProviderError> {
        let chunk: CompletionChunk = serde_json::from_str(payload)
            .map_err(|err| ProviderError::transport(format!("malformed stream chunk: {err}")))?;
        Ok(self.events(chunk))
    }

    fn events(&mut self, chunk: CompletionChunk) -> Vec<StreamEvent> {
        if self.model.is_none() {
            self.model = chunk.model;
        }

        let mut events = Vec::new();
        for choice in chunk.choices {
            if let Some(delta) = choice.delta {
                if let Some(content) = delta.content.filter(|content| !content.is_empty()) {
                    events.push(StreamEvent::TextDelta(content));
                }

                let tool_calls = delta.tool_calls.unwrap_or_default();
                events.extend(tool_calls.into_iter().map(|call| {
                    let function = call.function.unwrap_or_default();
                    StreamEvent::ToolCallDelta(ToolCallFragment {
                        index: call.index,
                        id: call.id,
                        name: function.name,
                        arguments: function.arguments,
                    })
                }));
            }

            if choice.finish_reason.is_some() {
                self.finish_reason = choice.finish_reason;
            }
        }
        events
    }

    pub(crate) fn finish(self) -> StreamEvent {
        StreamEvent::ResponseComplete {
            model: self.model.unwrap_or(self.requested_model),
            stop_reason: stop_reason(self.finish_reason.as_deref()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub(crate) message: String,
    #[serde(default)]
    param: Option<String>,
    #[serde(default)]
    code: Option<Value>,
}

impl ApiError {
    pub(crate) fn parse(body: &str) -> Option<Self> {
        serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .map(|envelope| envelope.error)
    }

    /// True when the body names a function-calling parameter as the problem,
    /// or reports an unsupported parameter without naming one.
    pub(crate) fn rejects_tools(&self) -> bool {
        let names_tool_param = self.param.as_deref().is_some_and(|param| {
            TOOL_PARAMS.iter().any(|tool_param| {
                param
                    .strip_prefix(tool_param)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('['))
            })
        });

        match self.code.as_ref().and_then(Value::as_str) {
            Some("unsupported_parameter" | "tools_not_supported") => {
                names_tool_param || self.param.is_none()
            }
            _ => names_tool_param,
        }
    }
}
