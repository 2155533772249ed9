//! The `POST /chat/completions` request body.

use serde::Serialize;
use serde_json::Value;

use crate::{Message, ModelRequest, ProviderError, Role, ToolCall, ToolDefinition};

/// A chat-completions request as it goes over the wire.
///
/// `tools` and `tool_choice` are omitted entirely when no tools are declared.
/// An assistant message that only carries tool calls serializes its content
/// as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<FunctionTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Converts a validated request. A blank model falls back to
    /// `fallback_model`; a tool choice without tools is dropped.
    pub fn from_model_request(
        request: ModelRequest,
        fallback_model: &str,
        stream: bool,
    ) -> Result<Self, ProviderError> {
        let model = if request.model.trim().is_empty() {
            fallback_model.to_string()
        } else {
            request.model
        };

        let messages = request
            .messages
            .into_iter()
            .map(ChatMessage::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        if messages.is_empty() {
            return Err(ProviderError::invalid_request(
                "chat completion requires at least one message",
            ));
        }

        let tools = request
            .tools
            .into_iter()
            .map(FunctionTool::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let tool_choice = request
            .tool_choice
            .filter(|_| !tools.is_empty())
            .map(|choice| choice.as_str());

        Ok(Self {
            model,
            messages,
            tools,
            tool_choice,
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
            stream,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<FunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl TryFrom<Message> for ChatMessage {
    type Error = ProviderError;

    fn try_from(message: Message) -> Result<Self, Self::Error> {
        match message.role {
            Role::Tool if message.tool_call_id.is_none() => {
                return Err(ProviderError::invalid_request(
                    "tool message requires a tool_call_id",
                ));
            }
            Role::System | Role::User if message.text().trim().is_empty() => {
                return Err(ProviderError::invalid_request(format!(
                    "{} message content must not be empty",
                    message.role.as_str()
                )));
            }
            _ => {}
        }

        Ok(Self {
            role: message.role.as_str(),
            content: message.content,
            tool_calls: message.tool_calls.into_iter().map(FunctionCall::from).collect(),
            tool_call_id: message.tool_call_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionCallBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionCallBody {
    pub name: String,
    pub arguments: String,
}

impl From<ToolCall> for FunctionCall {
    fn from(call: ToolCall) -> Self {
        Self {
            id: call.id,
            kind: "function",
            function: FunctionCallBody {
                name: call.name,
                arguments: call.arguments,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionTool {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl TryFrom<ToolDefinition> for FunctionTool {
    type Error = ProviderError;

    fn try_from(tool: ToolDefinition) -> Result<Self, Self::Error> {
        let parameters = serde_json::from_str::<Value>(&tool.input_schema).map_err(|err| {
            ProviderError::invalid_request(format!(
                "schema for tool '{}' is not valid JSON: {err}",
                tool.name
            ))
        })?;

        Ok(Self {
            kind: "function",
            function: FunctionSpec {
                name: tool.name,
                description: tool.description,
                parameters,
            },
        })
    }
}
