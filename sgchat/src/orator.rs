//! One model exchange per call: probe, stream, and the tools-rejected fallback.

use std::sync::Arc;

use futures_util::StreamExt;
use sgprovider::{
    BoxedEventStream, Message, ModelProvider, ModelRequest, ProviderError, StreamEvent,
    ToolDefinition,
};

use crate::{
    ChatConfig, ChatError, ChatErrorPhase, ChatEvent, ToolCallAccumulator, ToolCallRef, TurnSink,
};

/// The kind of request being made, carried as `phase` request metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    /// Tools disabled: a single streamed answer.
    Plain,
    /// Non-streaming request with tools declared.
    Probe,
    /// Streamed request with tools still declared, after an empty probe.
    ToolStream,
    /// Streamed retry without tools after the model rejected them.
    Fallback,
    /// Streamed answer over tool results.
    Finalize,
}

impl RequestPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Probe => "probe",
            Self::ToolStream => "tool_stream",
            Self::Fallback => "fallback",
            Self::Finalize => "finalize",
        }
    }

    fn error_phase(self) -> ChatErrorPhase {
        match self {
            Self::Probe => ChatErrorPhase::Probe,
            Self::Finalize => ChatErrorPhase::Finalization,
            Self::Plain | Self::ToolStream | Self::Fallback => ChatErrorPhase::Streaming,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OratorOutcome {
    Answer(String),
    ToolCalls(Vec<ToolCallRef>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub outcome: OratorOutcome,
    pub tools_dropped: bool,
}

impl Completion {
    fn answer(text: String, tools_dropped: bool) -> Self {
        Self {
            outcome: OratorOutcome::Answer(text),
            tools_dropped,
        }
    }

    fn tool_calls(calls: Vec<ToolCallRef>) -> Self {
        Self {
            outcome: OratorOutcome::ToolCalls(calls),
            tools_dropped: false,
        }
    }
}

#[derive(Clone)]
pub struct StreamingOrator {
    provider: Arc<dyn ModelProvider>,
}

impl StreamingOrator {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self { provider }
    }

    /// Performs one exchange and classifies it as an answer or a tool-call batch.
    ///
    /// With no tools this is a single streamed request. With tools, a
    /// non-streaming probe runs first; complete tool calls from the probe are
    /// returned directly, otherwise the answer is streamed with tools still
    /// declared. A `ToolsUnsupported` rejection is retried once without tools.
    pub async fn request_completion(
        &self,
        config: &ChatConfig,
        messages: &[Message],
        tools: &[ToolDefinition],
        sink: &mut dyn TurnSink,
    ) -> Result<Completion, ChatError> {
        if tools.is_empty() {
            let text = self
                .stream_plain(config, messages, RequestPhase::Plain, sink)
                .await?;
            return Ok(Completion::answer(text, false));
        }

        let probe_request = build_request(config, messages, tools, RequestPhase::Probe)?;
        match self.probe(probe_request).await {
            Ok(calls) if !calls.is_empty() => {
                tracing::debug!(
                    phase = RequestPhase::Probe.as_str(),
                    event = "tool_calls_detected",
                    count = calls.len(),
                    "probe returned tool calls"
                );
                return Ok(Completion::tool_calls(calls));
            }
            Ok(_) => {}
            Err(error) if error.is_tools_unsupported() => {
                return self.fallback(config, messages, &error, sink).await;
            }
            Err(error) => return Err(ChatError::from_provider(error, ChatErrorPhase::Probe)),
        }

        let request = build_request(config, messages, tools, RequestPhase::ToolStream)?;
        let stream = match self.provider.stream(request).await {
            Ok(stream) => stream,
            Err(error) if error.is_tools_unsupported() => {
                return self.fallback(config, messages, &error, sink).await;
            }
            Err(error) => {
                return Err(ChatError::from_provider(error, ChatErrorPhase::Streaming));
            }
        };

        consume_tool_stream(stream, sink).await
    }

    /// Streams an answer with no tools declared and returns its full text.
    pub async fn stream_plain(
        &self,
        config: &ChatConfig,
        messages: &[Message],
        phase: RequestPhase,
        sink: &mut dyn TurnSink,
    ) -> Result<String, ChatError> {
        let request = build_request(config, messages, &[], phase)?;
        let mut stream = self
            .provider
            .stream(request)
            .await
            .map_err(|error| ChatError::from_provider(error, phase.error_phase()))?;

        let mut text = String::new();
        while let Some(event) = stream.next().await {
            match event.map_err(|error| ChatError::from_provider(error, phase.error_phase()))? {
                StreamEvent::TextDelta(delta) => {
                    if delta.is_empty() {
                        continue;
                    }
                    text.push_str(&delta);
                    sink.emit(ChatEvent::TextDelta(delta));
                }
                StreamEvent::ToolCallDelta(_) => {
                    tracing::debug!(
                        phase = phase.as_str(),
                        event = "unexpected_tool_fragment",
                        "ignoring tool-call fragment on a request without tools"
                    );
                }
                StreamEvent::ResponseComplete { stop_reason, .. } => {
                    tracing::debug!(phase = phase.as_str(), event = "stream_complete", ?stop_reason);
                }
            }
        }

        Ok(text)
    }

    async fn probe(&self, request: ModelRequest) -> Result<Vec<ToolCallRef>, ProviderError> {
        let response = self.provider.complete(request).await?;

        Ok(response
            .tool_calls()
            .into_iter()
            .enumerate()
            .map(|(index, call)| {
                ToolCallRef::from_call(u32::try_from(index).unwrap_or(u32::MAX), call)
            })
            .collect())
    }

    async fn fallback(
        &self,
        config: &ChatConfig,
        messages: &[Message],
        cause: &ProviderError,
        sink: &mut dyn TurnSink,
    ) -> Result<Completion, ChatError> {
        tracing::warn!(
            phase = RequestPhase::Fallback.as_str(),
            event = "tools_unsupported",
            model = %config.model,
            reason = %cause.message,
            "model rejected tools; retrying without them"
        );

        let text = self
            .stream_plain(config, messages, RequestPhase::Fallback, sink)
            .await?;
        Ok(Completion::answer(text, true))
    }
}

/// Emitted when text already streamed to the sink is superseded by tool calls
/// and will not be part of the stored answer.
pub const DISCARDED_TEXT_NOTICE: &str =
    "The partial answer above was replaced by a search; the final answer follows";

async fn consume_tool_stream(
    mut stream: BoxedEventStream<'_>,
    sink: &mut dyn TurnSink,
) -> Result<Completion, ChatError> {
    let phase = RequestPhase::ToolStream;
    let mut text = String::new();
    let mut accumulator = ToolCallAccumulator::new();

    while let Some(event) = stream.next().await {
        match event.map_err(|error| ChatError::from_provider(error, phase.error_phase()))? {
            StreamEvent::TextDelta(delta) => {
                if delta.is_empty() {
                    continue;
                }
                text.push_str(&delta);
                sink.emit(ChatEvent::TextDelta(delta));
            }
            StreamEvent::ToolCallDelta(fragment) => {
                accumulator.push(fragment);
            }
            StreamEvent::ResponseComplete { stop_reason, .. } => {
                tracing::debug!(phase = phase.as_str(), event = "stream_complete", ?stop_reason);
            }
        }
    }

    if accumulator.ignored() > 0 {
        tracing::debug!(
            phase = phase.as_str(),
            event = "fragments_ignored",
            count = accumulator.ignored(),
            "tool-call fragments without an index were dropped"
        );
    }

    if accumulator.is_empty() {
        return Ok(Completion::answer(text, false));
    }

    tracing::debug!(
        phase = phase.as_str(),
        event = "tool_calls_detected",
        count = accumulator.len(),
        discarded_text_len = text.len(),
        "stream ended with tool calls"
    );
    if !text.is_empty() {
        sink.emit(ChatEvent::Notice(DISCARDED_TEXT_NOTICE.to_string()));
    }
    Ok(Completion::tool_calls(accumulator.finalize()))
}

fn build_request(
    config: &ChatConfig,
    messages: &[Message],
    tools: &[ToolDefinition],
    phase: RequestPhase,
) -> Result<ModelRequest, ChatError> {
    tracing::debug!(
        phase = phase.as_str(),
        event = "request_start",
        model = %config.model,
        messages = messages.len(),
        tools = tools.len()
    );

    let request = ModelRequest::new(config.model.clone(), messages.to_vec())
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens)
        .streaming(phase != RequestPhase::Probe)
        .with_metadata("phase", phase.as_str())
        .offering(tools);

    request
        .validate()
        .map_err(|error| ChatError::from_provider(error, phase.error_phase()))?;
    Ok(request)
}
