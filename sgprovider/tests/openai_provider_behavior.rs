#![cfg(feature = "provider-openai")]

use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use sgprovider::adapters::openai::{ChatCompletionRequest, OpenAiProvider, OpenAiTransport};
use sgprovider::{
    BoxedEventStream, Message, ModelProvider, ModelRequest, ModelResponse, OutputItem,
    ProviderError, ProviderErrorKind, ProviderFuture, ProviderId, SecretString,
    SecureCredentialManager, StopReason, StreamEvent, TokenUsage, ToolCall, ToolCallFragment,
    ToolChoice, ToolDefinition, ScriptedEventStream,
};

/// Records what the provider hands to the wire layer and answers with
/// canned provider-level values.
#[derive(Debug, Default)]
struct RecordingTransport {
    requests: Mutex<Vec<(ChatCompletionRequest, String)>>,
    reject_stream_with: Option<ProviderError>,
}

impl RecordingTransport {
    fn record(&self, request: ChatCompletionRequest, api_key: SecretString) {
        self.requests
            .lock()
            .expect("requests lock")
            .push((request, api_key.expose().to_string()));
    }

    fn last(&self) -> (ChatCompletionRequest, String) {
        self.requests
            .lock()
            .expect("requests lock")
            .last()
            .cloned()
            .expect("a request should be recorded")
    }

    fn is_untouched(&self) -> bool {
        self.requests.lock().expect("requests lock").is_empty()
    }
}

impl OpenAiTransport for RecordingTransport {
    fn complete<'a>(
        &'a self,
        request: ChatCompletionRequest,
        api_key: SecretString,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            let model = request.model.clone();
            self.record(request, api_key);
            Ok(ModelResponse {
                provider: ProviderId::OpenAi,
                model,
                output: vec![
                    OutputItem::Message(Message::assistant("hello world")),
                    OutputItem::ToolCall(ToolCall::new(
                        "call_1",
                        "web_search",
                        "{\"query\":\"rust\"}",
                    )),
                ],
                stop_reason: StopReason::ToolUse,
                usage: TokenUsage {
                    input_tokens: 7,
                    output_tokens: 3,
                    total_tokens: 10,
                },
            })
        })
    }

    fn stream<'a>(
        &'a self,
        request: ChatCompletionRequest,
        api_key: SecretString,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            let model = request.model.clone();
            self.record(request, api_key);
            if let Some(error) = self.reject_stream_with.clone() {
                return Err(error);
            }

            let events = ScriptedEventStream::new(vec![
                Ok(StreamEvent::TextDelta("hello".to_string())),
                Ok(StreamEvent::ToolCallDelta(
                    ToolCallFragment::new(0)
                        .with_id("call_9")
                        .with_name("web_search")
                        .with_arguments("{\"qu"),
                )),
                Ok(StreamEvent::ResponseComplete {
                    model,
                    stop_reason: StopReason::ToolUse,
                }),
            ]);
            Ok(Box::pin(events) as BoxedEventStream<'a>)
        })
    }
}

fn credentials() -> Arc<SecureCredentialManager> {
    let credentials = Arc::new(SecureCredentialManager::new());
    credentials
        .set_openai_api_key("sk-live-123")
        .expect("key should set");
    credentials
}

fn search_tool() -> ToolDefinition {
    ToolDefinition {
        name: "web_search".to_string(),
        description: "Search the web".to_string(),
        input_schema: "{\"type\":\"object\"}".to_string(),
    }
}

#[tokio::test]
async fn complete_sends_key_and_wire_request() {
    let transport = Arc::new(RecordingTransport::default());
    let provider = OpenAiProvider::new(credentials(), transport.clone());
    let request = ModelRequest::new("gpt-4o", vec![Message::user("hi")])
        .with_tools(vec![search_tool()])
        .with_tool_choice(ToolChoice::Auto);

    let response = provider
        .complete(request)
        .await
        .expect("completion should succeed");
    assert_eq!(response.text(), "hello world");
    assert_eq!(response.tool_calls()[0].name, "web_search");

    let (sent, api_key) = transport.last();
    assert_eq!(api_key, "sk-live-123");
    assert_eq!(sent.model, "gpt-4o");
    assert_eq!(sent.tools.len(), 1);
    assert_eq!(sent.tools[0].function.name, "web_search");
    assert_eq!(sent.tool_choice, Some("auto"));
    assert!(!sent.stream);
}

#[tokio::test]
async fn stream_uses_fallback_model_and_generation_options() {
    let transport = Arc::new(RecordingTransport::default());
    let provider = OpenAiProvider::new(credentials(), transport.clone())
        .with_fallback_model("gpt-4o-mini");
    let request = ModelRequest::new("", vec![Message::user("hi")])
        .with_temperature(0.7)
        .with_max_tokens(1000);

    let events = provider
        .stream(request)
        .await
        .expect("stream should open")
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .expect("stream should succeed");

    assert_eq!(events.len(), 3);
    assert_eq!(
        events.last(),
        Some(&StreamEvent::ResponseComplete {
            model: "gpt-4o-mini".to_string(),
            stop_reason: StopReason::ToolUse,
        })
    );

    let (sent, _) = transport.last();
    assert_eq!(sent.model, "gpt-4o-mini");
    assert!(sent.stream);
    assert_eq!(sent.temperature, Some(0.7));
    assert_eq!(sent.max_tokens, Some(1000));
}

#[tokio::test]
async fn stream_surfaces_rejection_before_any_event() {
    let transport = Arc::new(RecordingTransport {
        reject_stream_with: Some(ProviderError::tools_unsupported("tools rejected")),
        ..RecordingTransport::default()
    });
    let provider = OpenAiProvider::new(credentials(), transport);
    let request = ModelRequest::new("gpt-4o-mini", vec![Message::user("hi")])
        .with_tools(vec![search_tool()]);

    let error = match provider.stream(request).await {
        Ok(_) => panic!("stream should be rejected"),
        Err(error) => error,
    };
    assert!(error.is_tools_unsupported());
}

#[tokio::test]
async fn missing_key_fails_before_transport() {
    let transport = Arc::new(RecordingTransport::default());
    let provider = OpenAiProvider::new(Arc::new(SecureCredentialManager::new()), transport.clone());

    let error = provider
        .complete(ModelRequest::new("gpt-4o-mini", vec![Message::user("hi")]))
        .await
        .expect_err("missing key should fail");
    assert_eq!(error.kind, ProviderErrorKind::Authentication);
    assert_eq!(error.message, "no OpenAI API key configured");
    assert!(transport.is_untouched());
}

#[tokio::test]
async fn key_stored_after_construction_is_used() {
    let credentials = Arc::new(SecureCredentialManager::new());
    let transport = Arc::new(RecordingTransport::default());
    let provider = OpenAiProvider::new(credentials.clone(), transport.clone());

    credentials
        .set_openai_api_key("sk-later")
        .expect("key should set");
    provider
        .complete(ModelRequest::new("gpt-4o-mini", vec![Message::user("hi")]))
        .await
        .expect("completion should succeed");

    assert_eq!(transport.last().1, "sk-later");
}

#[tokio::test]
async fn empty_conversation_is_rejected_before_transport() {
    let transport = Arc::new(RecordingTransport::default());
    let provider = OpenAiProvider::new(credentials(), transport.clone());

    let error = provider
        .complete(ModelRequest::new("gpt-4o-mini", Vec::new()))
        .await
        .expect_err("empty messages should fail");
    assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
    assert!(transport.is_untouched());
}
