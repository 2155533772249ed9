#![cfg(test)]

use reqwest::StatusCode;
use serde_json::json;

use crate::{
    Message, ModelRequest, ProviderErrorKind, SecureCredentialManager, StopReason, StreamEvent,
    ToolCall, ToolCallFragment, ToolChoice, ToolDefinition,
};

use super::auth::{looks_like_openai_key, resolve_openai_key};
use super::request::ChatCompletionRequest;
use super::response::{ApiError, ChunkDecoder, CompletionResponse, stop_reason};
use super::transport::classify_error;

fn search_tool() -> ToolDefinition {
    ToolDefinition {
        name: "web_search".to_string(),
        description: "Search the web".to_string(),
        input_schema: r#"{"type":"object","properties":{"query":{"type":"string"}},"required":["query"]}"#
            .to_string(),
    }
}

fn to_json(request: &ChatCompletionRequest) -> serde_json::Value {
    serde_json::to_value(request).expect("request should serialize")
}

#[test]
fn tool_turn_history_serializes_with_null_assistant_content() {
    let request = ModelRequest::new(
        "gpt-4o-mini",
        vec![
            Message::user("what's new?"),
            Message::assistant_tool_calls(vec![ToolCall::new(
                "call_1",
                "web_search",
                r#"{"query":"news"}"#,
            )]),
            Message::tool("call_1", "[]"),
        ],
    )
    .with_tools(vec![search_tool()])
    .with_tool_choice(ToolChoice::Auto);

    let built = ChatCompletionRequest::from_model_request(request, "unused", true)
        .expect("request should convert");
    let json = to_json(&built);

    assert_eq!(json["model"], "gpt-4o-mini");
    assert_eq!(json["tool_choice"], "auto");
    assert_eq!(json["tools"][0]["type"], "function");
    assert_eq!(json["tools"][0]["function"]["parameters"]["required"][0], "query");
    assert_eq!(json["messages"][1]["role"], "assistant");
    assert!(json["messages"][1]["content"].is_null());
    assert_eq!(json["messages"][1]["tool_calls"][0]["type"], "function");
    assert_eq!(
        json["messages"][1]["tool_calls"][0]["function"]["arguments"],
        r#"{"query":"news"}"#
    );
    assert_eq!(json["messages"][2]["role"], "tool");
    assert_eq!(json["messages"][2]["tool_call_id"], "call_1");
    assert_eq!(json["stream"], true);
}

#[test]
fn blank_model_falls_back_and_tool_fields_are_omitted_without_tools() {
    let mut request = ModelRequest::new("  ", vec![Message::user("hi")]);
    request.tool_choice = Some(ToolChoice::Auto);

    let built = ChatCompletionRequest::from_model_request(request, "gpt-4o", false)
        .expect("request should convert");
    assert_eq!(built.model, "gpt-4o");
    assert_eq!(built.tool_choice, None);

    let json = to_json(&built);
    assert!(json.get("tools").is_none());
    assert!(json.get("tool_choice").is_none());
    assert!(json.get("temperature").is_none());
    assert_eq!(json["messages"][0].get("tool_calls"), None);
}

#[test]
fn invalid_tool_schema_is_an_invalid_request() {
    let mut tool = search_tool();
    tool.input_schema = "not json".to_string();
    let request =
        ModelRequest::new("gpt-4o-mini", vec![Message::user("hi")]).with_tools(vec![tool]);

    let error = ChatCompletionRequest::from_model_request(request, "gpt-4o-mini", false)
        .expect_err("schema should be rejected");
    assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
    assert!(error.message.contains("web_search"));
}

#[test]
fn tool_message_without_call_id_is_rejected() {
    let mut orphan = Message::tool("call_1", "[]");
    orphan.tool_call_id = None;
    let request = ModelRequest::new("gpt-4o-mini", vec![Message::user("hi"), orphan]);

    let error = ChatCompletionRequest::from_model_request(request, "gpt-4o-mini", false)
        .expect_err("orphan tool message should fail");
    assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
}

#[test]
fn finish_reasons_map_to_stop_reasons() {
    assert_eq!(stop_reason(Some("stop")), StopReason::EndTurn);
    assert_eq!(stop_reason(Some("length")), StopReason::MaxTokens);
    assert_eq!(stop_reason(Some("tool_calls")), StopReason::ToolUse);
    assert_eq!(stop_reason(Some("function_call")), StopReason::ToolUse);
    assert_eq!(stop_reason(Some("content_filter")), StopReason::Other);
    assert_eq!(stop_reason(None), StopReason::Other);
}

#[test]
fn completion_puts_text_before_tool_calls() {
    let body: CompletionResponse = serde_json::from_value(json!({
        "model": "gpt-4o-mini-2024",
        "choices": [{
            "message": {
                "role": "assistant",
                "content": "Checking.",
                "tool_calls": [{"id": "call_9", "type": "function", "function": {"name": "web_search", "arguments": "{\"query\":\"rust\"}"}}]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
    }))
    .expect("body should parse");

    let response = body.into_model_response().expect("response should convert");
    assert_eq!(response.model, "gpt-4o-mini-2024");
    assert_eq!(response.text(), "Checking.");
    assert_eq!(response.tool_calls()[0].id, "call_9");
    assert_eq!(response.stop_reason, StopReason::ToolUse);
    assert_eq!(response.usage.input_tokens, 10);
}

#[test]
fn completion_without_choices_is_a_transport_error() {
    let body: CompletionResponse =
        serde_json::from_value(json!({"model": "gpt-4o-mini", "choices": []}))
            .expect("body should parse");
    let error = body.into_model_response().expect_err("no choices should fail");
    assert_eq!(error.kind, ProviderErrorKind::Transport);
}

#[test]
fn chunk_decoder_emits_text_and_fragments_then_completes() {
    let mut decoder = ChunkDecoder::new("gpt-4o-mini");

    let first = decoder
        .decode(r#"{"model":"gpt-4o-mini-2024","choices":[{"delta":{"role":"assistant","content":"Hi"}}]}"#)
        .expect("chunk should decode");
    assert_eq!(first, vec![StreamEvent::TextDelta("Hi".to_string())]);

    let second = decoder
        .decode(r#"{"choices":[{"delta":{"content":null,"tool_calls":[{"index":0,"id":"call_1","function":{"name":"web_search"}}]}}]}"#)
        .expect("chunk should decode");
    assert_eq!(
        second,
        vec![StreamEvent::ToolCallDelta(
            ToolCallFragment::new(0).with_id("call_1").with_name("web_search")
        )]
    );

    let last = decoder
        .decode(r#"{"choices":[{"delta":{"tool_calls":null},"finish_reason":"tool_calls"}]}"#)
        .expect("chunk should decode");
    assert!(last.is_empty());

    assert_eq!(
        decoder.finish(),
        StreamEvent::ResponseComplete {
            model: "gpt-4o-mini-2024".to_string(),
            stop_reason: StopReason::ToolUse,
        }
    );
}

#[test]
fn chunk_decoder_rejects_malformed_payloads() {
    let mut decoder = ChunkDecoder::new("gpt-4o-mini");
    let error = decoder.decode("{not json").expect_err("payload should fail");
    assert_eq!(error.kind, ProviderErrorKind::Transport);
    assert_eq!(
        decoder.finish(),
        StreamEvent::ResponseComplete {
            model: "gpt-4o-mini".to_string(),
            stop_reason: StopReason::Other,
        }
    );
}

#[test]
fn api_error_reads_tool_params_structurally() {
    let indexed = ApiError::parse(
        r#"{"error":{"message":"bad schema","param":"tools[0].function.parameters","code":null}}"#,
    )
    .expect("envelope should parse");
    assert!(indexed.rejects_tools());

    let lookalike = ApiError::parse(
        r#"{"error":{"message":"bad","param":"toolset","code":"unsupported_parameter"}}"#,
    )
    .expect("envelope should parse");
    assert!(!lookalike.rejects_tools());

    let unnamed = ApiError::parse(
        r#"{"error":{"message":"tools are not supported","param":null,"code":"tools_not_supported"}}"#,
    )
    .expect("envelope should parse");
    assert!(unnamed.rejects_tools());

    assert!(ApiError::parse("<html>bad gateway</html>").is_none());
}

#[test]
fn classify_error_detects_rejected_tools_param() {
    let body = r#"{"error":{"message":"tools is not supported with this model","type":"invalid_request_error","param":"tools","code":null}}"#;
    let error = classify_error(StatusCode::BAD_REQUEST, body);
    assert_eq!(error.kind, ProviderErrorKind::ToolsUnsupported);
    assert_eq!(error.message, "tools is not supported with this model");
}

#[test]
fn classify_error_ignores_tool_words_in_message_text() {
    let body = r#"{"error":{"message":"messages mention tools and functions","type":"invalid_request_error","param":"messages","code":"invalid_value"}}"#;
    let error = classify_error(StatusCode::BAD_REQUEST, body);
    assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
}

#[test]
fn classify_error_only_reports_tool_rejection_for_request_errors() {
    let body = r#"{"error":{"message":"overloaded","param":"tools","code":null}}"#;
    let error = classify_error(StatusCode::SERVICE_UNAVAILABLE, body);
    assert_eq!(error.kind, ProviderErrorKind::Unavailable);
    assert!(error.is_retryable());
}

#[test]
fn classify_error_maps_statuses() {
    let cases = [
        (StatusCode::UNAUTHORIZED, ProviderErrorKind::Authentication),
        (StatusCode::FORBIDDEN, ProviderErrorKind::Authentication),
        (StatusCode::TOO_MANY_REQUESTS, ProviderErrorKind::RateLimited),
        (StatusCode::GATEWAY_TIMEOUT, ProviderErrorKind::Timeout),
        (StatusCode::BAD_GATEWAY, ProviderErrorKind::Unavailable),
        (StatusCode::INTERNAL_SERVER_ERROR, ProviderErrorKind::Transport),
    ];
    for (status, kind) in cases {
        assert_eq!(classify_error(status, "").kind, kind, "status {status}");
    }

    let fallback = classify_error(StatusCode::INTERNAL_SERVER_ERROR, "oops");
    assert!(fallback.message.contains("500"));
}

#[test]
fn openai_keys_are_resolved_from_credentials() {
    let credentials = SecureCredentialManager::new();
    let missing = resolve_openai_key(&credentials).expect_err("no key yet");
    assert_eq!(missing.kind, ProviderErrorKind::Authentication);

    credentials
        .set_openai_api_key("proj-key-123")
        .expect("unprefixed key should be stored");
    let key = resolve_openai_key(&credentials).expect("key should resolve");
    assert_eq!(key.expose(), "proj-key-123");

    assert!(looks_like_openai_key("  sk-abc"));
    assert!(!looks_like_openai_key("proj-key-123"));
}

#[test]
fn set_openai_api_key_rejects_blank_keys() {
    let credentials = SecureCredentialManager::new();
    let error = credentials
        .set_openai_api_key("   ")
        .expect_err("blank key should fail");
    assert_eq!(error.kind, ProviderErrorKind::Authentication);
}
