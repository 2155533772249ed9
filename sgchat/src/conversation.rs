//! In-memory conversation log for one chat session.

use std::collections::HashSet;

use sgprovider::{Message, Role};

use crate::ChatError;

const HISTORY_PREVIEW_CHARS: usize = 100;

/// Ordered message log. Messages are only ever appended or wiped together.
///
/// Every `tool` message must answer a tool-call id carried by an earlier
/// `assistant` message. System prompts are not stored here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) -> Result<(), ChatError> {
        let known_ids = self.tool_call_ids();
        validate_message(&message, &known_ids)?;
        self.messages.push(message);
        Ok(())
    }

    /// Validates the whole batch first, then extends. Either every message is
    /// appended or none is.
    pub fn append_all(&mut self, messages: Vec<Message>) -> Result<(), ChatError> {
        let mut known_ids = self.tool_call_ids();
        for message in &messages {
            validate_message(message, &known_ids)?;
            known_ids.extend(message.tool_calls.iter().map(|call| call.id.clone()));
        }

        self.messages.extend(messages);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn count(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// One line per message: 1-based index, role label and a content preview.
    pub fn render_history(&self) -> String {
        self.messages
            .iter()
            .enumerate()
            .map(|(index, message)| {
                format!(
                    "{}. {}: {}",
                    index + 1,
                    role_label(message.role),
                    preview(message)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn tool_call_ids(&self) -> HashSet<String> {
        self.messages
            .iter()
            .filter(|message| message.role == Role::Assistant)
            .flat_map(|message| message.tool_calls.iter().map(|call| call.id.clone()))
            .collect()
    }
}

fn validate_message(message: &Message, known_ids: &HashSet<String>) -> Result<(), ChatError> {
    match message.role {
        Role::System => Err(ChatError::conversation(
            "system messages are not stored in the conversation log",
        )),
        Role::Tool => match message.tool_call_id.as_deref() {
            Some(id) if known_ids.contains(id) => Ok(()),
            Some(id) => Err(ChatError::conversation(format!(
                "tool message references unknown tool call '{id}'"
            ))),
            None => Err(ChatError::conversation(
                "tool message is missing its tool_call_id",
            )),
        },
        Role::User | Role::Assistant => Ok(()),
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::System => "System",
        Role::User => "You",
        Role::Assistant => "Assistant",
        Role::Tool => "Tool",
    }
}

fn preview(message: &Message) -> String {
    if message.content.is_none() && message.has_tool_calls() {
        let names = message
            .tool_calls
            .iter()
            .map(|call| call.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        return format!("[tool call: {names}]");
    }

    let text = message.text();
    let mut chars = text.chars();
    let head = chars.by_ref().take(HISTORY_PREVIEW_CHARS).collect::<String>();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use sgprovider::ToolCall;

    use super::*;
    use crate::ChatErrorKind;

    #[test]
    fn user_then_assistant_snapshot_keeps_order() {
        let mut conversation = ConversationState::new();
        conversation.append(Message::user("hi")).expect("user appends");
        conversation
            .append(Message::assistant("hello"))
            .expect("assistant appends");

        let snapshot = conversation.snapshot();
        let roles = snapshot.iter().map(|message| message.role).collect::<Vec<_>>();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut conversation = ConversationState::new();
        conversation.append(Message::user("hi")).expect("user appends");

        conversation.clear();
        let once = conversation.clone();
        conversation.clear();

        assert_eq!(conversation, once);
        assert_eq!(conversation.count(), 0);
        assert!(conversation.is_empty());
    }

    #[test]
    fn tool_messages_must_reference_an_earlier_call() {
        let mut conversation = ConversationState::new();
        let error = conversation
            .append(Message::tool("call_1", "[]"))
            .expect_err("orphan tool message should fail");
        assert_eq!(error.kind, ChatErrorKind::Conversation);

        conversation
            .append(Message::assistant_tool_calls(vec![ToolCall::new(
                "call_1",
                "search_web",
                "{}",
            )]))
            .expect("tool call appends");
        conversation
            .append(Message::tool("call_1", "[]"))
            .expect("answer appends");
        assert_eq!(conversation.count(), 2);
    }

    #[test]
    fn append_all_is_all_or_nothing() {
        let mut conversation = ConversationState::new();
        let error = conversation
            .append_all(vec![
                Message::user("hi"),
                Message::tool("call_missing", "[]"),
            ])
            .expect_err("batch should fail");

        assert_eq!(error.kind, ChatErrorKind::Conversation);
        assert!(conversation.is_empty());

        conversation
            .append_all(vec![
                Message::user("hi"),
                Message::assistant_tool_calls(vec![ToolCall::new("call_1", "search_web", "{}")]),
                Message::tool("call_1", "[]"),
                Message::assistant("done"),
            ])
            .expect("batch should append");
        assert_eq!(conversation.count(), 4);
    }

    #[test]
    fn system_messages_are_rejected() {
        let mut conversation = ConversationState::new();
        assert!(conversation.append(Message::system("be brief")).is_err());
    }

    #[test]
    fn render_history_truncates_long_content_for_display_only() {
        let long = "x".repeat(120);
        let mut conversation = ConversationState::new();
        conversation.append(Message::user("short")).expect("append");
        conversation
            .append(Message::assistant(long.clone()))
            .expect("append");

        let rendered = conversation.render_history();
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "1. You: short");
        assert_eq!(lines[1], format!("2. Assistant: {}...", "x".repeat(100)));
        assert_eq!(conversation.messages()[1].text(), long);
    }

    #[test]
    fn render_history_counts_characters_not_bytes() {
        let mut conversation = ConversationState::new();
        conversation
            .append(Message::user("é".repeat(100)))
            .expect("append");

        assert_eq!(conversation.render_history(), format!("1. You: {}", "é".repeat(100)));
    }
}
