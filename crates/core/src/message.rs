//! Conversation entries and the transcript that holds them.
//!
//! The transcript is the literal history sent to the model on every call:
//! user input → assistant reply (optionally carrying tool calls) → one tool
//! entry per call → next assistant reply, and so on. It is append-only; the
//! only way to remove entries is a full [`Conversation::reset`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The model
    Assistant,
    /// Tool execution result
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        f.write_str(s)
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call within the conversation
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a serialized JSON object
    pub arguments: String,
}

impl ToolCall {
    /// Create a tool call with a freshly generated id.
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: generate_call_id(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Generate a tool call id for backends that do not assign their own.
pub fn generate_call_id() -> String {
    format!("call_{}", Uuid::new_v4().simple())
}

/// A single entry in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who produced this entry
    pub role: Role,

    /// The text content. `None` only on assistant entries that carry tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, Some(content.into()))
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, Some(content.into()))
    }

    /// Create an assistant message that requests tool calls.
    pub fn assistant_with_tools(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        let mut msg = Self::new(Role::Assistant, content);
        msg.tool_calls = tool_calls;
        msg
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Tool, Some(content.into()));
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }

    /// The content, or an empty string.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// An append-only, ordered sequence of entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    messages: Vec<Message>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a conversation holding a single seed entry.
    pub fn seeded(seed: Message) -> Self {
        let mut conv = Self::new();
        conv.push(seed);
        conv
    }

    /// Add a message to the conversation.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// Discard every entry and start over from a single seed entry.
    pub fn reset(&mut self, seed: Message) {
        *self = Self::seeded(seed);
    }

    /// All entries in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Content of the most recent user entry.
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(Message::text)
    }

    /// Check that every tool entry answers a call of the nearest preceding
    /// assistant entry, and that no call id is answered twice.
    pub fn tool_pairing_is_valid(&self) -> bool {
        let mut open: Vec<&str> = Vec::new();
        for msg in &self.messages {
            match msg.role {
                Role::Assistant => {
                    open = msg.tool_calls.iter().map(|tc| tc.id.as_str()).collect();
                }
                Role::Tool => {
                    let Some(id) = msg.tool_call_id.as_deref() else {
                        return false;
                    };
                    let Some(pos) = open.iter().position(|o| *o == id) else {
                        return false;
                    };
                    open.remove(pos);
                }
                Role::User => open.clear(),
            }
        }
        true
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_conversation_starts_with_greeting() {
        let conv = Conversation::seeded(Message::assistant("Hello! How can I help?"));
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.messages()[0].role, Role::Assistant);
        assert!(conv.last_user_text().is_none());
    }

    #[test]
    fn push_appends_and_touches() {
        let mut conv = Conversation::new();
        let created = conv.created_at;

        conv.push(Message::user("Interview me for a blog post"));
        conv.push(Message::assistant("What's the topic?"));
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages()[0].text(), "Interview me for a blog post");
        assert!(conv.updated_at >= created);
    }

    #[test]
    fn reset_leaves_single_seed() {
        let mut conv = Conversation::new();
        conv.push(Message::user("one"));
        conv.push(Message::assistant("two"));
        let old_id = conv.id.clone();

        conv.reset(Message::assistant("Welcome back"));
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.messages()[0].text(), "Welcome back");
        assert_ne!(conv.id, old_id);
    }

    #[test]
    fn last_user_text_skips_tool_entries() {
        let mut conv = Conversation::new();
        conv.push(Message::user("search for rust"));
        let call = ToolCall::new("google_search", r#"{"query":"rust"}"#);
        let id = call.id.clone();
        conv.push(Message::assistant_with_tools(None, vec![call]));
        conv.push(Message::tool_result(id, "{}"));
        assert_eq!(conv.last_user_text(), Some("search for rust"));
    }

    #[test]
    fn generated_call_ids_are_unique() {
        let a = ToolCall::new("x", "{}");
        let b = ToolCall::new("x", "{}");
        assert!(a.id.starts_with("call_"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn tool_pairing_detects_orphans() {
        let mut conv = Conversation::new();
        conv.push(Message::user("hi"));
        let call = ToolCall::new("google_search", "{}");
        let id = call.id.clone();
        conv.push(Message::assistant_with_tools(None, vec![call]));
        conv.push(Message::tool_result(&id, "ok"));
        assert!(conv.tool_pairing_is_valid());

        // A second answer to the same call is an orphan.
        conv.push(Message::tool_result(&id, "again"));
        assert!(!conv.tool_pairing_is_valid());
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::assistant_with_tools(None, vec![ToolCall::new("ai_pipe", "{}")]);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("\"content\""));
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.role, Role::Assistant);
        assert_eq!(back.tool_calls.len(), 1);
    }
}
