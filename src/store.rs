//! In-memory message log for one active session.
//!
//! The store is the single owner of the log: UI layers read from it and the
//! conversation driver mutates it through the operations below. Assistant
//! messages move through `created(streaming) → [token appended]* → finished`
//! and nothing else; once finished, content never changes again.

use uuid::Uuid;

use crate::api::{Message, Role};

/// Unique handle to one message within a store's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry in the log.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub streaming: bool,
}

impl StoredMessage {
    /// Wire form of this entry (drops the local id and streaming flag).
    pub fn to_message(&self) -> Message {
        Message {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Ordered, append-only message log. Construct one per active session and
/// pass it by reference to whatever renders it; there is no global instance.
#[derive(Debug, Default)]
pub struct ChatStore {
    messages: Vec<StoredMessage>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[StoredMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Replace the log with a fetched history. Server history is already
    /// final, so every entry lands finished.
    pub fn load_history(&mut self, history: Vec<Message>) {
        self.messages = history
            .into_iter()
            .map(|m| StoredMessage {
                id: MessageId::generate(),
                role: m.role,
                content: m.content,
                streaming: false,
            })
            .collect();
    }

    /// Append an immutable user message.
    pub fn push_user(&mut self, text: impl Into<String>) -> MessageId {
        let id = MessageId::generate();
        self.messages.push(StoredMessage {
            id,
            role: Role::User,
            content: text.into(),
            streaming: false,
        });
        id
    }

    /// Append an empty assistant message in the streaming state.
    pub fn begin_assistant(&mut self) -> MessageId {
        let id = MessageId::generate();
        self.messages.push(StoredMessage {
            id,
            role: Role::Assistant,
            content: String::new(),
            streaming: true,
        });
        id
    }

    /// Append a finished assistant message in one step (history seeds,
    /// canned greetings).
    pub fn push_assistant(&mut self, text: impl Into<String>) -> MessageId {
        let id = self.begin_assistant();
        let text = text.into();
        self.append_token(id, &text);
        self.finish_assistant(id);
        id
    }

    /// Concatenate `fragment` onto the identified message. Silent no-op when
    /// the id is unknown or the message is already finished.
    pub fn append_token(&mut self, id: MessageId, fragment: &str) {
        if let Some(msg) = self.messages.iter_mut().find(|m| m.id == id) {
            if msg.streaming {
                msg.content.push_str(fragment);
            }
        }
    }

    /// Close the identified assistant message; its content is immutable from
    /// here on. Idempotent, and a no-op for unknown ids.
    pub fn finish_assistant(&mut self, id: MessageId) {
        if let Some(msg) = self.messages.iter_mut().find(|m| m.id == id) {
            msg.streaming = false;
        }
    }

    pub fn get(&self, id: MessageId) -> Option<&StoredMessage> {
        self.messages.iter().find(|m| m.id == id)
    }
}
