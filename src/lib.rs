pub mod api;
pub mod cli;
pub mod config;
pub mod request;
pub mod store;
pub mod stream;

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use api::{AssistantReply, SessionApi, SessionId};
use request::RequestError;
use store::{ChatStore, MessageId};
use stream::TokenEvent;

pub use api::{Critique, Message, Role};
pub use config::ClientConfig;
pub use request::{ApiError, Deadline, TIMEOUT_STATUS};

/// Seeded into an otherwise empty log so the chat never opens blank. Pure
/// presentation; the server never sees it.
pub const GREETING: &str =
    "Welcome to the debate. Make your opening argument whenever you're ready.";

// ---------------------------------------------------------------------------
// Turn routing
// ---------------------------------------------------------------------------

/// Which endpoint a conversation's turns go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentMode {
    /// Regular debate turn against the session's agent persona.
    Standard,
    /// "Why" exploration: the server probes the motivation behind the input.
    Why,
}

impl AgentMode {
    /// The why agent has its own endpoint; every other persona shares the
    /// regular message endpoint.
    pub fn from_agent_type(agent_type: Option<&str>) -> Self {
        match agent_type {
            Some("why") => AgentMode::Why,
            _ => AgentMode::Standard,
        }
    }
}

/// Map a failed turn to the inline text shown in its place. Every failure
/// class gets a distinct, recoverable message; nothing here is fatal.
pub fn failure_text(err: &RequestError) -> String {
    match err {
        RequestError::Api(api) if api.is_timeout() => {
            "The agent took too long to respond. Please try again.".to_string()
        }
        RequestError::Api(api) if api.status == 401 => {
            "Session expired. Start a new session and try again.".to_string()
        }
        RequestError::Api(api) => format!("Server error ({}): {}", api.status, api.message),
        RequestError::Transport(_) => {
            "Network error: could not reach the debate service.".to_string()
        }
        RequestError::Decode(_) => {
            "The service returned a response this client could not read.".to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Conversation: one session's turn loop
// ---------------------------------------------------------------------------

/// Owns the message log for one session and drives complete turns against
/// the API: append the user message, call the backend, stream the reply into
/// the store, and turn failures into inline placeholder messages.
///
/// `send_turn` takes `&mut self`, so one conversation can never have two
/// sends in flight; callers that want concurrency use separate sessions.
pub struct Conversation {
    api: SessionApi,
    store: ChatStore,
    session: SessionId,
    mode: AgentMode,
    /// Delay between streamed tokens. Zero renders replies instantly.
    pub pace: Duration,
    /// When set, every streamed token is mirrored here for live rendering.
    pub token_tx: Option<mpsc::UnboundedSender<TokenEvent>>,
    last_reply: Option<AssistantReply>,
}

impl Conversation {
    /// Create a fresh session around `topic` and seed the greeting.
    ///
    /// Session creation is the one call whose failure the caller must handle
    /// itself; with no session id there is nothing to converse with.
    pub async fn open(
        api: SessionApi,
        topic: &str,
        agent_type: Option<&str>,
    ) -> Result<Self, RequestError> {
        let session = api.create_session(topic, agent_type).await?;
        debug!(%session, topic, "conversation opened");
        let mut store = ChatStore::new();
        store.push_assistant(GREETING);
        Ok(Self {
            api,
            store,
            session,
            mode: AgentMode::from_agent_type(agent_type),
            pace: Duration::ZERO,
            token_tx: None,
            last_reply: None,
        })
    }

    /// Attach to an existing session and load its history.
    ///
    /// History load failure is recovered locally: the log gets a visible
    /// placeholder instead, and the conversation stays usable.
    pub async fn attach(api: SessionApi, session: SessionId, mode: AgentMode) -> Self {
        let mut store = ChatStore::new();
        match api.fetch_history(&session).await {
            Ok(history) if history.is_empty() => {
                store.push_assistant(GREETING);
            }
            Ok(history) => store.load_history(history),
            Err(err) => {
                warn!(%session, error = %err, "history load failed");
                store.push_assistant("Failed to load the conversation history.");
            }
        }
        Self {
            api,
            store,
            session,
            mode,
            pace: Duration::ZERO,
            token_tx: None,
            last_reply: None,
        }
    }

    /// Run one complete turn. Never fails: API errors become classified
    /// placeholder text in the assistant slot, and the store is always left
    /// finished and continuable.
    ///
    /// Returns the id of the assistant message created for this turn.
    pub async fn send_turn(&mut self, text: &str) -> MessageId {
        self.store.push_user(text);
        let assistant = self.store.begin_assistant();

        let result = match self.mode {
            AgentMode::Standard => self.api.send_message(&self.session, text).await,
            AgentMode::Why => self.api.send_why(&self.session, text).await,
        };

        match result {
            Ok(reply) => {
                let content = reply.content.clone();
                self.last_reply = Some(reply);
                stream::stream_into(
                    &mut self.store,
                    assistant,
                    &content,
                    self.pace,
                    self.token_tx.as_ref(),
                )
                .await;
            }
            Err(err) => {
                warn!(session = %self.session, error = %err, "turn failed");
                self.last_reply = None;
                stream::stream_into(
                    &mut self.store,
                    assistant,
                    &failure_text(&err),
                    Duration::ZERO,
                    self.token_tx.as_ref(),
                )
                .await;
            }
        }
        assistant
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn mode(&self) -> AgentMode {
        self.mode
    }

    /// The full reply from the most recent successful turn, including the
    /// typed critique payload and any fields this client predates.
    pub fn last_reply(&self) -> Option<&AssistantReply> {
        self.last_reply.as_ref()
    }
}
