//! Stateless session API client: typed calls onto the debate backend.
//!
//! Wire field names (`session_id`, `content`, `role`, `initial_agent_type`,
//! `input`, `response`, `last_critic_output`) match the backend contract and
//! must not be renamed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::ClientConfig;
use crate::request::{Backend, Deadline, RequestError};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One chat turn as the backend stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Opaque server-assigned session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structured critic output attached to some assistant replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    pub critique_point: String,
    pub brief_elaboration: String,
    #[serde(default)]
    pub request_search_query: Option<String>,
}

/// The assistant's reply to one sent message.
///
/// Beyond `role` and `content`, agent implementations attach extra fields.
/// The critic's structured payload is surfaced typed; anything else lands in
/// `extra` unchanged so callers never lose fields this client predates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub role: Role,
    pub content: String,
    #[serde(
        rename = "last_critic_output",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub critique: Option<Critique>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AssistantReply {
    fn from_text(content: String) -> Self {
        Self {
            role: Role::Assistant,
            content,
            critique: None,
            extra: Map::new(),
        }
    }
}

// -- Request/response bodies ------------------------------------------------

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    topic: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    initial_agent_type: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct WhyRequest<'a> {
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct WhyResponse {
    response: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Thin translation layer between typed calls and the HTTP contract. Owns no
/// session state.
#[derive(Debug, Clone)]
pub struct SessionApi {
    backend: Backend,
    standard: Deadline,
    reasoning: Deadline,
}

impl SessionApi {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            backend: Backend::new(&config),
            standard: Deadline::new(config.request_timeout),
            reasoning: Deadline::new(config.reasoning_timeout),
        }
    }

    /// Open a new session around `topic`. The optional agent tag selects the
    /// persona the server starts the session with.
    pub async fn create_session(
        &self,
        topic: &str,
        initial_agent_type: Option<&str>,
    ) -> Result<SessionId, RequestError> {
        let body = CreateSessionRequest {
            topic,
            initial_agent_type,
        };
        let reply: CreateSessionResponse =
            self.backend.post("/sessions", &body, self.standard).await?;
        debug!(session_id = %reply.session_id, "session created");
        Ok(SessionId::new(reply.session_id))
    }

    /// Send one user message and wait for the assistant's turn. This runs an
    /// agent reasoning step on the server, so it uses the long deadline.
    pub async fn send_message(
        &self,
        session: &SessionId,
        content: &str,
    ) -> Result<AssistantReply, RequestError> {
        let path = format!("/sessions/{}/message", session);
        self.backend
            .post(&path, &SendMessageRequest { content }, self.reasoning)
            .await
    }

    /// Why-mode turn: the server probes the motivation behind `input` instead
    /// of debating it. The `{response}` body is mapped to an assistant reply.
    pub async fn send_why(
        &self,
        session: &SessionId,
        input: &str,
    ) -> Result<AssistantReply, RequestError> {
        let path = format!("/sessions/{}/why", session);
        let reply: WhyResponse = self
            .backend
            .post(&path, &WhyRequest { input }, self.reasoning)
            .await?;
        Ok(AssistantReply::from_text(reply.response))
    }

    /// Fetch the ordered message history. An empty list is a valid result
    /// for a fresh session.
    pub async fn fetch_history(&self, session: &SessionId) -> Result<Vec<Message>, RequestError> {
        let path = format!("/sessions/{}/messages", session);
        self.backend.get(&path, self.standard).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).expect("serialize"), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).expect("serialize"),
            "\"assistant\""
        );
    }

    #[test]
    fn test_role_display_matches_wire_form() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_message_roundtrips() {
        let json = r#"{"role":"assistant","content":"**[Review]** point"}"#;
        let msg: Message = serde_json::from_str(json).expect("deserialize");
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "**[Review]** point");
    }

    #[test]
    fn test_session_id_is_transparent() {
        let id: SessionId = serde_json::from_str("\"abc-123\"").expect("deserialize");
        assert_eq!(id.as_str(), "abc-123");
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "\"abc-123\"");
    }

    #[test]
    fn test_create_session_body_omits_absent_agent() {
        let body = CreateSessionRequest {
            topic: "Is technology liberating?",
            initial_agent_type: None,
        };
        let json = serde_json::to_string(&body).expect("serialize");
        assert!(json.contains("\"topic\":\"Is technology liberating?\""));
        assert!(!json.contains("initial_agent_type"));
    }

    #[test]
    fn test_create_session_body_includes_agent_when_set() {
        let body = CreateSessionRequest {
            topic: "t",
            initial_agent_type: Some("critic"),
        };
        let json = serde_json::to_string(&body).expect("serialize");
        assert!(json.contains("\"initial_agent_type\":\"critic\""));
    }

    #[test]
    fn test_send_message_body_field_name() {
        let json =
            serde_json::to_string(&SendMessageRequest { content: "hello" }).expect("serialize");
        assert_eq!(json, r#"{"content":"hello"}"#);
    }

    #[test]
    fn test_why_request_field_name() {
        let json = serde_json::to_string(&WhyRequest { input: "an idea" }).expect("serialize");
        assert_eq!(json, r#"{"input":"an idea"}"#);
    }

    #[test]
    fn test_reply_with_critique_parses_typed() {
        let json = r#"{
            "role": "assistant",
            "content": "**[Review]**",
            "last_critic_output": {
                "critique_point": "unsourced statistic",
                "brief_elaboration": "cite the survey",
                "request_search_query": null
            }
        }"#;
        let reply: AssistantReply = serde_json::from_str(json).expect("deserialize");
        let critique = reply.critique.expect("critique present");
        assert_eq!(critique.critique_point, "unsourced statistic");
        assert!(critique.request_search_query.is_none());
        assert!(reply.extra.is_empty());
    }

    #[test]
    fn test_reply_without_critique() {
        let json = r#"{"role":"assistant","content":"hi"}"#;
        let reply: AssistantReply = serde_json::from_str(json).expect("deserialize");
        assert!(reply.critique.is_none());
        assert!(reply.extra.is_empty());
    }

    #[test]
    fn test_reply_preserves_unknown_fields() {
        let json = r#"{"role":"assistant","content":"hi","turn_index":4,"focus":"sources"}"#;
        let reply: AssistantReply = serde_json::from_str(json).expect("deserialize");
        assert_eq!(reply.extra.get("turn_index"), Some(&Value::from(4)));
        assert_eq!(reply.extra.get("focus"), Some(&Value::from("sources")));
    }

    #[test]
    fn test_reply_serializes_unknown_fields_back() {
        let json = r#"{"role":"assistant","content":"hi","turn_index":4}"#;
        let reply: AssistantReply = serde_json::from_str(json).expect("deserialize");
        let back = serde_json::to_value(&reply).expect("serialize");
        assert_eq!(back["turn_index"], Value::from(4));
        assert_eq!(back["content"], Value::from("hi"));
    }

    #[test]
    fn test_critique_search_query_optional() {
        let json = r#"{"critique_point":"p","brief_elaboration":"e"}"#;
        let critique: Critique = serde_json::from_str(json).expect("deserialize");
        assert!(critique.request_search_query.is_none());
    }

    #[test]
    fn test_from_text_builds_plain_assistant_reply() {
        let reply = AssistantReply::from_text("why do you think so?".to_string());
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "why do you think so?");
        assert!(reply.critique.is_none());
        assert!(reply.extra.is_empty());
    }
}
