//! Local token streamer: paces a completed reply into the store one display
//! token at a time.
//!
//! The backend returns whole replies; it defines no chunked streaming
//! protocol. This module reproduces the incremental-rendering feel on the
//! client: split the final text into tokens, append them in order, finish
//! the message. Concatenating the tokens always reproduces the input
//! exactly, whitespace included.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::store::{ChatStore, MessageId};

/// One display token as it is appended, mirrored to an optional channel so a
/// UI can render it live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEvent {
    pub text: String,
    pub index: usize,
}

/// Split `text` into maximal runs of whitespace / non-whitespace.
///
/// The runs concatenate back to `text` byte for byte, so append order is the
/// only thing that matters for correctness.
pub fn split_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_whitespace = None;

    for ch in text.chars() {
        let ws = ch.is_whitespace();
        if in_whitespace != Some(ws) && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        in_whitespace = Some(ws);
        current.push(ch);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Append `text` to the identified assistant message token by token, then
/// finish it.
///
/// `pace` is the delay between tokens; `Duration::ZERO` skips sleeping
/// entirely. When `events` is set, every appended token is also sent there;
/// send failures are ignored (the UI side may have hung up).
pub async fn stream_into(
    store: &mut ChatStore,
    id: MessageId,
    text: &str,
    pace: Duration,
    events: Option<&mpsc::UnboundedSender<TokenEvent>>,
) {
    for (index, token) in split_tokens(text).into_iter().enumerate() {
        if index > 0 && !pace.is_zero() {
            tokio::time::sleep(pace).await;
        }
        store.append_token(id, &token);
        if let Some(tx) = events {
            let _ = tx.send(TokenEvent { text: token, index });
        }
    }
    store.finish_assistant(id);
}
