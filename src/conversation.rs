//! UI-agnostic conversation state
//!
//! Holds the message history, the input buffer and the busy flag, and applies
//! the submit / settle transitions. Nothing here knows about the terminal or
//! the HTTP client, so the whole request lifecycle can be driven from tests.

use serde::{Deserialize, Serialize};

use crate::endpoint::EndpointError;

pub const DEFAULT_GREETING: &str = "🤖 Hi! I'm OptiBuy Assistant. What product are you looking for?";
pub const NO_RESPONSE_TEXT: &str = "⚠️ The assistant didn't return a response.";
pub const UNREACHABLE_TEXT: &str = "🚫 Server not reachable.";

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One line of conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { sender: Sender::User, text: text.into() }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self { sender: Sender::Bot, text: text.into() }
    }
}

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    pub input: String,
    busy: bool,
    // Length of `messages` last time the renderer asked for a scroll
    scrolled_len: usize,
}

impl Conversation {
    /// Start a conversation seeded with a single bot greeting.
    ///
    /// A blank greeting falls back to [`DEFAULT_GREETING`].
    pub fn new(greeting: &str) -> Self {
        let greeting = if greeting.trim().is_empty() {
            DEFAULT_GREETING
        } else {
            greeting
        };

        Self {
            messages: vec![Message::bot(greeting)],
            input: String::new(),
            busy: false,
            scrolled_len: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Whether the submit control is enabled
    pub fn can_submit(&self) -> bool {
        !self.busy && !self.input.trim().is_empty()
    }

    /// Take the current input and move into the sending state.
    ///
    /// Returns the text to send to the endpoint, or `None` when the input is
    /// blank or a request is already outstanding. In the `None` case nothing
    /// about the conversation changes.
    pub fn submit(&mut self) -> Option<String> {
        if !self.can_submit() {
            return None;
        }

        let text = std::mem::take(&mut self.input);
        self.push(Message::user(text.clone()));
        self.busy = true;
        Some(text)
    }

    /// Fold the endpoint outcome into the history and return to idle.
    ///
    /// Ignored when no request is outstanding.
    pub fn settle(&mut self, outcome: Result<String, EndpointError>) {
        if !self.busy {
            return;
        }

        let reply = match outcome {
            Ok(text) => text,
            Err(e) if e.is_transport() => UNREACHABLE_TEXT.to_string(),
            Err(_) => NO_RESPONSE_TEXT.to_string(),
        };
        self.push(Message::bot(reply));
        self.busy = false;
    }

    /// One-shot hook: true once after each growth of the message sequence.
    pub fn take_scroll_request(&mut self) -> bool {
        if self.messages.len() > self.scrolled_len {
            self.scrolled_len = self.messages.len();
            true
        } else {
            false
        }
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_GREETING)
    }
}
