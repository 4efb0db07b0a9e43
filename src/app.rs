use ratatui::layout::Rect;

use crate::conversation::Conversation;
use crate::endpoint::{ChatClient, EndpointError};
use crate::tui::{AppEvent, EventSender};
use crate::ui;

pub struct App {
    pub should_quit: bool,
    pub title: String,

    // Conversation state (messages, input buffer, busy flag)
    pub conversation: Conversation,
    pub input_cursor: usize, // cursor position in conversation.input, in chars

    // Chat view scrolling
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of the chat area, set during render
    pub chat_width: u16,  // inner width of the chat area, set during render
    pub follow_latest: bool,

    // Panel area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    client: ChatClient,
    events: EventSender,
}

impl App {
    pub fn new(client: ChatClient, greeting: &str, title: &str, events: EventSender) -> Self {
        Self {
            should_quit: false,
            title: title.to_string(),

            conversation: Conversation::new(greeting),
            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            follow_latest: true,

            chat_area: None,

            animation_frame: 0,

            client,
            events,
        }
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    /// Submit the input buffer and send it to the endpoint in the background.
    ///
    /// The outcome comes back through the event channel as [`AppEvent::Reply`].
    pub fn submit(&mut self) {
        let Some(text) = self.conversation.submit() else {
            return;
        };

        self.input_cursor = 0;
        self.animation_frame = 0;

        tracing::debug!(
            chars = text.chars().count(),
            endpoint = %self.client.url(),
            "Sending chat message"
        );

        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = client.send(&text).await;
            // The run loop may already have shut down
            let _ = events.send(AppEvent::Reply(outcome));
        });
    }

    /// Apply the outcome of the outstanding request.
    pub fn settle(&mut self, outcome: Result<String, EndpointError>) {
        match &outcome {
            Ok(reply) => tracing::info!(chars = reply.chars().count(), "Chat reply received"),
            Err(e) if e.is_transport() => tracing::warn!("Chat endpoint unreachable: {}", e),
            Err(e) => tracing::warn!("{}", e),
        }
        self.conversation.settle(outcome);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Input editing

    pub fn input_insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.conversation.input, self.input_cursor);
        self.conversation.input.insert(byte_pos, c);
        self.input_cursor += 1;
    }

    pub fn input_backspace(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.conversation.input, self.input_cursor);
            self.conversation.input.remove(byte_pos);
        }
    }

    pub fn input_delete(&mut self) {
        if self.input_cursor < self.input_len() {
            let byte_pos = char_to_byte_index(&self.conversation.input, self.input_cursor);
            self.conversation.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.input_cursor = (self.input_cursor + 1).min(self.input_len());
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.input_len();
    }

    fn input_len(&self) -> usize {
        self.conversation.input.chars().count()
    }

    // Chat scrolling

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_latest = self.chat_scroll >= self.max_scroll();
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max_scroll = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max_scroll);
        self.follow_latest = self.chat_scroll >= max_scroll;
    }

    pub fn scroll_to_latest(&mut self) {
        self.follow_latest = true;
        self.chat_scroll = self.max_scroll();
    }

    /// Jump to the newest message whenever the conversation has grown.
    ///
    /// Called by the renderer once the chat area size is known.
    pub fn sync_scroll(&mut self) {
        if self.conversation.take_scroll_request() {
            self.follow_latest = true;
        }
        if self.follow_latest {
            self.chat_scroll = self.max_scroll();
        }
    }

    fn max_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.total_chat_lines().saturating_sub(visible_height)
    }

    /// Rendered height of the chat history, including the "Thinking..." line
    pub fn total_chat_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 50 };

        let total_lines = ui::chat_paragraph(self).line_count(wrap_width);
        total_lines.min(u16::MAX as usize) as u16
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
