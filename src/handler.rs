use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::App;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply(outcome) => app.settle(outcome),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Keys that work whether or not a request is outstanding
    match key.code {
        KeyCode::Char('c') if ctrl => {
            app.should_quit = true;
            return;
        }
        KeyCode::Esc => {
            app.should_quit = true;
            return;
        }
        KeyCode::Enter => {
            app.submit();
            return;
        }
        KeyCode::PageUp => {
            app.scroll_up(page(app));
            return;
        }
        KeyCode::PageDown => {
            app.scroll_down(page(app));
            return;
        }
        KeyCode::Up => {
            app.scroll_up(1);
            return;
        }
        KeyCode::Down => {
            app.scroll_down(1);
            return;
        }
        KeyCode::End if ctrl => {
            app.scroll_to_latest();
            return;
        }
        _ => {}
    }

    // The input control is disabled while waiting for a reply
    if app.conversation.is_busy() {
        return;
    }

    match key.code {
        KeyCode::Backspace => app.input_backspace(),
        KeyCode::Delete => app.input_delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) if !ctrl => app.input_insert(c),
        _ => {}
    }
}

fn page(app: &App) -> u16 {
    (app.chat_height / 2).max(1)
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);

    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Message, DEFAULT_GREETING, NO_RESPONSE_TEXT, UNREACHABLE_TEXT};
    use crate::endpoint::ChatClient;
    use reqwest::Url;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app_for(url: &str) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = ChatClient::new(Url::parse(url).unwrap());
        (App::new(client, DEFAULT_GREETING, "OptiBuy", tx), rx)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))).unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    /// Wait for the background request and feed its outcome back in
    async fn deliver_reply(app: &mut App, rx: &mut mpsc::UnboundedReceiver<AppEvent>) {
        let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("reply should arrive")
            .expect("channel open");
        assert!(matches!(event, AppEvent::Reply(_)));
        handle_event(app, event).unwrap();
    }

    async fn mock_reply(server: &MockServer, message: &str, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(body_json(json!({ "message": message })))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_successful_reply() {
        let server = MockServer::start().await;
        mock_reply(
            &server,
            "laptop",
            json!({ "success": true, "data": { "response": "Here are some laptops" } }),
        )
        .await;

        let (mut app, mut rx) = app_for(&format!("{}/api/chat", server.uri()));
        type_text(&mut app, "laptop");
        press(&mut app, KeyCode::Enter);

        assert!(app.conversation.is_busy());
        assert!(app.conversation.input.is_empty());
        assert_eq!(app.input_cursor, 0);

        deliver_reply(&mut app, &mut rx).await;

        assert_eq!(
            app.conversation.messages(),
            &[
                Message::bot(DEFAULT_GREETING),
                Message::user("laptop"),
                Message::bot("Here are some laptops"),
            ]
        );
        assert!(!app.conversation.is_busy());
    }

    #[tokio::test]
    async fn test_success_false_shows_no_response() {
        let server = MockServer::start().await;
        mock_reply(&server, "phone", json!({ "success": false })).await;

        let (mut app, mut rx) = app_for(&server.uri());
        type_text(&mut app, "phone");
        press(&mut app, KeyCode::Enter);
        deliver_reply(&mut app, &mut rx).await;

        let messages = app.conversation.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], Message::user("phone"));
        assert_eq!(messages[2], Message::bot(NO_RESPONSE_TEXT));
        assert!(!app.conversation.is_busy());
    }

    #[tokio::test]
    async fn test_network_error_shows_unreachable() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let (mut app, mut rx) = app_for(&format!("http://127.0.0.1:{}/api/chat", port));

        for text in ["tablet", "tablet"] {
            type_text(&mut app, text);
            press(&mut app, KeyCode::Enter);
            deliver_reply(&mut app, &mut rx).await;
        }

        let messages = app.conversation.messages();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[1], Message::user("tablet"));
        assert_eq!(messages[2], Message::bot(UNREACHABLE_TEXT));
        assert_eq!(messages[4], messages[2]);
        assert!(!app.conversation.is_busy());
    }

    #[tokio::test]
    async fn test_submit_while_busy_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "data": { "response": "ok" } }))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (mut app, mut rx) = app_for(&server.uri());
        type_text(&mut app, "laptop");
        press(&mut app, KeyCode::Enter);
        assert!(app.conversation.is_busy());

        // Typing is disabled while busy
        type_text(&mut app, "phone");
        assert!(app.conversation.input.is_empty());

        app.conversation.input = "phone".to_string();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.conversation.messages().len(), 2);
        assert_eq!(app.conversation.input, "phone");

        deliver_reply(&mut app, &mut rx).await;
        assert_eq!(app.conversation.messages().len(), 3);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_blank_enter_is_noop() {
        let (mut app, mut rx) = app_for("http://127.0.0.1:9/api/chat");
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.conversation.messages().len(), 1);
        assert!(!app.conversation.is_busy());
        assert_eq!(app.conversation.input, "   ");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _rx) = app_for("http://127.0.0.1:9/api/chat");
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);

        let (mut app, _rx) = app_for("http://127.0.0.1:9/api/chat");
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        handle_event(&mut app, AppEvent::Key(ctrl_c)).unwrap();
        assert!(app.should_quit);
        assert!(app.conversation.input.is_empty());
    }

    #[test]
    fn test_mouse_scroll_only_inside_chat() {
        let (mut app, _rx) = app_for("http://127.0.0.1:9/api/chat");
        app.chat_width = 10;
        app.chat_height = 2;
        app.chat_area = Some(Rect::new(0, 1, 12, 4));
        app.sync_scroll();
        let bottom = app.chat_scroll;
        assert!(bottom > 0);

        let scroll = |column, row| MouseEvent {
            kind: MouseEventKind::ScrollUp,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };

        handle_event(&mut app, AppEvent::Mouse(scroll(30, 30))).unwrap();
        assert_eq!(app.chat_scroll, bottom);

        handle_event(&mut app, AppEvent::Mouse(scroll(2, 2))).unwrap();
        assert_eq!(app.chat_scroll, bottom.saturating_sub(3));
    }

    #[test]
    fn test_resize_keeps_state() {
        let (mut app, _rx) = app_for("http://127.0.0.1:9/api/chat");
        type_text(&mut app, "lap");
        handle_event(&mut app, AppEvent::Resize).unwrap();

        assert_eq!(app.conversation.input, "lap");
        assert_eq!(app.input_cursor, 3);
        assert_eq!(app.conversation.messages().len(), 1);
        assert!(!app.should_quit);
    }
}
