use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use unicode_width::UnicodeWidthChar;
use crate::app::App;
use crate::conversation::Sender;

const PLACEHOLDER: &str = "Ask for a product...";

/// Convert `**bold**` spans in a line of bot text to styled spans.
///
/// An unmatched `**` is kept as literal text.
fn markdown_line(text: &str) -> Line<'_> {
    let parts: Vec<&str> = text.split("**").collect();
    // An odd number of parts means every `**` has a partner
    let paired = if parts.len() % 2 == 1 { parts.len() } else { parts.len() - 1 };

    let mut spans: Vec<Span> = Vec::new();
    for (i, part) in parts[..paired].iter().enumerate() {
        if i % 2 == 0 {
            if !part.is_empty() {
                spans.push(Span::raw(*part));
            }
        } else if part.is_empty() {
            spans.push(Span::raw("****"));
        } else {
            spans.push(Span::styled(*part, Style::default().add_modifier(Modifier::BOLD)));
        }
    }

    if paired < parts.len() {
        spans.push(Span::raw(format!("**{}", parts[paired])));
    }

    Line::from(spans)
}

fn sender_label(sender: Sender) -> Line<'static> {
    let (label, color) = match sender {
        Sender::User => ("You:", Color::Cyan),
        Sender::Bot => ("Bot:", Color::Yellow),
    };
    Line::from(Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

/// Chat history exactly as it is drawn, minus the surrounding block.
///
/// Also used to measure the wrapped height for scrolling.
pub fn chat_paragraph(app: &App) -> Paragraph<'_> {
    let mut lines: Vec<Line> = Vec::new();

    for msg in app.conversation.messages() {
        lines.push(sender_label(msg.sender));
        match msg.sender {
            Sender::User => lines.push(Line::from(msg.text.as_str())),
            Sender::Bot => lines.extend(msg.text.lines().map(markdown_line)),
        }
        lines.push(Line::default());
    }

    if app.conversation.is_busy() {
        lines.push(sender_label(Sender::Bot));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    // No trimming: user text is shown as typed, leading spaces included
    Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false })
}

/// Visible slice of the input and the cursor column within it.
///
/// Works in display columns, so wide characters keep the cursor aligned.
fn input_view(input: &str, cursor: usize, width: usize) -> (String, u16) {
    let chars: Vec<char> = input.chars().collect();
    let cursor = cursor.min(chars.len());
    let char_width = |c: &char| c.width().unwrap_or(0);

    let mut start = 0;
    let mut cursor_col: usize = chars[..cursor].iter().map(char_width).sum();
    while width > 0 && cursor_col >= width && start < cursor {
        cursor_col -= char_width(&chars[start]);
        start += 1;
    }

    (chars[start..].iter().collect(), cursor_col as u16)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let host = app.client().url().host_str().unwrap_or_default().to_string();

    let title = Line::from(vec![
        Span::styled(format!(" {} ", app.title), Style::default().fg(Color::Cyan).bold()),
        Span::styled(host, Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(title), area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing and inner size for scroll calculations
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);
    app.sync_scroll();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    let total = app.total_chat_lines();
    let chat = chat_paragraph(app)
        .block(block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);

    if total > app.chat_height {
        let mut scrollbar_state = ScrollbarState::new(total.saturating_sub(app.chat_height) as usize)
            .position(app.chat_scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let busy = app.conversation.is_busy();

    let border_color = if busy { Color::DarkGray } else { Color::Yellow };
    let send_style = if app.conversation.can_submit() {
        Style::default().fg(Color::Green).bold()
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ")
        .title_bottom(Line::from(Span::styled(" Send ⏎ ", send_style)).right_aligned());

    if app.conversation.input.is_empty() {
        let placeholder = Paragraph::new(PLACEHOLDER)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);

        if !busy {
            frame.set_cursor_position((area.x + 1, area.y + 1));
        }
        return;
    }

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_col) = input_view(&app.conversation.input, app.input_cursor, inner_width);

    let text_color = if busy { Color::DarkGray } else { Color::Cyan };
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(text_color))
        .block(block);

    frame.render_widget(input, area);

    if !busy {
        frame.set_cursor_position((area.x + cursor_col + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = Vec::new();

    // Status goes first so narrow terminals cut the hints, not the status
    if app.conversation.is_busy() {
        spans.push(Span::styled(
            " waiting for reply ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ));
    }

    spans.extend([
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Ctrl+End ", key_style),
        Span::styled(" latest ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
