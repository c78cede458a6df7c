//! Message list widget for displaying the conversation

use crate::theme::Theme;
use chrono::{DateTime, Local, Utc};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use rill_client::{Author, Message};

/// Who a displayed entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
    /// Local notices: command output, errors
    System,
}

/// A single entry in the chat view
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub sources: Vec<String>,
    /// Whether this answer is still arriving
    pub is_streaming: bool,
    /// Set on answers that were cut short
    pub interrupted: bool,
    pub is_error: bool,
}

impl ChatMessage {
    fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp: Utc::now(),
            sources: Vec::new(),
            is_streaming: false,
            interrupted: false,
            is_error: false,
        }
    }

    /// Build a view entry from a conversation message
    pub fn from_message(message: &Message) -> Self {
        let speaker = match message.author {
            Author::User => Speaker::User,
            Author::Assistant => Speaker::Assistant,
        };
        Self {
            speaker,
            text: message.text.clone(),
            timestamp: message.timestamp,
            sources: message.sources().to_vec(),
            is_streaming: message.author == Author::Assistant && !message.is_finalized(),
            interrupted: false,
            is_error: false,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text)
    }

    /// An answer that is still streaming
    pub fn assistant_streaming(text: impl Into<String>) -> Self {
        Self {
            is_streaming: true,
            ..Self::new(Speaker::Assistant, text)
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Speaker::System, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::new(Speaker::System, text)
        }
    }
}

/// Widget for displaying a list of chat messages
pub struct MessageList<'a> {
    messages: &'a [ChatMessage],
    theme: &'a Theme,
    scroll: usize,
    /// Frame index for the waiting indicator
    tick: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(messages: &'a [ChatMessage], theme: &'a Theme) -> Self {
        Self {
            messages,
            theme,
            scroll: 0,
            tick: 0,
        }
    }

    /// Set scroll offset in lines
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Set the animation frame for answers that have no text yet
    pub fn tick(mut self, tick: usize) -> Self {
        self.tick = tick;
        self
    }

    fn render_message(&self, msg: &ChatMessage, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let (name, style, prefix) = match msg.speaker {
            Speaker::User => (Author::User.name(), self.theme.accent_bold(), "▶ "),
            Speaker::Assistant => (Author::Assistant.name(), self.theme.assistant_bold(), "◀ "),
            Speaker::System if msg.is_error => ("Error", self.theme.error_style(), "● "),
            Speaker::System => ("rill", self.theme.dim_style(), "● "),
        };

        let mut header = vec![Span::styled(format!("{}{}", prefix, name), style)];
        if msg.speaker != Speaker::System {
            let time = msg.timestamp.with_timezone(&Local).format("%H:%M");
            header.push(Span::styled(format!("  {}", time), self.theme.dim_style()));
        }
        if msg.is_streaming {
            header.push(Span::styled(" ▌", style));
        }
        lines.push(Line::from(header));

        let content_width = width.saturating_sub(2).max(1);
        if msg.is_streaming && msg.text.is_empty() {
            let frame = super::spinner::glyph(self.tick);
            lines.push(Line::from(Span::styled(
                format!("  {} waiting for answer...", frame),
                self.theme.warning_style(),
            )));
        } else {
            let content_style = if msg.is_error {
                self.theme.error_style()
            } else if msg.speaker == Speaker::System {
                self.theme.dim_style()
            } else {
                self.theme.base_style()
            };
            lines.extend(wrap_lines(&msg.text, content_width, "  ", content_style));
        }

        if msg.interrupted {
            lines.push(Line::from(Span::styled(
                "  [answer interrupted]",
                self.theme.warning_style(),
            )));
        }

        if !msg.sources.is_empty() {
            lines.push(Line::from(Span::styled("  Sources:", self.theme.dim_style())));
            for source in &msg.sources {
                lines.extend(wrap_lines(
                    source,
                    content_width.saturating_sub(2).max(1),
                    "    • ",
                    self.theme.sources_style(),
                ));
            }
        }

        lines.push(Line::from(""));
        lines
    }
}

/// Wrap text to a width, keeping blank lines and indenting every row
fn wrap_lines(text: &str, width: usize, indent: &str, style: Style) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        if paragraph.is_empty() {
            lines.push(Line::from(""));
            continue;
        }
        for row in textwrap::wrap(paragraph, width) {
            lines.push(Line::from(Span::styled(format!("{}{}", indent, row), style)));
        }
    }
    if lines.is_empty() {
        lines.push(Line::from(""));
    }
    lines
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let width = area.width as usize;
        let visible: Vec<Line> = self
            .messages
            .iter()
            .flat_map(|msg| self.render_message(msg, width))
            .skip(self.scroll)
            .take(area.height as usize)
            .collect();

        Paragraph::new(visible).render(area, buf);
    }
}

/// Total height of the rendered messages at a width
pub fn calculate_message_height(messages: &[ChatMessage], width: usize) -> usize {
    let theme = Theme::dark();
    let list = MessageList::new(messages, &theme);
    messages
        .iter()
        .map(|msg| list.render_message(msg, width).len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_from_finalized_message() {
        let mut message = Message::assistant("The answer is 4.");
        message.sources = Some(vec!["math:arith".into()]);

        let entry = ChatMessage::from_message(&message);
        assert_eq!(entry.speaker, Speaker::Assistant);
        assert!(!entry.is_streaming);
        assert_eq!(entry.sources, vec!["math:arith".to_string()]);
    }

    #[test]
    fn test_unfinalized_answer_is_streaming() {
        let entry = ChatMessage::from_message(&Message::assistant("The "));
        assert!(entry.is_streaming);
        assert!(!ChatMessage::from_message(&Message::user("q")).is_streaming);
    }

    #[test]
    fn test_sources_render_under_answer() {
        let theme = Theme::dark();
        let mut entry = ChatMessage::assistant_streaming("Paris is the capital.");
        entry.is_streaming = false;
        entry.sources = vec!["wiki:France".into(), "wiki:Paris".into()];

        let list = MessageList::new(std::slice::from_ref(&entry), &theme);
        let lines = text_of(&list.render_message(&entry, 60));

        assert!(lines[0].starts_with("◀ Assistant"));
        assert_eq!(lines[1], "  Paris is the capital.");
        assert_eq!(lines[2], "  Sources:");
        assert_eq!(lines[3], "    • wiki:France");
        assert_eq!(lines[4], "    • wiki:Paris");
        assert_eq!(lines[5], "");
    }

    #[test]
    fn test_empty_streaming_answer_shows_waiting() {
        let theme = Theme::dark();
        let entry = ChatMessage::assistant_streaming("");
        let list = MessageList::new(std::slice::from_ref(&entry), &theme);
        let lines = text_of(&list.render_message(&entry, 60));
        assert!(lines[0].ends_with("▌"));
        assert!(lines[1].contains("waiting for answer"));
    }

    #[test]
    fn test_wrapping_keeps_paragraphs() {
        let lines = wrap_lines("one two three\n\nfour", 7, "  ", Style::default());
        assert_eq!(text_of(&lines), vec!["  one two", "  three", "", "  four"]);
    }

    #[test]
    fn test_height_matches_rendered_lines() {
        let messages = vec![
            ChatMessage::user("What is 2+2?"),
            ChatMessage::system("Namespace set to Pregnancy"),
        ];
        // header + text + separator each
        assert_eq!(calculate_message_height(&messages, 80), 6);
    }
}
