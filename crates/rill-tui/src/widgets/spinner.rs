//! Status-bar indicator for a question in flight

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};
use std::time::{Duration, Instant};

const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_DURATION: Duration = Duration::from_millis(80);

/// Glyph for an animation tick, shared with the message list
pub(crate) fn glyph(tick: usize) -> &'static str {
    FRAMES[tick % FRAMES.len()]
}

/// Turning glyph, phase label, seconds elapsed and a dimmed hint
pub struct Spinner<'a> {
    label: &'a str,
    hint: Option<&'a str>,
    theme: &'a Theme,
    started: Instant,
}

impl<'a> Spinner<'a> {
    pub fn new(label: &'a str, theme: &'a Theme) -> Self {
        Self {
            label,
            hint: None,
            theme,
            started: Instant::now(),
        }
    }

    /// Animate and time from when the question was sent
    pub fn with_start_time(mut self, start: Instant) -> Self {
        self.started = start;
        self
    }

    pub fn with_hint(mut self, hint: &'a str) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Animation tick for the time elapsed since `start`
    pub fn frame_index(start: Instant) -> usize {
        (start.elapsed().as_millis() / FRAME_DURATION.as_millis()) as usize
    }
}

impl Widget for Spinner<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 3 {
            return;
        }

        let mut spans = vec![Span::styled(
            format!("{} {}", glyph(Self::frame_index(self.started)), self.label),
            self.theme.accent_style(),
        )];
        let secs = self.started.elapsed().as_secs();
        if secs > 0 {
            spans.push(Span::styled(format!(" {}s", secs), self.theme.dim_style()));
        }
        if let Some(hint) = self.hint {
            spans.push(Span::styled(format!(" ({})", hint), self.theme.dim_style()));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
