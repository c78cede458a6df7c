//! TUI implementation for rill

use tokio::sync::mpsc;

use crossterm::event::{Event, EventStream, MouseEventKind};
use futures::StreamExt;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use rill_chat::{Chat, ChatEvent, Phase};
use rill_tui::{
    Theme,
    input::Action,
    widgets::{ChatMessage, InputBox, MessageList, Spinner, message_list::calculate_message_height},
};
use std::time::Instant;

use crate::commands::{CommandResult, execute_command};
use crate::utils::truncate_chars;

/// Messages sent from the UI to the loop that owns the chat
#[derive(Debug, PartialEq, Eq)]
pub enum UiMessage {
    /// User submitted a question
    Submit(String),
    /// Slash command
    Command(String),
    /// User requested clear
    Clear,
    /// User requested quit
    Quit,
}

/// TUI application state
pub struct TuiState {
    /// Entries shown in the message list
    messages: Vec<ChatMessage>,
    /// View index of the answer being streamed
    streaming: Option<usize>,
    input: InputBox,
    /// Scroll offset in lines; `usize::MAX` follows the bottom
    scroll: usize,
    is_processing: bool,
    status: String,
    /// Last error, shown until the next question
    error: Option<String>,
    endpoint: String,
    namespace: Option<String>,
    theme: Theme,
    ui_tx: mpsc::Sender<UiMessage>,
    spinner_start: Instant,
}

impl TuiState {
    pub fn new(
        endpoint: impl Into<String>,
        namespace: Option<String>,
        theme: Theme,
        ui_tx: mpsc::Sender<UiMessage>,
    ) -> Self {
        let mut input = InputBox::new().with_placeholder("Ask a question...");
        input.set_focused(true);

        Self {
            messages: vec![],
            streaming: None,
            input,
            scroll: 0,
            is_processing: false,
            status: "Ready".to_string(),
            error: None,
            endpoint: endpoint.into(),
            namespace,
            theme,
            ui_tx,
            spinner_start: Instant::now(),
        }
    }

    /// Update the view from a chat event
    pub fn handle_chat_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::PhaseChanged { phase } => {
                self.is_processing = phase != Phase::Idle;
                match phase {
                    Phase::Sending => {
                        self.spinner_start = Instant::now();
                        self.status = "Sending...".to_string();
                    }
                    Phase::Streaming => self.status = "Receiving answer...".to_string(),
                    Phase::Finalizing => self.status = "Finishing...".to_string(),
                    Phase::Failed => {}
                    Phase::Idle => {
                        self.status = match &self.error {
                            Some(e) => format!("Error: {}", e),
                            None => "Ready".to_string(),
                        };
                    }
                }
            }
            ChatEvent::UserMessage { message, .. } => {
                self.error = None;
                self.messages.push(ChatMessage::from_message(&message));
                self.scroll_to_bottom();
            }
            ChatEvent::AnswerStarted { message, .. } => {
                self.messages.push(ChatMessage::from_message(&message));
                self.streaming = Some(self.messages.len() - 1);
                self.scroll_to_bottom();
            }
            ChatEvent::AnswerUpdated { text, .. } => {
                if let Some(entry) = self.streaming_entry() {
                    entry.text = text;
                    self.scroll_to_bottom();
                }
            }
            ChatEvent::AnswerFinalized { message, .. } => {
                let entry = ChatMessage::from_message(&message);
                match self.streaming.take() {
                    Some(index) if index < self.messages.len() => self.messages[index] = entry,
                    _ => self.messages.push(entry),
                }
                self.scroll_to_bottom();
            }
            ChatEvent::Cancelled { .. } => {
                if let Some(entry) = self.streaming_entry() {
                    entry.is_streaming = false;
                    entry.interrupted = true;
                }
                self.streaming = None;
                self.show_system_message("Cancelled.");
            }
            ChatEvent::Failed { message, .. } => {
                if let Some(entry) = self.streaming_entry() {
                    entry.is_streaming = false;
                    entry.interrupted = true;
                }
                self.streaming = None;
                self.messages.push(ChatMessage::error(&message));
                self.error = Some(message);
                self.scroll_to_bottom();
            }
            ChatEvent::Cleared => {
                self.messages.clear();
                self.streaming = None;
                self.error = None;
                self.scroll = 0;
                self.status = "Cleared".to_string();
            }
        }
    }

    fn streaming_entry(&mut self) -> Option<&mut ChatMessage> {
        self.streaming.and_then(|i| self.messages.get_mut(i))
    }

    fn scroll_to_bottom(&mut self) {
        // resolved against the content height at render time
        self.scroll = usize::MAX;
    }

    /// Show a system message
    pub fn show_system_message(&mut self, content: &str) {
        self.messages.push(ChatMessage::system(content));
        self.scroll_to_bottom();
    }

    pub fn set_namespace(&mut self, namespace: Option<String>) {
        self.namespace = namespace;
    }

    /// Handle keyboard action; returns false when the UI should exit
    pub async fn handle_action(&mut self, action: Action, width: u16) -> bool {
        match action {
            Action::Submit => {
                let content = self.input.take();
                let content = content.trim();
                if content.is_empty() {
                    return true;
                }
                let message = if content.starts_with('/') {
                    UiMessage::Command(content.to_string())
                } else {
                    UiMessage::Submit(content.to_string())
                };
                let _ = self.ui_tx.send(message).await;
                true
            }
            Action::Quit => {
                let _ = self.ui_tx.send(UiMessage::Quit).await;
                false
            }
            Action::Interrupt | Action::Escape => {
                if !self.input.is_empty() {
                    self.input.clear();
                    true
                } else {
                    let _ = self.ui_tx.send(UiMessage::Quit).await;
                    false
                }
            }
            Action::Eof if self.input.is_empty() => {
                let _ = self.ui_tx.send(UiMessage::Quit).await;
                false
            }
            Action::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
                true
            }
            Action::PageDown => {
                self.scroll = self.scroll.saturating_add(10);
                true
            }
            Action::Clear => {
                let _ = self.ui_tx.send(UiMessage::Clear).await;
                true
            }
            _ => {
                self.input.handle_action(&action, width);
                true
            }
        }
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // Messages
                Constraint::Length(1), // Status
                Constraint::Length(3), // Input
            ])
            .split(size);

        self.render_messages(frame, chunks[0]);
        self.render_status(frame, chunks[1]);

        self.input.set_title(self.namespace.clone());
        self.input.render(chunks[2], frame.buffer_mut(), &self.theme);
    }

    fn render_messages(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(Span::styled(" rill ", self.theme.accent_bold()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.messages.is_empty() {
            let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan));
            let label = |l: &'static str| Span::styled(l, Style::default().fg(Color::White));
            let welcome = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "  Ask a question and the answer streams in below.",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(vec![key("    Enter     "), label("Send question")]),
                Line::from(vec![key("    Esc       "), label("Cancel answer / Quit")]),
                Line::from(vec![key("    Ctrl+L    "), label("Clear conversation")]),
                Line::from(vec![key("    Up/Down   "), label("Question history")]),
                Line::from(vec![key("    PgUp/Dn   "), label("Scroll history")]),
                Line::from(""),
                Line::from(Span::styled(
                    "  Type /help for commands.",
                    Style::default().fg(Color::DarkGray),
                )),
            ]);
            frame.render_widget(welcome, inner);
            return;
        }

        let list_width = inner.width.saturating_sub(1);
        let content_height = calculate_message_height(&self.messages, list_width as usize);
        let max_scroll = content_height.saturating_sub(inner.height as usize);
        self.scroll = self.scroll.min(max_scroll);

        let list_area = Rect {
            width: list_width,
            ..inner
        };
        let tick = Spinner::frame_index(self.spinner_start);
        let message_list = MessageList::new(&self.messages, &self.theme)
            .scroll(self.scroll)
            .tick(tick);
        frame.render_widget(message_list, list_area);

        if content_height > inner.height as usize {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");

            let mut scrollbar_state = ScrollbarState::new(max_scroll)
                .position(self.scroll)
                .viewport_content_length(inner.height as usize);

            frame.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        if self.is_processing {
            let spinner = Spinner::new(&self.status, &self.theme)
                .with_start_time(self.spinner_start)
                .with_hint("Esc to cancel");
            frame.render_widget(spinner, area);
            return;
        }

        let namespace = self.namespace.as_deref().unwrap_or("default");
        let left_content = format!(
            "{} │ {} │ {}",
            truncate_chars(&self.endpoint, 40),
            namespace,
            self.status
        );
        let right_content = "/help │ Ctrl+L: clear │ Esc: quit";

        let left_width = left_content.chars().count();
        let right_width = right_content.chars().count();
        let available = area.width as usize;

        let left_style = if self.error.is_some() {
            self.theme.error_style()
        } else {
            self.theme.dim_style()
        };

        let line = if left_width + right_width + 2 <= available {
            let spacing = available - left_width - right_width;
            Line::from(vec![
                Span::styled(left_content, left_style),
                Span::raw(" ".repeat(spacing)),
                Span::styled(right_content, Style::default().fg(Color::DarkGray)),
            ])
        } else {
            Line::from(Span::styled(left_content, left_style))
        };

        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Apply a slash command; returns false when the UI should exit
fn apply_command(chat: &mut Chat, state: &mut TuiState, input: &str) -> bool {
    let Some(result) = execute_command(input, chat) else {
        return true;
    };
    match result {
        CommandResult::Message(msg) => state.show_system_message(&msg),
        CommandResult::Clear => {
            if let Err(e) = chat.clear() {
                state.show_system_message(&format!("Cannot clear: {}", e));
            }
        }
        CommandResult::SetNamespace(namespace) => {
            let label = namespace.clone().unwrap_or_else(|| "backend default".to_string());
            chat.set_namespace(namespace.clone());
            state.set_namespace(namespace);
            state.show_system_message(&format!("Namespace: {}", label));
        }
        CommandResult::Exit => return false,
        CommandResult::Unknown(cmd) => {
            state.show_system_message(&format!(
                "Unknown command: /{}\nType /help for available commands.",
                cmd
            ));
        }
    }
    true
}

/// Run the TUI application
pub async fn run_tui(chat: &mut Chat, endpoint: &str, theme: Theme) -> anyhow::Result<()> {
    use crossterm::{
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };
    use ratatui::{Terminal, backend::CrosstermBackend};
    use std::io;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (ui_tx, mut ui_rx) = mpsc::channel::<UiMessage>(32);
    let mut state = TuiState::new(endpoint, chat.config().namespace.clone(), theme, ui_tx);
    let mut chat_rx = chat.subscribe();
    let mut event_stream = EventStream::new();

    // 80ms matches the spinner frame rate
    let mut tick_interval = tokio::time::interval(std::time::Duration::from_millis(80));

    let mut pending_question: Option<String> = None;

    let result = loop {
        if let Some(question) = pending_question.take() {
            let pending = match chat.begin(&question) {
                Ok(pending) => pending,
                Err(e) => {
                    state.show_system_message(&e.to_string());
                    continue;
                }
            };

            let handle = chat.handle();
            let mut answer = std::pin::pin!(chat.drive(pending));

            // the input stays live while the answer streams
            loop {
                terminal.draw(|frame| state.render(frame))?;
                let area_width = terminal.size()?.width;

                tokio::select! {
                    biased;

                    result = &mut answer => {
                        if let Err(e) = result {
                            tracing::debug!("Question ended with error: {}", e);
                        }
                        break;
                    }

                    event = chat_rx.recv() => {
                        if let Ok(event) = event {
                            state.handle_chat_event(event);
                        }
                    }

                    event = event_stream.next() => {
                        match event {
                            Some(Ok(Event::Key(key))) => {
                                let action = rill_tui::input::key_to_action(key);
                                match action {
                                    Action::Interrupt | Action::Escape => {
                                        handle.cancel();
                                        state.status = "Cancelling...".to_string();
                                    }
                                    Action::Quit => {
                                        handle.cancel();
                                        disable_raw_mode()?;
                                        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
                                        terminal.show_cursor()?;
                                        return Ok(());
                                    }
                                    Action::PageUp => state.scroll = state.scroll.saturating_sub(10),
                                    Action::PageDown => state.scroll = state.scroll.saturating_add(10),
                                    Action::Submit => {}
                                    _ => {
                                        state.input.handle_action(&action, area_width);
                                    }
                                }
                            }
                            Some(Ok(Event::Paste(text))) => {
                                state.input.handle_action(&Action::Paste(text), area_width);
                            }
                            Some(Ok(Event::Mouse(mouse))) => match mouse.kind {
                                MouseEventKind::ScrollUp => state.scroll = state.scroll.saturating_sub(3),
                                MouseEventKind::ScrollDown => state.scroll = state.scroll.saturating_add(3),
                                _ => {}
                            },
                            Some(Err(_)) | None => {
                                handle.cancel();
                                disable_raw_mode()?;
                                execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
                                terminal.show_cursor()?;
                                return Ok(());
                            }
                            _ => {}
                        }
                    }

                    _ = tick_interval.tick() => {}
                }
            }

            while let Ok(event) = chat_rx.try_recv() {
                state.handle_chat_event(event);
            }
            continue;
        }

        terminal.draw(|frame| state.render(frame))?;
        let area_width = terminal.size()?.width;

        tokio::select! {
            biased;

            event = chat_rx.recv() => {
                if let Ok(event) = event {
                    state.handle_chat_event(event);
                }
            }

            event = event_stream.next() => {
                match event {
                    Some(Ok(Event::Key(key))) => {
                        let action = rill_tui::input::key_to_action(key);
                        if !state.handle_action(action, area_width).await {
                            break Ok(());
                        }
                    }
                    Some(Ok(Event::Paste(text))) => {
                        state.handle_action(Action::Paste(text), area_width).await;
                    }
                    Some(Ok(Event::Mouse(mouse))) => match mouse.kind {
                        MouseEventKind::ScrollUp => state.scroll = state.scroll.saturating_sub(3),
                        MouseEventKind::ScrollDown => state.scroll = state.scroll.saturating_add(3),
                        _ => {}
                    },
                    Some(Err(e)) => {
                        break Err(anyhow::anyhow!("Event error: {}", e));
                    }
                    None => {
                        break Ok(());
                    }
                    _ => {}
                }
            }

            _ = tick_interval.tick() => {}

            msg = ui_rx.recv() => {
                match msg {
                    Some(UiMessage::Submit(question)) => {
                        pending_question = Some(question);
                    }
                    Some(UiMessage::Command(cmd)) => {
                        if !apply_command(chat, &mut state, &cmd) {
                            break Ok(());
                        }
                    }
                    Some(UiMessage::Clear) => {
                        if let Err(e) = chat.clear() {
                            state.show_system_message(&format!("Cannot clear: {}", e));
                        }
                    }
                    Some(UiMessage::Quit) | None => {
                        break Ok(());
                    }
                }
            }
        }
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
