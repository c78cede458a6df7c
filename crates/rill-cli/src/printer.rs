//! Plain-text rendering of chat events for the line-oriented modes

use crate::utils::{answer_prefix, held_back};
use rill_chat::ChatEvent;
use std::io::{self, Write};

/// Writes a streaming answer to a terminal or pipe as it arrives
pub struct AnswerPrinter<W: Write> {
    out: W,
    /// Streamed text already written
    shown: String,
    /// Full answer text from the latest update
    latest: String,
    at_line_start: bool,
}

impl<W: Write> AnswerPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown: String::new(),
            latest: String::new(),
            at_line_start: true,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Render one chat event. Errors are written by the caller.
    pub fn handle(&mut self, event: &ChatEvent) -> io::Result<()> {
        match event {
            ChatEvent::AnswerStarted { message, .. } => self.update(&message.text),
            ChatEvent::AnswerUpdated { text, .. } => self.update(text),
            ChatEvent::AnswerFinalized { message, .. } => {
                // text held back while it looked like a delimiter is written now
                if let Some(rest) = message.text.strip_prefix(self.shown.trim_start()) {
                    if !rest.is_empty() {
                        write!(self.out, "{}", rest)?;
                        self.at_line_start = false;
                    }
                }
                if !self.at_line_start || message.text.is_empty() {
                    writeln!(self.out)?;
                }
                let sources = message.sources();
                if !sources.is_empty() {
                    writeln!(self.out, "\nSources:")?;
                    for source in sources {
                        writeln!(self.out, "  - {}", source)?;
                    }
                }
                self.reset();
                self.out.flush()
            }
            ChatEvent::Cancelled { .. } => {
                self.write_held_back()?;
                if !self.at_line_start {
                    writeln!(self.out)?;
                }
                writeln!(self.out, "[cancelled]")?;
                self.reset();
                self.out.flush()
            }
            ChatEvent::Failed { .. } => {
                self.write_held_back()?;
                if !self.at_line_start {
                    writeln!(self.out)?;
                }
                self.reset();
                self.out.flush()
            }
            _ => Ok(()),
        }
    }

    fn update(&mut self, text: &str) -> io::Result<()> {
        self.latest.clear();
        self.latest.push_str(text);
        let visible = answer_prefix(text);
        if let Some(delta) = visible.strip_prefix(self.shown.as_str()) {
            if !delta.is_empty() {
                write!(self.out, "{}", delta)?;
                self.at_line_start = delta.ends_with('\n');
                self.shown.push_str(delta);
                self.out.flush()?;
            }
        }
        Ok(())
    }

    /// An interrupted answer never reaches the delimiter check, so show its tail
    fn write_held_back(&mut self) -> io::Result<()> {
        if let Some(rest) = held_back(&self.latest) {
            write!(self.out, "{}", rest)?;
            self.at_line_start = false;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.shown.clear();
        self.latest.clear();
        self.at_line_start = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_client::Message;

    fn run(events: Vec<ChatEvent>) -> String {
        let mut printer = AnswerPrinter::new(Vec::new());
        for event in &events {
            printer.handle(event).unwrap();
        }
        String::from_utf8(printer.into_inner()).unwrap()
    }

    fn finalized(text: &str, sources: &[&str]) -> ChatEvent {
        let mut message = Message::assistant(text);
        message.sources = Some(sources.iter().map(|s| s.to_string()).collect());
        ChatEvent::AnswerFinalized {
            position: 1,
            message,
        }
    }

    #[test]
    fn test_streams_answer_then_sources() {
        let output = run(vec![
            ChatEvent::AnswerStarted {
                position: 1,
                message: Message::assistant("The "),
            },
            ChatEvent::AnswerUpdated {
                position: 1,
                text: "The answer is ".into(),
            },
            ChatEvent::AnswerUpdated {
                position: 1,
                text: "The answer is 4.\n--- Sources ---\nmath:arith\n".into(),
            },
            finalized("The answer is 4.", &["math:arith"]),
        ]);

        assert_eq!(output, "The answer is 4.\n\nSources:\n  - math:arith\n");
        assert!(!output.contains("--- Sources ---"));
    }

    #[test]
    fn test_empty_answer_prints_final_text() {
        let output = run(vec![finalized("", &[])]);
        assert_eq!(output, "\n");
    }

    #[test]
    fn test_held_back_line_is_written_at_the_end() {
        let output = run(vec![
            ChatEvent::AnswerStarted {
                position: 1,
                message: Message::assistant("4.\n--- Sou"),
            },
            finalized("4.\n--- Sou", &[]),
        ]);
        assert_eq!(output, "4.\n--- Sou\n");
    }

    #[test]
    fn test_cancel_marks_partial_output() {
        let output = run(vec![
            ChatEvent::AnswerStarted {
                position: 1,
                message: Message::assistant("The ans"),
            },
            ChatEvent::Cancelled { position: Some(1) },
        ]);
        assert_eq!(output, "The ans\n[cancelled]\n");
    }

    #[test]
    fn test_interrupted_answer_keeps_held_back_tail() {
        let output = run(vec![
            ChatEvent::AnswerStarted {
                position: 1,
                message: Message::assistant("4.\n--- Sou"),
            },
            ChatEvent::Cancelled { position: Some(1) },
        ]);
        assert_eq!(output, "4.\n--- Sou\n[cancelled]\n");

        let output = run(vec![
            ChatEvent::AnswerStarted {
                position: 1,
                message: Message::assistant("4.\n--- Sources ---\nmath"),
            },
            ChatEvent::Failed {
                position: Some(1),
                message: "stream failed: reset".into(),
            },
        ]);
        assert_eq!(output, "4.\n");
    }
}
