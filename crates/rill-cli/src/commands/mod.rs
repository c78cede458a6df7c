//! Slash commands for interactive mode

mod namespace;
mod sources;

pub use namespace::NamespaceCommand;
pub use sources::SourcesCommand;

use rill_chat::Chat;

/// Result of executing a slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Clear the conversation
    Clear,
    /// Switch namespace (None = backend default)
    SetNamespace(Option<String>),
    /// Show a message to the user (not sent to the backend)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(input: &str, chat: &Chat) -> Option<CommandResult> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next().unwrap_or("").to_lowercase();
    let args = parts.next().map(str::trim).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "clear" | "c" => CommandResult::Clear,

        "quit" | "exit" | "q" => CommandResult::Exit,

        "namespace" | "ns" | "n" => {
            NamespaceCommand::execute(args, chat.config().namespace.as_deref())
        }

        "sources" | "s" => SourcesCommand::execute(chat.conversation().last_answer()),

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?            Show this help message
  /namespace, /ns [name]   Show or switch the knowledge-base namespace
  /sources, /s             List the sources of the last answer
  /clear, /c               Clear the conversation
  /quit, /exit, /q         Exit rill

Examples:
  /namespace Pregnancy     Ask questions against the "Pregnancy" namespace
  /namespace none          Go back to the backend's default namespace"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_chat::{ChatConfig, HttpTransport};
    use std::sync::Arc;

    fn chat() -> Chat {
        let transport = HttpTransport::for_endpoint("http://127.0.0.1:9/query").unwrap();
        Chat::new(
            ChatConfig {
                namespace: Some("Blood Donation".into()),
                top_k: None,
            },
            Arc::new(transport),
        )
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert!(execute_command("what is rill?", &chat()).is_none());
    }

    #[test]
    fn test_basic_commands() {
        let chat = chat();
        assert_eq!(execute_command("/clear", &chat), Some(CommandResult::Clear));
        assert_eq!(execute_command("  /Q ", &chat), Some(CommandResult::Exit));
        assert!(matches!(
            execute_command("/help", &chat),
            Some(CommandResult::Message(m)) if m.contains("/namespace")
        ));
    }

    #[test]
    fn test_namespace_command_reads_current() {
        let chat = chat();
        match execute_command("/namespace", &chat) {
            Some(CommandResult::Message(m)) => assert!(m.contains("Blood Donation"), "got: {}", m),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(
            execute_command("/ns  Pregnancy ", &chat),
            Some(CommandResult::SetNamespace(Some("Pregnancy".into())))
        );
    }

    #[test]
    fn test_sources_without_answer() {
        assert!(matches!(
            execute_command("/sources", &chat()),
            Some(CommandResult::Message(m)) if m.contains("No answer")
        ));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            execute_command("/model gpt", &chat()),
            Some(CommandResult::Unknown("model".into()))
        );
    }
}
