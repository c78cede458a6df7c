//! /namespace command - show and switch the knowledge-base namespace

use super::CommandResult;

pub struct NamespaceCommand;

impl NamespaceCommand {
    pub fn execute(args: &str, current: Option<&str>) -> CommandResult {
        if args.is_empty() {
            return CommandResult::Message(match current {
                Some(ns) => format!("Namespace: {}\nSwitch with: /namespace <name>", ns),
                None => "Namespace: backend default\nSwitch with: /namespace <name>".to_string(),
            });
        }

        match args.to_lowercase().as_str() {
            "none" | "default" | "-" => CommandResult::SetNamespace(None),
            _ => CommandResult::SetNamespace(Some(args.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_to_default() {
        assert_eq!(
            NamespaceCommand::execute("None", Some("x")),
            CommandResult::SetNamespace(None)
        );
    }

    #[test]
    fn test_names_keep_their_case_and_spaces() {
        assert_eq!(
            NamespaceCommand::execute("Blood Donation", None),
            CommandResult::SetNamespace(Some("Blood Donation".into()))
        );
    }

    #[test]
    fn test_show_default() {
        assert!(matches!(
            NamespaceCommand::execute("", None),
            CommandResult::Message(m) if m.contains("backend default")
        ));
    }
}
