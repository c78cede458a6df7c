//! /sources command - list the citations of the last answer

use super::CommandResult;
use rill_client::Message;

pub struct SourcesCommand;

impl SourcesCommand {
    pub fn execute(last_answer: Option<&Message>) -> CommandResult {
        let Some(answer) = last_answer else {
            return CommandResult::Message("No answer yet.".to_string());
        };

        let sources = answer.sources();
        if sources.is_empty() {
            return CommandResult::Message("The last answer cited no sources.".to_string());
        }

        let mut output = format!("Sources ({}):\n", sources.len());
        for (i, source) in sources.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", i + 1, source));
        }
        CommandResult::Message(output.trim_end().to_string())
    }
}
