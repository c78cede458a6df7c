//! Shared utilities

use rill_client::SOURCES_DELIMITER;

/// Truncate a string to `max` characters, appending "..." if truncated.
/// Operates on Unicode char boundaries, not bytes.
pub fn truncate_chars(s: &str, max: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

/// The part of a partial answer that is safe to show before the stream ends.
///
/// Stops at a complete sources delimiter line, and holds back a trailing
/// line that could still turn into one.
pub fn answer_prefix(text: &str) -> &str {
    let mut line_start = 0;
    for (i, _) in text.match_indices('\n') {
        let line = &text[line_start..i];
        if line.strip_suffix('\r').unwrap_or(line) == SOURCES_DELIMITER {
            return &text[..line_start];
        }
        line_start = i + 1;
    }

    let tail = &text[line_start..];
    if !tail.is_empty() && SOURCES_DELIMITER.starts_with(tail.strip_suffix('\r').unwrap_or(tail)) {
        &text[..line_start]
    } else {
        text
    }
}

/// A trailing partial line that [`answer_prefix`] held back, if any.
///
/// `None` once a complete delimiter line has arrived.
pub fn held_back(text: &str) -> Option<&str> {
    let rest = &text[answer_prefix(text).len()..];
    if rest.is_empty() || rest.contains('\n') {
        return None;
    }
    if rest.strip_suffix('\r').unwrap_or(rest) == SOURCES_DELIMITER {
        return None;
    }
    Some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn test_prefix_without_delimiter() {
        assert_eq!(answer_prefix("The answer is "), "The answer is ");
        assert_eq!(answer_prefix(""), "");
    }

    #[test]
    fn test_prefix_stops_at_delimiter() {
        assert_eq!(
            answer_prefix("4.\n--- Sources ---\nmath:arith\n"),
            "4.\n"
        );
        assert_eq!(answer_prefix("--- Sources ---\nx"), "");
    }

    #[test]
    fn test_prefix_holds_back_possible_delimiter() {
        assert_eq!(answer_prefix("4.\n--- Sou"), "4.\n");
        assert_eq!(answer_prefix("4.\n--- Sources ---"), "4.\n");
        assert_eq!(answer_prefix("4.\n- a list item"), "4.\n- a list item");
    }

    #[test]
    fn test_prefix_ignores_inline_delimiter() {
        let text = "see --- Sources --- below\nmore";
        assert_eq!(answer_prefix(text), text);
    }

    #[test]
    fn test_held_back_tail() {
        assert_eq!(held_back("4.\n--- Sou"), Some("--- Sou"));
        assert_eq!(held_back("4.\n--- Sources ---"), None);
        assert_eq!(held_back("4.\n--- Sources ---\nmath"), None);
        assert_eq!(held_back("plain text"), None);
    }
}
