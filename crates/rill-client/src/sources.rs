//! Splitting a finished answer into body text and source citations

use crate::types::SplitAnswer;

/// Marker line the backend writes between the answer and its citations
pub const SOURCES_DELIMITER: &str = "--- Sources ---";

/// Split accumulated answer text at the first `--- Sources ---` line.
///
/// Without a delimiter line the whole trimmed text is the answer. With one,
/// the answer is the trimmed text before it and every non-empty line after it
/// is a source. Later delimiter lines are ordinary source content.
pub fn split_answer(text: &str) -> SplitAnswer {
    let Some((start, end)) = find_delimiter_line(text) else {
        return SplitAnswer {
            answer: text.trim().to_string(),
            sources: Vec::new(),
        };
    };

    let sources = text[end..]
        .trim()
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    SplitAnswer {
        answer: text[..start].trim().to_string(),
        sources,
    }
}

/// Byte range of the first delimiter that occupies a whole line
fn find_delimiter_line(text: &str) -> Option<(usize, usize)> {
    let mut from = 0;
    while let Some(offset) = text[from..].find(SOURCES_DELIMITER) {
        let start = from + offset;
        let end = start + SOURCES_DELIMITER.len();

        let starts_line = start == 0 || text.as_bytes()[start - 1] == b'\n';
        let rest = &text[end..];
        let ends_line = rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n");

        if starts_line && ends_line {
            return Some((start, end));
        }
        // delimiter begins with an ASCII byte, so this stays on a char boundary
        from = start + 1;
    }
    None
}
