//! Bounded digests of tool results for the trace.

const ELLIPSIS: char = '…';

/// Collapse runs of whitespace and cap the result at `max_chars` characters.
///
/// Truncated text ends with an ellipsis, which counts towards the limit.
pub fn summarize(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    if max_chars == 0 {
        return String::new();
    }

    let mut summary: String = collapsed.chars().take(max_chars - 1).collect();
    summary.truncate(summary.trim_end().len());
    summary.push(ELLIPSIS);
    summary
}
