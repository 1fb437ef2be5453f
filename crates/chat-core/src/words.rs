//! Word budget estimation.
//!
//! Every budget decision in the workspace is expressed in whitespace-separated
//! words. No tokenizer is involved, so all callers must go through
//! [`word_count`] to stay consistent with stored `total_words` values.

use crate::error::BudgetError;

/// Count whitespace-separated words. Empty or all-whitespace text is 0.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Preview of a message body: the first `max_chars` characters, with a
/// trailing `...` only when something was cut.
pub fn message_preview(content: &str, max_chars: usize) -> String {
    let mut chars = content.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Reject context documents that alone exceed the word budget.
pub fn check_context_budget(text: &str, max_words: usize) -> Result<usize, BudgetError> {
    let words = word_count(text);
    if words > max_words {
        return Err(BudgetError::ContextTooLong {
            words,
            max: max_words,
        });
    }
    Ok(words)
}

/// Keep the first `max_words` words, joined by single spaces.
///
/// Text already within budget is returned unchanged.
pub fn truncate_to_word_budget(text: &str, max_words: usize) -> String {
    if word_count(text) <= max_words {
        return text.to_string();
    }
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_empty_and_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\t  "), 0);
    }

    #[test]
    fn test_word_count_runs_of_whitespace() {
        assert_eq!(word_count("hello world"), 2);
        assert_eq!(word_count("  hello \n\n world\tagain  "), 3);
        assert_eq!(word_count("one"), 1);
    }

    #[test]
    fn test_message_preview_short() {
        assert_eq!(message_preview("hello world", 50), "hello world");
        assert_eq!(message_preview("", 50), "");
    }

    #[test]
    fn test_message_preview_truncates_with_ellipsis() {
        let content = "a".repeat(60);
        let preview = message_preview(&content, 50);
        assert_eq!(preview, format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn test_message_preview_exact_length_has_no_ellipsis() {
        let content = "b".repeat(50);
        assert_eq!(message_preview(&content, 50), content);
    }

    #[test]
    fn test_message_preview_multibyte() {
        let content = "é".repeat(51);
        let preview = message_preview(&content, 50);
        assert_eq!(preview.chars().count(), 53);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_check_context_budget() {
        assert_eq!(check_context_budget("one two three", 3), Ok(3));
        assert_eq!(
            check_context_budget("one two three four", 3),
            Err(BudgetError::ContextTooLong { words: 4, max: 3 })
        );
    }

    #[test]
    fn test_truncate_to_word_budget() {
        assert_eq!(truncate_to_word_budget("a  b\nc d", 3), "a b c");
        assert_eq!(truncate_to_word_budget("a  b", 3), "a  b");
    }
}
