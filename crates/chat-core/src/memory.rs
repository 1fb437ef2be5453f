//! Assembly of the per-turn context block sent with every chat message.

use crate::message::{render_transcript, ChatMessage};

/// Build the context block for a chat turn.
///
/// Sections, in order and each only when non-empty: the user's context
/// document, the running summary, and the recent message history.
pub fn build_turn_context(context: &str, summary: Option<&str>, history: &[ChatMessage]) -> String {
    let mut output = context.trim().to_string();

    if let Some(summary) = summary.map(str::trim).filter(|s| !s.is_empty()) {
        output.push_str(&format!("\n\nPrevious conversation summary: {}", summary));
    }

    if !history.is_empty() {
        output.push_str(&format!(
            "\n\nRecent conversation history:\n{}",
            render_transcript(history)
        ));
    }

    output.trim().to_string()
}

/// Combine the context block with the new user message.
pub fn build_turn_prompt(context_block: &str, user_text: &str) -> String {
    if context_block.trim().is_empty() {
        return user_text.to_string();
    }
    format!("{}\n\nUser: {}", context_block, user_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context_block() {
        assert_eq!(build_turn_context("", None, &[]), "");
        assert_eq!(build_turn_context("  ", Some("   "), &[]), "");
    }

    #[test]
    fn test_all_sections() {
        let history = vec![ChatMessage::user("Hi"), ChatMessage::assistant("Hello")];
        let block = build_turn_context("I am a chef.", Some("Talked about knives."), &history);

        assert_eq!(
            block,
            "I am a chef.\n\nPrevious conversation summary: Talked about knives.\n\n\
             Recent conversation history:\nUser: Hi\n\nAssistant: Hello"
        );
    }

    #[test]
    fn test_summary_without_context() {
        let block = build_turn_context("", Some("Earlier stuff."), &[]);
        assert_eq!(block, "Previous conversation summary: Earlier stuff.");
    }

    #[test]
    fn test_build_turn_prompt() {
        assert_eq!(build_turn_prompt("", "question?"), "question?");
        assert_eq!(
            build_turn_prompt("background", "question?"),
            "background\n\nUser: question?"
        );
    }
}
