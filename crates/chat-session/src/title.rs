//! Conversation title generation.

use std::sync::Arc;

use chat_core::{Completer, Provider};
use chrono::Local;
use conversation_store::TITLE_MAX_WORDS;
use tracing::{debug, warn};

/// Characters of the first message used by the fallback title.
pub const FALLBACK_TITLE_CHARS: usize = 30;

/// Generated titles shorter than this are discarded.
pub const MIN_TITLE_CHARS: usize = 3;

const LABEL_PREFIXES: [&str; 3] = ["chat title:", "title is:", "title:"];

/// Build the prompt asking the model for a short title.
pub fn build_title_prompt(first_message: &str) -> String {
    format!(
        "Based on this first message, generate a concise chat title (maximum 5 words) that captures the main topic or intent.\n\
         \n\
         Examples of good titles:\n\
         - \"Weather Forecast\" (for weather questions)\n\
         - \"Code Debugging Help\" (for programming issues)\n\
         - \"Recipe Ideas\" (for cooking questions)\n\
         - \"Travel Planning\" (for travel advice)\n\
         - \"Math Problem\" (for math questions)\n\
         - \"General Chat\" (for casual conversation)\n\
         \n\
         First message: \"{}\"\n\
         \n\
         Respond with ONLY the title, no additional text.",
        first_message
    )
}

/// Clean a model-generated title.
///
/// Quotes and a leading label such as `Title:` are stripped and the result
/// is cut to `max_words` words. Returns `None` when what is left is too
/// short to be useful.
pub fn clean_title(raw: &str, max_words: usize) -> Option<String> {
    let unquoted: String = raw.chars().filter(|c| *c != '"' && *c != '\'').collect();
    let mut cleaned = unquoted.trim();

    for prefix in LABEL_PREFIXES {
        if let Some(head) = cleaned.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                cleaned = cleaned[prefix.len()..].trim();
                break;
            }
        }
    }

    let title = cleaned
        .split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ");

    if title.chars().count() < MIN_TITLE_CHARS {
        None
    } else {
        Some(title)
    }
}

/// Deterministic title used when generation fails.
///
/// The first 30 characters of the message, trimmed, or a time-stamped label
/// when the message has nothing usable.
pub fn fallback_title(first_message: &str) -> String {
    let truncated: String = first_message.chars().take(FALLBACK_TITLE_CHARS).collect();
    let truncated = truncated.trim();
    if truncated.is_empty() {
        timestamp_title()
    } else {
        truncated.to_string()
    }
}

fn timestamp_title() -> String {
    format!("Chat at {}", Local::now().format("%I:%M %p"))
}

/// Derives a title from a conversation's first message.
#[derive(Clone)]
pub struct TitleGenerator {
    completer: Arc<dyn Completer>,
    max_words: usize,
}

impl TitleGenerator {
    /// Create a generator using the default word limit.
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self {
            completer,
            max_words: TITLE_MAX_WORDS,
        }
    }

    /// Override the word limit.
    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.max_words = max_words.max(1);
        self
    }

    /// Generate a title. Never fails; delegate errors and unusable output
    /// fall back to [`fallback_title`].
    pub async fn generate(&self, first_message: &str, api_key: &str, provider: Provider) -> String {
        if first_message.trim().is_empty() {
            return timestamp_title();
        }

        let prompt = build_title_prompt(first_message);
        match self.completer.complete(&prompt, api_key, provider).await {
            Ok(raw) => match clean_title(&raw, self.max_words) {
                Some(title) => {
                    debug!("Generated title: {}", title);
                    title
                }
                None => {
                    warn!("Generated title {:?} unusable, using fallback", raw);
                    fallback_title(first_message)
                }
            },
            Err(err) => {
                warn!("Title generation failed, using fallback: {}", err);
                fallback_title(first_message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_completer::{FailingCompleter, ScriptedCompleter};

    #[test]
    fn test_title_prompt_embeds_message() {
        let prompt = build_title_prompt("How do I bake bread?");
        assert!(prompt.starts_with("Based on this first message"));
        assert!(prompt.contains("- \"Recipe Ideas\" (for cooking questions)"));
        assert!(prompt.contains("First message: \"How do I bake bread?\""));
        assert!(prompt.ends_with("Respond with ONLY the title, no additional text."));
    }

    #[test]
    fn test_clean_title_strips_quotes_and_labels() {
        assert_eq!(
            clean_title("\"Weather Forecast\"", 5).as_deref(),
            Some("Weather Forecast")
        );
        assert_eq!(
            clean_title("Title: Paris Trip", 5).as_deref(),
            Some("Paris Trip")
        );
        assert_eq!(
            clean_title("CHAT TITLE: 'Rust Lifetimes'", 5).as_deref(),
            Some("Rust Lifetimes")
        );
        assert_eq!(
            clean_title("title is: Budget Review", 5).as_deref(),
            Some("Budget Review")
        );
    }

    #[test]
    fn test_clean_title_limits_words() {
        assert_eq!(
            clean_title("One Two Three Four Five Six Seven", 5).as_deref(),
            Some("One Two Three Four Five")
        );
    }

    #[test]
    fn test_clean_title_rejects_short_output() {
        assert_eq!(clean_title("\"\"", 5), None);
        assert_eq!(clean_title("Title: a", 5), None);
        assert_eq!(clean_title("Hi", 5), None);
        assert_eq!(clean_title("Hey", 5).as_deref(), Some("Hey"));
    }

    #[test]
    fn test_fallback_title() {
        assert_eq!(
            fallback_title("What's the weather in Paris tomorrow?"),
            "What's the weather in Paris to"
        );
        assert_eq!(fallback_title("  short  "), "short");
        assert!(fallback_title("   ").starts_with("Chat at "));
    }

    #[tokio::test]
    async fn test_generate_uses_cleaned_reply() {
        let completer = Arc::new(ScriptedCompleter::always("Title: \"Weather Forecast\""));
        let generator = TitleGenerator::new(completer.clone());

        let title = generator
            .generate("Will it rain tomorrow?", "key", Provider::Gemini)
            .await;
        assert_eq!(title, "Weather Forecast");
        assert!(completer.prompts().await[0].contains("Will it rain tomorrow?"));
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_failure() {
        let generator = TitleGenerator::new(Arc::new(FailingCompleter::network("offline")));

        let title = generator
            .generate("What's the weather in Paris tomorrow?", "key", Provider::OpenAi)
            .await;
        assert_eq!(title, "What's the weather in Paris to");
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_unusable_reply() {
        let generator = TitleGenerator::new(Arc::new(ScriptedCompleter::always("''")));

        let title = generator
            .generate("Explain borrow checking", "key", Provider::Gemini)
            .await;
        assert_eq!(title, "Explain borrow checking");
    }

    #[tokio::test]
    async fn test_generate_empty_message_skips_delegate() {
        let completer = Arc::new(ScriptedCompleter::always("Unused"));
        let generator = TitleGenerator::new(completer.clone());

        let title = generator.generate("  ", "key", Provider::Gemini).await;
        assert!(title.starts_with("Chat at "));
        assert_eq!(completer.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_custom_word_limit() {
        let generator = TitleGenerator::new(Arc::new(ScriptedCompleter::always(
            "Planning A Long Trip To Japan",
        )))
        .with_max_words(2);

        let title = generator.generate("Japan trip?", "key", Provider::Gemini).await;
        assert_eq!(title, "Planning A");
    }
}
