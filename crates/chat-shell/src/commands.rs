//! Shell command parsing.

use chat_core::Provider;

/// Help text shown for `/help`.
pub const HELP_TEXT: &str = r#"Commands:
  /new                     Start a new conversation
  /list                    List conversations, most recent first
  /switch <id>             Switch to a conversation
  /delete <id>             Delete a conversation
  /rename <id> <title>     Rename a conversation
  /context [text]          Show or replace the context document
  /provider <name>         Select gemini or openai
  /key <provider> <key>    Set an API key for this session
  /verify                  Check the selected provider's API key
  /stats                   Show memory usage
  /compact                 Summarize older messages now
  /clear-all               Delete every conversation
  /help                    Show this help
  /quit                    Exit

Anything else is sent as a chat message."#;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New,
    List,
    Switch(String),
    Delete(String),
    Rename { id: String, title: String },
    Context(Option<String>),
    Provider(Provider),
    Key { provider: Provider, key: String },
    Verify,
    Stats,
    Compact,
    ClearAll,
    Help,
    Quit,
    Message(String),
    Empty,
    Invalid(String),
}

impl Command {
    /// Parse one line of input.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Message(line.to_string());
        };

        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };

        match name {
            "new" => Command::New,
            "list" => Command::List,
            "switch" => required(args, "/switch <id>").map_or_else(Command::Invalid, |id| {
                Command::Switch(id.to_string())
            }),
            "delete" => required(args, "/delete <id>").map_or_else(Command::Invalid, |id| {
                Command::Delete(id.to_string())
            }),
            "rename" => match args.split_once(char::is_whitespace) {
                Some((id, title)) if !title.trim().is_empty() => Command::Rename {
                    id: id.to_string(),
                    title: title.trim().to_string(),
                },
                _ => Command::Invalid("usage: /rename <id> <title>".to_string()),
            },
            "context" => {
                if args.is_empty() {
                    Command::Context(None)
                } else {
                    Command::Context(Some(args.to_string()))
                }
            }
            "provider" => match args.parse::<Provider>() {
                Ok(provider) => Command::Provider(provider),
                Err(err) => Command::Invalid(err),
            },
            "key" => match args.split_once(char::is_whitespace) {
                Some((provider, key)) if !key.trim().is_empty() => match provider.parse() {
                    Ok(provider) => Command::Key {
                        provider,
                        key: key.trim().to_string(),
                    },
                    Err(err) => Command::Invalid(err),
                },
                _ => Command::Invalid("usage: /key <provider> <key>".to_string()),
            },
            "verify" => Command::Verify,
            "stats" => Command::Stats,
            "compact" => Command::Compact,
            "clear-all" => Command::ClearAll,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => Command::Invalid(format!("unknown command: /{} (try /help)", other)),
        }
    }
}

fn required<'a>(args: &'a str, usage: &str) -> Result<&'a str, String> {
    if args.is_empty() {
        Err(format!("usage: {}", usage))
    } else {
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(
            Command::parse("  hello there "),
            Command::Message("hello there".to_string())
        );
        assert_eq!(Command::parse("   "), Command::Empty);
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::parse("/new"), Command::New);
        assert_eq!(Command::parse("/list"), Command::List);
        assert_eq!(Command::parse("/stats"), Command::Stats);
        assert_eq!(Command::parse("/compact"), Command::Compact);
        assert_eq!(Command::parse("/clear-all"), Command::ClearAll);
        assert_eq!(Command::parse("/verify"), Command::Verify);
        assert_eq!(Command::parse("/exit"), Command::Quit);
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(
            Command::parse("/switch conv_1_abc"),
            Command::Switch("conv_1_abc".to_string())
        );
        assert_eq!(
            Command::parse("/rename conv_1 Trip to   Lisbon"),
            Command::Rename {
                id: "conv_1".to_string(),
                title: "Trip to   Lisbon".to_string()
            }
        );
        assert_eq!(
            Command::parse("/context I am a data engineer"),
            Command::Context(Some("I am a data engineer".to_string()))
        );
        assert_eq!(Command::parse("/context"), Command::Context(None));
        assert_eq!(
            Command::parse("/provider openai"),
            Command::Provider(Provider::OpenAi)
        );
        assert_eq!(
            Command::parse("/key gemini abc123"),
            Command::Key {
                provider: Provider::Gemini,
                key: "abc123".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_commands() {
        assert!(matches!(Command::parse("/switch"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/rename conv_1"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/provider claude"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/key gemini"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/bogus"), Command::Invalid(_)));
    }
}
