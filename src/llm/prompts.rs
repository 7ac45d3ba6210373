use crate::suggest::fallback::DEFAULT_MESSAGE;

/// Style example used when the repository has no usable history.
pub const DEFAULT_EXAMPLE: &str = DEFAULT_MESSAGE;

/// Marker the prompt ends on; completions are read from after it.
pub const MESSAGES_MARKER: &str = "Messages:";

pub const RULES: &str = r#"Rules:
- Follow the format type: description, where type is one of feat, fix, docs, style, refactor, test, chore, perf.
- Use the imperative mood and keep each message under 12 words.
- Write one message per line. Do not copy code, comments or stack traces."#;

/// System message for chat-style backends, which otherwise tend to chat back.
pub const SYSTEM_INSTRUCTIONS: &str = r#"You are a Git commit message assistant.
Continue the user's text by writing only the requested commit messages, one per line.
Do not narrate, explain, or wrap the messages in formatting."#;
