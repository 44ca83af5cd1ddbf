//! # Completions
//! The completion collaborator seam: an ordered conversation of role/text turns goes in,
//! a single completion string comes out. The engine never retries; any failure from the
//! collaborator propagates to the caller.

use std::fmt;
use std::fmt::Formatter;

use anyhow::Result;
use async_trait::async_trait;

#[cfg(feature = "openai")]
pub mod openai;

/// Role of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// The wire name of the role, as chat completion APIs spell it.
    pub fn api_name(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// An ordered sequence of conversation turns forming one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    messages: Vec<(Role, String)>,
}

impl Prompt {
    pub fn new(messages: Vec<(Role, String)>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[(Role, String)] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Role, String)> {
        self.messages.iter()
    }

    /// Number of characters across all turns.
    pub fn character_length(&self) -> usize {
        self.messages.iter().map(|(_, text)| text.chars().count()).sum()
    }

    /// A new prompt with one more turn appended; the original is left untouched.
    pub fn with_message(&self, role: Role, text: impl Into<String>) -> Prompt {
        let mut messages = self.messages.clone();
        messages.push((role, text.into()));
        Prompt::new(messages)
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rendered = self
            .messages
            .iter()
            .map(|(role, text)| format!("{}:\n{}", role.api_name().to_uppercase(), text))
            .collect::<Vec<String>>()
            .join("\n\n");
        write!(f, "{}", rendered)
    }
}

/// Client for generating text completions from prompts. One-shot: a single call per
/// prompt, no retry or backoff on this side of the seam.
#[async_trait]
pub trait TextCompletions {
    /// Generate a completion for the given prompt.
    async fn run(&self, prompt: &Prompt) -> Result<String>;

    /// Generate completions for the given prompts, in order.
    async fn run_batch(&self, prompts: &[Prompt]) -> Result<Vec<String>> {
        let mut completions = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            completions.push(self.run(prompt).await?);
        }
        Ok(completions)
    }

    /// Identifier of the underlying model, when the client knows one. Feeds the
    /// observability events emitted per mapping attempt.
    fn model_id(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod prompt_tests {
    use super::{Prompt, Role};

    #[test]
    fn test_with_message_leaves_original_untouched() {
        let prefix = Prompt::new(vec![(Role::System, "guide".to_string())]);
        let extended = prefix.with_message(Role::User, "hello");
        assert_eq!(prefix.len(), 1);
        assert_eq!(extended.len(), 2);
        assert_eq!(extended.messages()[1], (Role::User, "hello".to_string()));
    }

    #[test]
    fn test_character_length() {
        let prompt = Prompt::new(vec![
            (Role::System, "abc".to_string()),
            (Role::User, "de".to_string()),
        ]);
        assert_eq!(prompt.character_length(), 5);
    }

    #[test]
    fn test_display() {
        let prompt = Prompt::new(vec![
            (Role::System, "guide".to_string()),
            (Role::User, "hello".to_string()),
        ]);
        assert_eq!(prompt.to_string(), "SYSTEM:\nguide\n\nUSER:\nhello");
    }
}
