use crate::traits::{ChatMessage, Role};

pub const DEFAULT_REACT_PROMPT: &str =
    "You are my AI assistant, please answer my query to the best of your ability.";

/// Builds the outbound message list for each completion request.
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    pub system_prompt: Option<String>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = if prompt.trim().is_empty() {
            None
        } else {
            Some(prompt)
        };
        self
    }

    /// The full history, preceded by the system prompt unless the caller
    /// already seeded one. The prompt is sent on every request but never
    /// stored in the conversation.
    pub fn build_messages(&self, history: &[ChatMessage]) -> Vec<ChatMessage> {
        let seeded_system = history.first().is_some_and(|m| m.role == Role::System);

        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(prompt) = &self.system_prompt
            && !seeded_system
        {
            messages.push(ChatMessage::system(prompt.clone()));
        }
        messages.extend_from_slice(history);
        messages
    }
}
