use crate::error::AgentError;
use crate::traits::ChatMessage;

/// Append-only message history owned by whoever drives the loop.
///
/// Messages are never edited or removed once appended. The caller seeds it,
/// hands it to a run by `&mut`, and reads it back afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        Self {
            messages: messages.into_iter().collect(),
        }
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn last(&self) -> Result<&ChatMessage, AgentError> {
        self.messages.last().ok_or(AgentError::EmptyStore)
    }

    pub fn all(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
