use crate::provider::ChatMessage;

/// In-memory conversation history for one session.
///
/// Always holds complete turns: a user message followed by the assistant reply.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished turn.
    pub fn push_turn(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.messages.push(ChatMessage::user(question));
        self.messages.push(ChatMessage::assistant(answer));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn turns(&self) -> usize {
        self.messages.len() / 2
    }
}
