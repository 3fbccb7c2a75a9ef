//! History-aware retrieval and answer synthesis for one conversation.

use std::sync::Arc;

use super::ChatError;
use super::prompts::{CONTEXTUALIZE_SYSTEM_PROMPT, qa_system_prompt};
use super::transcript::Transcript;
use crate::documents::SearchResult;
use crate::provider::{ChatMessage, ChatModel};
use crate::retrieve::Retriever;

/// Outcome of a single question.
#[derive(Debug, Clone)]
pub struct TurnResult {
    /// The question actually used for retrieval and answering.
    pub standalone_question: String,
    pub context: Vec<SearchResult>,
    pub answer: String,
}

/// Conversational RAG over one store, owning the session transcript.
pub struct ConversationalRag {
    chat: Arc<dyn ChatModel>,
    retriever: Retriever,
    transcript: Transcript,
}

impl ConversationalRag {
    pub fn new(chat: Arc<dyn ChatModel>, retriever: Retriever) -> Self {
        Self {
            chat,
            retriever,
            transcript: Transcript::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Answer `question` in the context of the conversation so far.
    ///
    /// The transcript only grows when every step succeeds.
    pub async fn ask(&mut self, question: &str) -> Result<TurnResult, ChatError> {
        let standalone_question = self.standalone_question(question).await?;
        let context = self.retriever.retrieve(&standalone_question).await?;

        let mut messages = Vec::with_capacity(self.transcript.len() + 2);
        messages.push(ChatMessage::system(qa_system_prompt(&context)));
        messages.extend_from_slice(self.transcript.messages());
        messages.push(ChatMessage::user(standalone_question.as_str()));

        let answer = self.chat.complete(&messages).await?;
        tracing::info!(
            target: "chat",
            "turn {} answered from {} chunks",
            self.transcript.turns() + 1,
            context.len()
        );

        self.transcript.push_turn(question, answer.as_str());
        Ok(TurnResult {
            standalone_question,
            context,
            answer,
        })
    }

    async fn standalone_question(&self, question: &str) -> Result<String, ChatError> {
        if self.transcript.is_empty() {
            return Ok(question.to_string());
        }

        let mut messages = Vec::with_capacity(self.transcript.len() + 2);
        messages.push(ChatMessage::system(CONTEXTUALIZE_SYSTEM_PROMPT));
        messages.extend_from_slice(self.transcript.messages());
        messages.push(ChatMessage::user(question));

        let rewritten = self.chat.complete(&messages).await?;
        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            return Ok(question.to_string());
        }

        tracing::debug!(target: "chat", "rewrote {question:?} as {rewritten:?}");
        Ok(rewritten.to_string())
    }
}
