//! System prompts for question rewriting and answer synthesis.

use crate::documents::SearchResult;

pub const CONTEXTUALIZE_SYSTEM_PROMPT: &str = "Given a chat history and the latest user question \
which might reference context in the chat history, formulate a standalone question which can be \
understood without the chat history. Do NOT answer the question, just reformulate it if needed \
and otherwise return it as is.";

const QA_SYSTEM_PREAMBLE: &str = "You are an assistant for question-answering tasks. Use the \
following pieces of retrieved context to answer the question. If you don't know the answer, just \
say that you don't know. Use five sentences maximum and keep the answer concise.";

/// QA system prompt with the retrieved chunk texts appended, separated by blank lines.
pub fn qa_system_prompt(context: &[SearchResult]) -> String {
    let joined = context
        .iter()
        .map(|r| r.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{QA_SYSTEM_PREAMBLE}\n\n{joined}")
}
