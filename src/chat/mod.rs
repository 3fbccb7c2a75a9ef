//! Conversational question answering over the ingested documents.

pub mod pipeline;
pub mod prompts;
pub mod repl;
pub mod transcript;

use thiserror::Error;

use crate::documents::StoreError;
use crate::provider::ProviderError;
use crate::retrieve::RetrieveError;

pub use pipeline::{ConversationalRag, TurnResult};
pub use repl::{is_exit_command, run_repl};
pub use transcript::Transcript;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Console error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RetrieveError> for ChatError {
    fn from(err: RetrieveError) -> Self {
        match err {
            RetrieveError::Provider(e) => ChatError::Provider(e),
            RetrieveError::Store(e) => ChatError::Store(e),
        }
    }
}
