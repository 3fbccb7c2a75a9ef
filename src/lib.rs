pub mod chat;
pub mod cli;
pub mod config;
pub mod documents;
pub mod ingest;
pub mod logging;
pub mod provider;
pub mod retrieve;

pub use chat::{ChatError, ConversationalRag, Transcript, TurnResult};
pub use config::Settings;
pub use documents::{DocumentChunk, SearchResult, StoreError, VectorIndex, VectorStore};
pub use ingest::{IngestError, IngestOutcome, IngestStats, run_ingest};
pub use provider::{ChatMessage, ChatModel, Embedder, ProviderError, Role};
pub use retrieve::{RetrieveError, Retriever};
