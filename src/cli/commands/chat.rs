//! Chat command.

use std::sync::Arc;

use crate::chat::{ConversationalRag, run_repl};
use crate::config::Settings;
use crate::documents::VectorStore;
use crate::provider::{chat_model_from_config, embedder_from_config};
use crate::retrieve::Retriever;

pub async fn run(settings: &Settings, top_k: Option<usize>) -> anyhow::Result<()> {
    let embedder = embedder_from_config(&settings.provider);
    let store = VectorStore::open_for(&settings.paths.store_dir, &embedder.signature())?;
    let chat = chat_model_from_config(&settings.provider);

    tracing::info!(
        target: "chat",
        "session started: {} chunks, chat model {}",
        store.len(),
        chat.model_name()
    );

    let top_k = top_k.unwrap_or(settings.retrieval.top_k);
    let retriever = Retriever::new(embedder, Arc::new(store), top_k);
    let mut rag = ConversationalRag::new(chat, retriever);

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    run_repl(&mut rag, stdin.lock(), &mut stdout).await?;
    Ok(())
}
