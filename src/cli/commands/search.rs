//! Search command: retrieval only, no language model.

use std::sync::Arc;

use console::style;

use crate::config::Settings;
use crate::documents::VectorStore;
use crate::provider::embedder_from_config;
use crate::retrieve::Retriever;

const PREVIEW_CHARS: usize = 200;

pub async fn run(
    settings: &Settings,
    query: &str,
    limit: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let embedder = embedder_from_config(&settings.provider);
    let store = VectorStore::open_for(&settings.paths.store_dir, &embedder.signature())?;

    let retriever = Retriever::new(
        embedder,
        Arc::new(store),
        limit.unwrap_or(settings.retrieval.top_k),
    );
    let results = retriever.retrieve(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        eprintln!("No results found.");
    } else {
        for (i, result) in results.iter().enumerate() {
            println!(
                "\n{}. {} {} (score: {:.3})",
                i + 1,
                style(format!("#{}", result.chunk.id.get())).cyan(),
                result.chunk.source_path.display(),
                result.similarity
            );
            println!("   Preview: {}", result.chunk.preview(PREVIEW_CHARS).replace('\n', " "));
        }
    }
    Ok(())
}
