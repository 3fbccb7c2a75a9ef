//! Ingest command.

use console::style;

use crate::config::Settings;
use crate::ingest::{IngestOutcome, run_ingest};
use crate::provider::embedder_from_config;

pub async fn run(settings: &Settings, force: bool, no_progress: bool) -> anyhow::Result<()> {
    let mut settings = settings.clone();
    // Progress enabled by default from settings, --no-progress overrides
    settings.show_progress = settings.show_progress && !no_progress;

    let embedder = embedder_from_config(&settings.provider);
    let mut stdout = std::io::stdout();
    let outcome = run_ingest(&settings, embedder.as_ref(), force, &mut stdout).await?;

    if let IngestOutcome::Created(stats) = outcome {
        println!(
            "{} {} chunks from {} files ({} dimensions) stored in {}",
            style("Done:").green().bold(),
            stats.chunks,
            stats.files,
            stats.dimension,
            settings.paths.store_dir.display()
        );
    }
    Ok(())
}
