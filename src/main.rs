use clap::Parser;
use docchat::cli::commands;
use docchat::cli::{Cli, Commands};
use docchat::{Settings, logging};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // A missing .env is fine; keys may come from the real environment
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        anyhow::bail!("Failed to load .env: {e}");
    }

    let cli = Cli::parse();

    // Init must work before any configuration exists
    if let Commands::Init { force } = cli.command {
        return commands::init::run_init(force);
    }

    let settings = match &cli.config {
        // An explicit file must exist; only the discovered one is optional
        Some(path) if !path.is_file() => {
            anyhow::bail!("Configuration error: {} not found", path.display())
        }
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| anyhow::anyhow!("Configuration error: {e}"))?;

    logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Config => commands::init::run_config(&settings),
        Commands::Ingest { force, no_progress } => {
            commands::ingest::run(&settings, force, no_progress).await
        }
        Commands::Chat { top_k } => commands::chat::run(&settings, top_k).await,
        Commands::Search { query, limit, json } => {
            commands::search::run(&settings, &query, limit, json).await
        }
    }
}
