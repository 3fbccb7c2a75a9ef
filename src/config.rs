//! Layered configuration for docchat.
//!
//! Sources, later ones winning:
//! - Default values
//! - `.docchat/settings.toml` (found by walking up from the current directory)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `DOCCHAT_` and use double
//! underscores to separate nested levels:
//! - `DOCCHAT_RETRIEVAL__TOP_K=3` sets `retrieval.top_k`
//! - `DOCCHAT_PROVIDER__KIND=ollama` sets `provider.kind`
//! - `DOCCHAT_PATHS__DOCS_DIR=notes` sets `paths.docs_dir`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::documents::ChunkingConfig;

const CONFIG_DIR: &str = ".docchat";
const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "DOCCHAT_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Embedding and chat provider
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Show progress bars during ingestion
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PathsConfig {
    /// Directory scanned for `*.txt` documents (non-recursive)
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,

    /// Directory holding the persisted vector store
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
}

/// Which hosted service answers embedding and chat requests.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "ollama")]
    Ollama,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,

    /// Service root; defaults depend on `kind`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Environment variable holding the API key (OpenAI only)
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_model: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// Texts sent per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrievalConfig {
    /// Chunks retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `ingest = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}
fn default_store_dir() -> PathBuf {
    PathBuf::from("db/docchat_store")
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_top_k() -> usize {
    1
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            paths: PathsConfig::default(),
            chunking: ChunkingConfig::default(),
            provider: ProviderConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            logging: LoggingConfig::default(),
            show_progress: true,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            store_dir: default_store_dir(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: None,
            api_key_env: default_api_key_env(),
            embedding_model: None,
            chat_model: None,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl ProviderConfig {
    pub fn effective_base_url(&self) -> String {
        match (&self.base_url, self.kind) {
            (Some(url), _) => url.clone(),
            (None, ProviderKind::OpenAi) => "https://api.openai.com".to_string(),
            (None, ProviderKind::Ollama) => "http://localhost:11434".to_string(),
        }
    }

    pub fn effective_embedding_model(&self) -> String {
        match (&self.embedding_model, self.kind) {
            (Some(model), _) => model.clone(),
            (None, ProviderKind::OpenAi) => "text-embedding-3-small".to_string(),
            (None, ProviderKind::Ollama) => "nomic-embed-text".to_string(),
        }
    }

    pub fn effective_chat_model(&self) -> String {
        match (&self.chat_model, self.kind) {
            (Some(model), _) => model.clone(),
            (None, ProviderKind::OpenAi) => "gpt-4o-mini".to_string(),
            (None, ProviderKind::Ollama) => "llama3.2".to_string(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels; single underscores
            // stay inside field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find `.docchat/settings.toml` searching from the current directory up
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file under `.docchat/` in the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        tracing::debug!(target: "config", "wrote {}", config_path.display());

        Ok(config_path)
    }
}
