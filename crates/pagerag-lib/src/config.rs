use std::path::PathBuf;

use anyhow::Context;

/// Upper bound on the number of words per page the chunker plans windows for.
pub const DEFAULT_MAX_TOKENS: usize = 2048;

/// Most windows a chunker may plan; bounds `max_tokens` for a given stride.
pub const MAX_PLANNED_WINDOWS: usize = 1 << 20;

/// Number of whitespace-delimited words per chunk.
pub const DEFAULT_TOKENS_PER_CHUNK: usize = 25;

/// Number of words shared by adjacent chunks.
pub const DEFAULT_OVERLAP: usize = 3;

/// Default number of nearest rows fetched per query.
pub const DEFAULT_TOP_N: usize = 3;

/// Minimum cosine similarity for a row to count as evidence.
pub const DEFAULT_THRESHOLD: f32 = 0.8;

/// Marker returned for both context and citations when no row clears the
/// threshold.
pub const NO_EVIDENCE: &str = "null";

/// Emit an index-build progress line every this many embedded chunks.
pub const EMBED_PROGRESS_EVERY: usize = 50;

/// Only files with this extension are picked up from a document listing.
pub const DOCUMENT_EXTENSION: &str = ".pdf";

/// Prior chat messages replayed to the model with each question.
pub const MAX_HISTORY_MESSAGES: usize = 20;

/// File name of the index database under the pagerag home directory.
pub const INDEX_DB_FILE: &str = "index.db";

pub const DEFAULT_AZURE_API_VERSION: &str = "2023-05-15";
pub const DEFAULT_AZURE_EMBEDDING_DEPLOYMENT: &str = "text-embedding-ada-002";
pub const DEFAULT_AZURE_CHAT_DEPLOYMENT: &str = "gpt-4";

/// Which embedding backend the CLI constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedderKind {
    /// ONNX model executed in-process through fastembed.
    Local,
    /// Azure OpenAI embeddings deployment.
    Azure,
}

impl std::str::FromStr for EmbedderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "azure" => Ok(Self::Azure),
            other => anyhow::bail!("unknown embedder '{other}' (expected 'local' or 'azure')"),
        }
    }
}

/// Connection details for an Azure OpenAI resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureSettings {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub embedding_deployment: String,
    pub chat_deployment: String,
}

/// Runtime settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root directory holding the index database and the model cache.
    pub home: PathBuf,
    pub embedder: EmbedderKind,
    endpoint: Option<String>,
    api_key: Option<String>,
    api_version: String,
    embedding_deployment: String,
    chat_deployment: String,
}

impl Settings {
    /// Resolve settings from process environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let home = match get("PAGERAG_HOME") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .context("Cannot determine home directory; set PAGERAG_HOME")?
                .join(".pagerag"),
        };

        let embedder = get("PAGERAG_EMBEDDER")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(EmbedderKind::Local);

        Ok(Self {
            home,
            embedder,
            endpoint: get("AZURE_OPENAI_ENDPOINT"),
            api_key: get("AZURE_OPENAI_API_KEY"),
            api_version: get("AZURE_OPENAI_API_VERSION")
                .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            embedding_deployment: get("AZURE_OPENAI_EMBEDDING_DEPLOYMENT")
                .unwrap_or_else(|| DEFAULT_AZURE_EMBEDDING_DEPLOYMENT.to_string()),
            chat_deployment: get("AZURE_OPENAI_CHAT_DEPLOYMENT")
                .unwrap_or_else(|| DEFAULT_AZURE_CHAT_DEPLOYMENT.to_string()),
        })
    }

    /// Path of the SQLite index database.
    pub fn db_path(&self) -> PathBuf {
        self.home.join(INDEX_DB_FILE)
    }

    /// Directory the local embedding model is cached under.
    pub fn model_cache_dir(&self) -> PathBuf {
        self.home.join("models")
    }

    /// Azure credentials, failing if endpoint or key are missing.
    pub fn azure(&self) -> anyhow::Result<AzureSettings> {
        let endpoint = self
            .endpoint
            .clone()
            .context("AZURE_OPENAI_ENDPOINT is not set")?;
        let api_key = self
            .api_key
            .clone()
            .context("AZURE_OPENAI_API_KEY is not set")?;
        Ok(AzureSettings {
            endpoint,
            api_key,
            api_version: self.api_version.clone(),
            embedding_deployment: self.embedding_deployment.clone(),
            chat_deployment: self.chat_deployment.clone(),
        })
    }
}
