use crate::chat::ChatModel;
use crate::chat::azure::AzureOpenAiChat;
use crate::config::{EmbedderKind, Settings};
use crate::db::driver::DatabaseDriver;
use crate::embedding::Embedder;
use crate::embedding::azure::AzureOpenAiEmbedder;
use crate::embedding::local::LocalEmbedder;

/// Constructs the external collaborators a command needs.
pub trait ModelProvider {
    fn embedder(
        &self,
        settings: &Settings,
        kind: EmbedderKind,
    ) -> anyhow::Result<Box<dyn Embedder>>;

    fn chat_model(&self, settings: &Settings) -> anyhow::Result<Box<dyn ChatModel>>;
}

/// Local ONNX or Azure OpenAI collaborators, as configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfiguredModels;

impl ModelProvider for ConfiguredModels {
    fn embedder(
        &self,
        settings: &Settings,
        kind: EmbedderKind,
    ) -> anyhow::Result<Box<dyn Embedder>> {
        Ok(match kind {
            EmbedderKind::Local => Box::new(LocalEmbedder::new(&settings.model_cache_dir())?),
            EmbedderKind::Azure => Box::new(AzureOpenAiEmbedder::new(&settings.azure()?)?),
        })
    }

    fn chat_model(&self, settings: &Settings) -> anyhow::Result<Box<dyn ChatModel>> {
        Ok(Box::new(AzureOpenAiChat::new(&settings.azure()?)?))
    }
}

/// Everything a command needs from its environment.
pub struct Runtime {
    pub settings: Settings,
    pub db: DatabaseDriver,
    pub models: Box<dyn ModelProvider>,
}

impl Runtime {
    /// File-backed database under the settings' home, real collaborators.
    pub fn from_settings(settings: Settings) -> Self {
        let db = DatabaseDriver::file(settings.db_path());
        Self {
            settings,
            db,
            models: Box::new(ConfiguredModels),
        }
    }

    /// Embedder of the given kind, defaulting to the configured one.
    pub fn embedder(&self, kind: Option<EmbedderKind>) -> anyhow::Result<Box<dyn Embedder>> {
        self.models
            .embedder(&self.settings, kind.unwrap_or(self.settings.embedder))
    }

    pub fn chat_model(&self) -> anyhow::Result<Box<dyn ChatModel>> {
        self.models.chat_model(&self.settings)
    }
}
