use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pagerag_lib::chat::ChatModel;
use pagerag_lib::config::{EmbedderKind, Settings};
use pagerag_lib::db::driver::DatabaseDriver;
use pagerag_lib::embedding::Embedder;
use pagerag_lib::runtime::{ModelProvider, Runtime};

use crate::chat::{ScriptedChat, Transcript};
use crate::embedder::FakeEmbedder;

/// Hands out [`FakeEmbedder`]s and [`ScriptedChat`]s that share counters and
/// a transcript with the test.
#[derive(Debug, Clone, Default)]
pub struct FakeModels {
    replies: Vec<String>,
    embed_calls: Arc<AtomicUsize>,
    transcript: Transcript,
    fail_embed_on_call: Option<usize>,
}

impl FakeModels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replies the chat model gives, in order.
    #[must_use]
    pub fn with_replies(mut self, replies: &[&str]) -> Self {
        self.replies = replies.iter().map(|r| (*r).to_string()).collect();
        self
    }

    /// Make the `n`-th embedding call (counted across embedders) fail.
    #[must_use]
    pub fn failing_embed_on_call(mut self, n: usize) -> Self {
        self.fail_embed_on_call = Some(n);
        self
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn transcript(&self) -> Transcript {
        Arc::clone(&self.transcript)
    }
}

impl ModelProvider for FakeModels {
    fn embedder(
        &self,
        _settings: &Settings,
        _kind: EmbedderKind,
    ) -> anyhow::Result<Box<dyn Embedder>> {
        let mut embedder = FakeEmbedder::with_counter(Arc::clone(&self.embed_calls));
        if let Some(n) = self.fail_embed_on_call {
            embedder = embedder.failing_on_call(n);
        }
        Ok(Box::new(embedder))
    }

    fn chat_model(&self, _settings: &Settings) -> anyhow::Result<Box<dyn ChatModel>> {
        let replies: Vec<&str> = self.replies.iter().map(String::as_str).collect();
        Ok(Box::new(
            ScriptedChat::new(&replies).with_transcript(self.transcript()),
        ))
    }
}

fn settings_for(home: PathBuf) -> Settings {
    Settings::from_lookup(|key| match key {
        "PAGERAG_HOME" => Some(home.display().to_string()),
        _ => None,
    })
    .unwrap()
}

/// A [`Runtime`] with an in-memory database, a tempdir home and `models`.
///
/// The `name` must be unique per test to prevent cross-test DB collisions.
/// Hold the returned [`tempfile::TempDir`] for the duration of the test.
pub fn runtime_in_memory(name: &str, models: FakeModels) -> (tempfile::TempDir, Runtime) {
    let tmp = tempfile::tempdir().unwrap();
    let runtime = Runtime {
        settings: settings_for(tmp.path().to_path_buf()),
        db: DatabaseDriver::in_memory(name).unwrap(),
        models: Box::new(models),
    };
    (tmp, runtime)
}

/// A [`Runtime`] whose database file does not exist yet.
pub fn runtime_not_built(models: FakeModels) -> (tempfile::TempDir, Runtime) {
    let tmp = tempfile::tempdir().unwrap();
    let settings = settings_for(tmp.path().to_path_buf());
    let runtime = Runtime {
        db: DatabaseDriver::file(settings.db_path()),
        settings,
        models: Box::new(models),
    };
    (tmp, runtime)
}
