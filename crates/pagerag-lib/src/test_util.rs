use std::collections::HashMap;

use crate::embedding::Embedder;

/// Embedder returning canned vectors and recording every call.
pub struct TableEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    pub calls: Vec<String>,
    fail_on: Option<String>,
}

impl TableEmbedder {
    pub fn new(entries: &[(&str, &[f32])]) -> Self {
        Self {
            vectors: entries
                .iter()
                .map(|(text, v)| ((*text).to_string(), v.to_vec()))
                .collect(),
            calls: Vec::new(),
            fail_on: None,
        }
    }

    /// Make `embed` fail when it sees `text`.
    pub fn failing_on(mut self, text: &str) -> Self {
        self.fail_on = Some(text.to_string());
        self
    }
}

impl Embedder for TableEmbedder {
    fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.push(text.to_string());
        if self.fail_on.as_deref() == Some(text) {
            anyhow::bail!("rate limited");
        }
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no vector for {text:?}"))
    }

    fn model_id(&self) -> &str {
        "table"
    }
}
