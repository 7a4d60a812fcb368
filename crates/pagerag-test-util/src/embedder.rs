use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pagerag_lib::embedding::Embedder;

/// Width of every [`FakeEmbedder`] vector.
pub const FAKE_DIMENSION: usize = 64;

/// Bag-of-words embedder: each lowercase alphanumeric word adds `1.0` to the
/// bucket its FNV-1a hash selects.
///
/// Identical texts embed identically and texts sharing words score high,
/// which is all retrieval tests need.
#[derive(Debug, Clone, Default)]
pub struct FakeEmbedder {
    calls: Arc<AtomicUsize>,
    fail_on_call: Option<usize>,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share the call counter with an existing handle.
    pub fn with_counter(calls: Arc<AtomicUsize>) -> Self {
        Self {
            calls,
            fail_on_call: None,
        }
    }

    /// Fail the `n`-th call (1-based), as a rate-limited service would.
    #[must_use]
    pub fn failing_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for FakeEmbedder {
    fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            anyhow::bail!("429 Too Many Requests");
        }
        Ok(bag_of_words(text))
    }

    fn model_id(&self) -> &str {
        "fake-bow-64"
    }
}

/// The vector [`FakeEmbedder`] returns for `text`.
pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; FAKE_DIMENSION];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let bucket = fnv1a(&word.to_lowercase()) % FAKE_DIMENSION as u64;
        #[allow(clippy::cast_possible_truncation)]
        let bucket = bucket as usize;
        vector[bucket] += 1.0;
    }
    vector
}

fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}
