use tracing::debug;

use crate::config::MAX_PLANNED_WINDOWS;
use crate::error::RagError;

/// Inclusive word-index range `[start, end]` covered by one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

impl Window {
    /// Number of words the window covers.
    pub const fn width(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Word-count windowing of page text into overlapping chunks.
///
/// Windows are planned once for `max_tokens` words and reused for every text,
/// so identical parameters always produce identical boundaries. "Tokens" here
/// are whitespace-delimited words, not model tokens.
#[derive(Debug, Clone)]
pub struct Chunker {
    max_tokens: usize,
    tokens_per_chunk: usize,
    overlap: usize,
    windows: Vec<Window>,
}

impl Chunker {
    /// Plan the windows for the given parameters.
    ///
    /// Fails when `overlap >= tokens_per_chunk`, when either size is zero, or
    /// when the parameters would need more than [`MAX_PLANNED_WINDOWS`]
    /// windows.
    pub fn new(max_tokens: usize, tokens_per_chunk: usize, overlap: usize) -> Result<Self, RagError> {
        if tokens_per_chunk == 0 {
            return Err(RagError::InvalidChunkConfig {
                reason: "tokens_per_chunk must be at least 1".to_string(),
            });
        }
        if overlap >= tokens_per_chunk {
            return Err(RagError::InvalidChunkConfig {
                reason: format!(
                    "overlap ({overlap}) must be smaller than tokens_per_chunk ({tokens_per_chunk})"
                ),
            });
        }
        if max_tokens == 0 {
            return Err(RagError::InvalidChunkConfig {
                reason: "max_tokens must be at least 1".to_string(),
            });
        }
        let window_count = max_tokens.div_ceil(tokens_per_chunk - overlap);
        if window_count > MAX_PLANNED_WINDOWS {
            return Err(RagError::InvalidChunkConfig {
                reason: format!(
                    "max_tokens ({max_tokens}) needs {window_count} windows of stride {}; \
                     at most {MAX_PLANNED_WINDOWS} are allowed",
                    tokens_per_chunk - overlap
                ),
            });
        }

        let windows = plan_windows(max_tokens, tokens_per_chunk, overlap);
        debug!(
            max_tokens,
            tokens_per_chunk,
            overlap,
            window_count = windows.len(),
            "Planned chunk windows"
        );

        Ok(Self {
            max_tokens,
            tokens_per_chunk,
            overlap,
            windows,
        })
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn tokens_per_chunk(&self) -> usize {
        self.tokens_per_chunk
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// The precomputed windows, in increasing start order.
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// Split `text` into chunks of whitespace-separated words.
    ///
    /// Windows are applied in order until one covers the text's last word.
    /// Words past `max_tokens` fall outside every window and are dropped.
    pub fn split(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let Some(last) = words.len().checked_sub(1) else {
            return Vec::new();
        };

        let mut chunks = Vec::new();
        for window in &self.windows {
            if window.start > last {
                break;
            }
            let end = window.end.min(last);
            let chunk = words[window.start..=end].join(" ");
            if !chunk.is_empty() {
                chunks.push(chunk);
            }
            if window.end >= last {
                break;
            }
        }

        if words.len() > self.max_tokens {
            debug!(
                word_count = words.len(),
                max_tokens = self.max_tokens,
                "Text longer than max_tokens; trailing words not chunked"
            );
        }

        chunks
    }
}

/// Windows start at 0 and advance by `tokens_per_chunk - overlap`; the last
/// one is clamped to `max_tokens - 1`. Callers bound the window count.
fn plan_windows(max_tokens: usize, tokens_per_chunk: usize, overlap: usize) -> Vec<Window> {
    let stride = tokens_per_chunk - overlap;
    let mut windows = Vec::with_capacity(max_tokens.div_ceil(stride));
    let mut start = 0;

    while start < max_tokens {
        let end = start
            .saturating_add(tokens_per_chunk - 1)
            .min(max_tokens - 1);
        windows.push(Window { start, end });
        start = start.saturating_add(stride);
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(max_tokens: usize, tokens_per_chunk: usize, overlap: usize) -> Chunker {
        Chunker::new(max_tokens, tokens_per_chunk, overlap).unwrap()
    }

    #[test]
    fn first_window_spans_tokens_per_chunk() {
        let c = chunker(100, 25, 3);
        assert_eq!(c.windows()[0], Window { start: 0, end: 24 });
        assert_eq!(c.windows()[1], Window { start: 22, end: 46 });
    }

    #[test]
    fn windows_strictly_increase_and_keep_length() {
        for (tpc, overlap) in [(1, 0), (2, 1), (3, 1), (5, 0), (25, 3), (10, 9)] {
            let c = chunker(97, tpc, overlap);
            let windows = c.windows();
            assert!(!windows.is_empty());
            for pair in windows.windows(2) {
                assert!(pair[1].start > pair[0].start, "tpc={tpc} overlap={overlap}");
                assert_eq!(pair[1].start, pair[0].end + 1 - overlap);
            }
            let (last, body) = windows.split_last().unwrap();
            for w in body {
                assert_eq!(w.width(), tpc);
            }
            assert!(last.width() <= tpc);
            assert_eq!(last.end, 96);
        }
    }

    #[test]
    fn generation_stops_at_max_tokens() {
        let c = chunker(10, 4, 1);
        assert_eq!(
            c.windows(),
            &[
                Window { start: 0, end: 3 },
                Window { start: 3, end: 6 },
                Window { start: 6, end: 9 },
                Window { start: 9, end: 9 },
            ]
        );
    }

    #[test]
    fn same_parameters_same_windows() {
        assert_eq!(chunker(512, 25, 3).windows(), chunker(512, 25, 3).windows());
    }

    #[test]
    fn overlap_not_smaller_than_chunk_is_rejected() {
        assert_eq!(
            Chunker::new(100, 3, 3).unwrap_err(),
            RagError::InvalidChunkConfig {
                reason: "overlap (3) must be smaller than tokens_per_chunk (3)".to_string()
            }
        );
        assert!(matches!(
            Chunker::new(100, 3, 7),
            Err(RagError::InvalidChunkConfig { .. })
        ));
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert!(matches!(
            Chunker::new(100, 0, 0),
            Err(RagError::InvalidChunkConfig { .. })
        ));
        assert!(matches!(
            Chunker::new(0, 3, 1),
            Err(RagError::InvalidChunkConfig { .. })
        ));
    }

    #[test]
    fn oversized_max_tokens_is_rejected() {
        assert!(matches!(
            Chunker::new(usize::MAX, 2, 0),
            Err(RagError::InvalidChunkConfig { .. })
        ));
        assert!(matches!(
            Chunker::new(10_000_000_000, 25, 3),
            Err(RagError::InvalidChunkConfig { .. })
        ));
    }

    #[test]
    fn window_count_at_the_bound_is_accepted() {
        let c = chunker(MAX_PLANNED_WINDOWS, 1, 0);
        assert_eq!(c.windows().len(), MAX_PLANNED_WINDOWS);
        assert!(matches!(
            Chunker::new(MAX_PLANNED_WINDOWS + 1, 1, 0),
            Err(RagError::InvalidChunkConfig { .. })
        ));
    }

    #[test]
    fn huge_chunk_size_does_not_overflow() {
        let c = chunker(usize::MAX, usize::MAX, 0);
        assert_eq!(
            c.windows(),
            &[Window {
                start: 0,
                end: usize::MAX - 1
            }]
        );
        assert_eq!(c.split("a b c"), vec!["a b c"]);
    }

    #[test]
    fn split_empty_text_yields_nothing() {
        let c = chunker(100, 3, 1);
        assert!(c.split("").is_empty());
        assert!(c.split("   \n\t ").is_empty());
    }

    #[test]
    fn split_three_by_one() {
        let c = chunker(100, 3, 1);
        assert_eq!(c.split("a b c d e"), vec!["a b c", "c d e"]);
    }

    #[test]
    fn split_emits_short_tail() {
        let c = chunker(100, 3, 1);
        assert_eq!(c.split("a b c d e f"), vec!["a b c", "c d e", "e f"]);
        assert_eq!(c.split("a b"), vec!["a b"]);
        assert_eq!(c.split("solo"), vec!["solo"]);
    }

    #[test]
    fn split_normalizes_whitespace() {
        let c = chunker(100, 2, 0);
        assert_eq!(c.split("  one\ttwo\n\nthree  "), vec!["one two", "three"]);
    }

    #[test]
    fn split_drops_words_past_max_tokens() {
        let c = chunker(4, 2, 0);
        assert_eq!(c.split("a b c d e f"), vec!["a b", "c d"]);
    }

    #[test]
    fn split_is_deterministic() {
        let c = chunker(2048, 25, 3);
        let text = "lorem ipsum dolor sit amet ".repeat(40);
        assert_eq!(c.split(&text), c.split(&text));
    }

    #[test]
    fn split_chunks_share_overlap_words() {
        let c = chunker(2048, 5, 2);
        let text: Vec<String> = (0..12).map(|i| format!("w{i}")).collect();
        let chunks = c.split(&text.join(" "));
        assert_eq!(
            chunks,
            vec![
                "w0 w1 w2 w3 w4",
                "w3 w4 w5 w6 w7",
                "w6 w7 w8 w9 w10",
                "w9 w10 w11",
            ]
        );
    }
}
