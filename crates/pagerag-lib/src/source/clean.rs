use std::sync::LazyLock;

use regex::Regex;

/// Characters outside letters, digits, whitespace and a small set of
/// punctuation used in technical prose.
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\p{L}\p{N}\s.,!?_(){}\[\]+=\-/*]+").expect("static regex")
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

static DOT_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.(\s?\.)+").expect("static regex"));

/// Normalize text extracted from a PDF page before chunking.
///
/// Strips symbols, collapses whitespace (including line breaks) to single
/// spaces and squeezes runs of dots such as table-of-contents leaders.
pub fn clean_text(raw: &str) -> String {
    let text = DISALLOWED.replace_all(raw, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    let text = DOT_RUNS.replace_all(&text, ".");
    text.trim().to_string()
}
