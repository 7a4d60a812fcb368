use std::io::Write;
use std::path::{Path, PathBuf};

/// One extracted-page record as a JSONL line.
pub fn page_record(source_path: &str, page_index: usize, raw_text: &str) -> String {
    serde_json::json!({
        "source_path": source_path,
        "page_index": page_index,
        "raw_text": raw_text,
    })
    .to_string()
}

/// Write `(source_path, page_index, raw_text)` records to `pages.jsonl` in
/// `dir`, returning the file path.
pub fn write_pages_jsonl(dir: &Path, pages: &[(&str, usize, &str)]) -> PathBuf {
    let path = dir.join("pages.jsonl");
    let mut f = std::fs::File::create(&path).unwrap();
    for (source_path, page_index, raw_text) in pages {
        writeln!(f, "{}", page_record(source_path, *page_index, raw_text)).unwrap();
    }
    path
}
