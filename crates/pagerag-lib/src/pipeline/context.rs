use tracing::debug;

use crate::config::NO_EVIDENCE;
use crate::pipeline::index::QueryResult;

/// Evidence handed to the chat model for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBundle {
    pub context: String,
    pub citations: String,
}

impl ContextBundle {
    /// The pair returned when no row clears the threshold.
    pub fn no_evidence() -> Self {
        Self {
            context: NO_EVIDENCE.to_string(),
            citations: NO_EVIDENCE.to_string(),
        }
    }

    pub fn has_evidence(&self) -> bool {
        *self != Self::no_evidence()
    }
}

/// Texts of one page, in result order.
struct PageGroup<'a> {
    page_index: usize,
    texts: Vec<&'a str>,
}

/// Pages of one source path, in first-seen order.
struct PathGroup<'a> {
    source_path: &'a str,
    pages: Vec<PageGroup<'a>>,
}

/// Turn similarity results into a context string and a citation list.
///
/// Rows below `threshold` are dropped. Surviving rows are grouped by path
/// then page, both in first-seen order; each page's chunk texts are joined
/// with a space and the page blocks are concatenated. Every contributing
/// `(path, page)` pair is cited exactly once.
pub fn assemble(results: &[QueryResult], threshold: f32) -> ContextBundle {
    let mut groups: Vec<PathGroup<'_>> = Vec::new();

    for result in results.iter().filter(|r| r.similarity >= threshold) {
        let chunk = &result.chunk;
        let group_idx = match groups
            .iter()
            .position(|g| g.source_path == chunk.source_path)
        {
            Some(idx) => idx,
            None => {
                groups.push(PathGroup {
                    source_path: chunk.source_path.as_str(),
                    pages: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let pages = &mut groups[group_idx].pages;
        match pages.iter().position(|p| p.page_index == chunk.page_index) {
            Some(page_idx) => pages[page_idx].texts.push(chunk.chunk_text.as_str()),
            None => pages.push(PageGroup {
                page_index: chunk.page_index,
                texts: vec![chunk.chunk_text.as_str()],
            }),
        }
    }

    if groups.is_empty() {
        debug!(
            threshold,
            candidates = results.len(),
            best = results.first().map(|r| r.similarity),
            "No result above threshold"
        );
        return ContextBundle::no_evidence();
    }

    let mut context = String::new();
    let mut citations = Vec::new();
    for group in &groups {
        for page in &group.pages {
            context.push_str(&page.texts.join(" "));
            citations.push(format_citation(group.source_path, page.page_index));
        }
    }

    debug!(
        threshold,
        sources = groups.len(),
        citations = citations.len(),
        context_len = context.len(),
        "Assembled context"
    );

    ContextBundle {
        context,
        citations: citations.join("\n"),
    }
}

/// One citation line for a `(path, page)` pair.
pub fn format_citation(source_path: &str, page_index: usize) -> String {
    format!("`File name: {source_path} | Pages: {page_index}`")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::corpus::Chunk;

    fn result(path: &str, page: usize, text: &str, similarity: f32) -> QueryResult {
        QueryResult {
            chunk: Chunk {
                source_path: path.to_string(),
                document_index: 0,
                page_index: page,
                chunk_text: text.to_string(),
            },
            position: 0,
            similarity,
        }
    }

    #[test]
    fn nothing_above_threshold_is_null_pair() {
        let results = vec![result("doc.pdf", 0, "foo", 0.5)];
        let bundle = assemble(&results, 0.8);
        assert_eq!(
            bundle,
            ContextBundle {
                context: "null".to_string(),
                citations: "null".to_string(),
            }
        );
        assert!(!bundle.has_evidence());
        assert_eq!(assemble(&[], 0.0), ContextBundle::no_evidence());
    }

    #[test]
    fn threshold_is_inclusive() {
        let bundle = assemble(&[result("doc.pdf", 1, "edge", 0.8)], 0.8);
        assert_eq!(bundle.context, "edge");
        assert_eq!(bundle.citations, "`File name: doc.pdf | Pages: 1`");
    }

    #[test]
    fn same_page_chunks_merge_and_cite_once() {
        let results = vec![
            result("doc.pdf", 0, "foo", 0.95),
            result("doc.pdf", 0, "bar", 0.9),
        ];
        let bundle = assemble(&results, 0.8);
        assert_eq!(bundle.context, "foo bar");
        assert_eq!(bundle.citations, "`File name: doc.pdf | Pages: 0`");
        assert!(bundle.has_evidence());
    }

    #[test]
    fn multiple_pages_of_one_path_get_own_lines() {
        let results = vec![
            result("doc.pdf", 4, "four", 0.99),
            result("doc.pdf", 2, "two", 0.95),
            result("doc.pdf", 4, "again", 0.9),
        ];
        let bundle = assemble(&results, 0.8);
        assert_eq!(bundle.context, "four againtwo");
        assert_eq!(
            bundle.citations,
            "`File name: doc.pdf | Pages: 4`\n`File name: doc.pdf | Pages: 2`"
        );
    }

    #[test]
    fn groups_by_path_in_first_seen_order() {
        let results = vec![
            result("b.pdf", 1, "b1", 0.99),
            result("a.pdf", 0, "a0", 0.98),
            result("b.pdf", 3, "b3", 0.97),
            result("c.pdf", 0, "c0", 0.2),
            result("a.pdf", 0, "a0-more", 0.96),
        ];
        let bundle = assemble(&results, 0.5);
        assert_eq!(bundle.context, "b1b3a0 a0-more");
        assert_eq!(
            bundle.citations,
            "`File name: b.pdf | Pages: 1`\n\
             `File name: b.pdf | Pages: 3`\n\
             `File name: a.pdf | Pages: 0`"
        );
    }

    #[test]
    fn empty_text_evidence_is_not_the_null_marker() {
        let bundle = assemble(&[result("doc.pdf", 0, "", 0.9)], 0.5);
        assert_eq!(bundle.context, "");
        assert_eq!(bundle.citations, "`File name: doc.pdf | Pages: 0`");
        assert!(bundle.has_evidence());
    }
}
