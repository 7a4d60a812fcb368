use pagerag_lib::chat::session::{AskParams, ChatSession};
use pagerag_lib::db::driver::DatabaseDriver;
use pagerag_lib::db::store::read_index_meta;
use pagerag_lib::pipeline::build::{load_retriever, run_build};
use pagerag_lib::pipeline::chunker::Chunker;
use pagerag_lib::source::jsonl::JsonlPageSource;
use pagerag_lib::RagError;
use pagerag_test_util::chat::ScriptedChat;
use pagerag_test_util::embedder::FakeEmbedder;
use pagerag_test_util::pages::write_pages_jsonl;

const PAGES: &[(&str, usize, &str)] = &[
    (
        "handbook/boiler.pdf",
        0,
        "The boiler must be serviced every twelve months by a certified engineer.",
    ),
    (
        "handbook/boiler.pdf",
        1,
        "Bleed the radiators when the pressure gauge reads below one bar.",
    ),
    (
        "handbook/garden.pdf",
        0,
        "Prune roses in late winter before new growth appears.",
    ),
    ("handbook/notes.txt", 0, "not a document"),
    ("archive/boiler.pdf", 0, "superseded instructions"),
];

#[test]
fn build_persist_reload_and_answer() {
    let tmp = tempfile::tempdir().unwrap();
    let pages = write_pages_jsonl(tmp.path(), PAGES);
    let db = DatabaseDriver::file(tmp.path().join("store").join("index.db"));
    let chunker = Chunker::new(64, 6, 2).unwrap();

    let mut conn = db.open().unwrap();
    let mut embedder = FakeEmbedder::new();
    let built = run_build(
        &JsonlPageSource::new(&pages),
        "handbook/",
        &chunker,
        &mut embedder,
        &mut conn,
    )
    .unwrap();

    assert_eq!(built.summary.documents, 2);
    assert_eq!(built.summary.pages, 3);
    assert_eq!(embedder.calls(), built.summary.chunks);
    drop(conn);

    // A fresh connection sees exactly what was committed.
    let conn = db.open().unwrap();
    let retriever = load_retriever(&conn).unwrap();
    assert_eq!(*retriever.snapshot().unwrap(), built.index);

    let bundle = retriever
        .answer_context(&mut embedder, "Prune roses in late winter", 3, 0.8)
        .unwrap();
    assert_eq!(bundle.context, "Prune roses in late winter before");
    assert_eq!(bundle.citations, "`File name: handbook/garden.pdf | Pages: 0`");

    let nothing = retriever
        .answer_context(&mut embedder, "quantum chromodynamics lattice", 3, 0.8)
        .unwrap();
    assert!(!nothing.has_evidence());
    assert_eq!(nothing.context, "null");
    assert_eq!(nothing.citations, "null");
}

#[test]
fn rebuild_replaces_the_previous_index() {
    let tmp = tempfile::tempdir().unwrap();
    let pages = write_pages_jsonl(tmp.path(), PAGES);
    let db = DatabaseDriver::file(tmp.path().join("index.db"));
    let chunker = Chunker::new(64, 6, 2).unwrap();
    let source = JsonlPageSource::new(&pages);
    let mut conn = db.open().unwrap();

    run_build(&source, "handbook/", &chunker, &mut FakeEmbedder::new(), &mut conn).unwrap();
    let narrowed = run_build(
        &source,
        "handbook/garden",
        &chunker,
        &mut FakeEmbedder::new(),
        &mut conn,
    )
    .unwrap();

    let meta = read_index_meta(&conn).unwrap().unwrap();
    assert_eq!(meta.row_count, narrowed.summary.chunks);
    let retriever = load_retriever(&conn).unwrap();
    assert!(
        retriever
            .snapshot()
            .unwrap()
            .rows()
            .iter()
            .all(|r| r.chunk.source_path == "handbook/garden.pdf")
    );

    // The live retriever can take the rebuilt index without a reload.
    let swapped_out = retriever.swap(narrowed.index).unwrap();
    assert_eq!(swapped_out.len(), meta.row_count);
}

#[test]
fn failed_rebuild_keeps_serving_the_old_index() {
    let tmp = tempfile::tempdir().unwrap();
    let pages = write_pages_jsonl(tmp.path(), PAGES);
    let db = DatabaseDriver::file(tmp.path().join("index.db"));
    let chunker = Chunker::new(64, 6, 2).unwrap();
    let source = JsonlPageSource::new(&pages);
    let mut conn = db.open().unwrap();

    let first = run_build(&source, "handbook/", &chunker, &mut FakeEmbedder::new(), &mut conn)
        .unwrap();

    let mut flaky = FakeEmbedder::new().failing_on_call(3);
    let err = run_build(&source, "handbook/", &chunker, &mut flaky, &mut conn).unwrap_err();
    assert_eq!(
        err.downcast_ref::<RagError>(),
        Some(&RagError::Embedding("429 Too Many Requests".to_string()))
    );

    assert_eq!(load_retriever(&conn).unwrap().snapshot().unwrap().len(), first.index.len());
}

#[test]
fn chat_session_over_a_built_index() {
    let tmp = tempfile::tempdir().unwrap();
    let pages = write_pages_jsonl(tmp.path(), PAGES);
    let db = DatabaseDriver::file(tmp.path().join("index.db"));
    let chunker = Chunker::new(64, 6, 2).unwrap();
    let mut conn = db.open().unwrap();
    let mut embedder = FakeEmbedder::new();
    run_build(
        &JsonlPageSource::new(&pages),
        "handbook/",
        &chunker,
        &mut embedder,
        &mut conn,
    )
    .unwrap();
    let retriever = load_retriever(&conn).unwrap();

    let mut chat = ScriptedChat::new(&["Once a year.", "I cannot find that in the documents."]);
    let mut session = ChatSession::new();
    let params = AskParams {
        top_n: 3,
        threshold: 0.8,
    };

    let answer = session
        .ask(
            "The boiler must be serviced every twelve",
            &retriever,
            &mut embedder,
            &mut chat,
            params,
        )
        .unwrap();
    assert_eq!(answer.text, "Once a year.");
    assert_eq!(
        answer.citations.as_deref(),
        Some("`File name: handbook/boiler.pdf | Pages: 0`")
    );

    let answer = session
        .ask("who won the cup final", &retriever, &mut embedder, &mut chat, params)
        .unwrap();
    assert_eq!(answer.citations, None);
    assert_eq!(session.history().len(), 4);
}
