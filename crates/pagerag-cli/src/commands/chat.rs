use std::io::Write;

use tracing::warn;

use pagerag_lib::chat::session::{AskParams, ChatSession};
use pagerag_lib::runtime::Runtime;

use crate::cli::RetrievalArgs;
use crate::commands::open_retriever;
use crate::console::Console;

const PROMPT: &str = "> ";

/// Run the `pagerag chat` command.
///
/// Reads one question per line until `/exit` or end of input. A failed turn
/// is reported and the conversation continues.
pub fn run_chat(
    retrieval: RetrievalArgs,
    runtime: &Runtime,
    console: &mut dyn Console,
) -> anyhow::Result<()> {
    let mut embedder = runtime.embedder(retrieval.embedder)?;
    let retriever = open_retriever(runtime, &*embedder)?;
    let mut model = runtime.chat_model()?;

    let params = AskParams {
        top_n: retrieval.top_n,
        threshold: retrieval.threshold,
    };
    let mut session = ChatSession::new();

    writeln!(
        console.err(),
        "Ask a question about the documents. /reset clears the conversation, /exit quits."
    )?;

    let mut line = String::new();
    loop {
        write!(console.out(), "{PROMPT}")?;
        console.out().flush()?;

        line.clear();
        if console.input().read_line(&mut line)? == 0 {
            writeln!(console.out())?;
            break;
        }

        match line.trim() {
            "" => {}
            "/exit" => break,
            "/reset" => {
                session.reset();
                writeln!(console.out(), "Conversation cleared.")?;
            }
            question => match session.ask(question, &retriever, &mut embedder, &mut model, params)
            {
                Ok(answer) => writeln!(console.out(), "{}\n", answer.render())?,
                Err(err) => {
                    warn!(error = %err, "Chat turn failed");
                    writeln!(console.err(), "Error: {err}")?;
                }
            },
        }
    }

    Ok(())
}
