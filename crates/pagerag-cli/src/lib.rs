pub mod cli;
pub mod commands;
pub mod console;
pub mod logging;

#[cfg(test)]
pub mod test_util;

use clap::Parser;

use pagerag_lib::runtime::Runtime;

use cli::{Cli, Command, ModelCommand};
use console::Console;

/// Main CLI entry point. Parses args and dispatches to the appropriate command.
pub fn try_run(args: &[&str], runtime: &Runtime, console: &mut dyn Console) -> anyhow::Result<()> {
    let cli = Cli::try_parse_from(args)?;

    match cli.command {
        Command::Build(args) => commands::build::run_build_cmd(&args, runtime, console),
        Command::Query { text, retrieval } => {
            commands::query::run_query(&text, retrieval, runtime, console)
        }
        Command::Chat { retrieval } => commands::chat::run_chat(retrieval, runtime, console),
        Command::Status => commands::status::run_status(runtime, console),
        Command::Model { model_command } => match model_command {
            ModelCommand::Download { force } => {
                commands::model::run_model_download(force, runtime, console)
            }
        },
    }
}
