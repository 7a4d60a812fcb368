use std::process::ExitCode;

use pagerag_cli::console::StdConsole;
use pagerag_lib::config::Settings;
use pagerag_lib::runtime::Runtime;

fn main() -> ExitCode {
    pagerag_cli::logging::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Help and version requests arrive as clap errors.
            if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
                let _ = clap_err.print();
                return if clap_err.use_stderr() {
                    ExitCode::from(2)
                } else {
                    ExitCode::SUCCESS
                };
            }
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let runtime = Runtime::from_settings(Settings::from_env()?);
    let mut console = StdConsole::new();
    pagerag_cli::try_run(&args, &runtime, &mut console)
}
