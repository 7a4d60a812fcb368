use tracing_subscriber::EnvFilter;

/// Filter directives, e.g. `pagerag_lib=debug`.
pub const LOG_ENV: &str = "PAGERAG_LOG";

/// Set to `json` for one JSON object per event.
pub const LOG_FORMAT_ENV: &str = "PAGERAG_LOG_FORMAT";

/// Install the global subscriber, writing to stderr so that command output on
/// stdout stays clean.
///
/// Defaults to `warn` when `PAGERAG_LOG` is unset or invalid. Calling this
/// more than once is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // A subscriber may already be installed (tests, embedding callers).
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
