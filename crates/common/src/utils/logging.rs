use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Backend filter: request handling in `server` at debug, the HTTP stack at info.
pub const BACKEND_FILTER: &str = "info,server=debug,tower_http=info";
/// Client filter: quiet unless something goes wrong.
pub const CLI_FILTER: &str = "warn";

/// `RUST_LOG` when it parses, otherwise `fallback`.
fn filter_or(rust_log: Option<String>, fallback: &str) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

fn env_filter(fallback: &str) -> EnvFilter {
    filter_or(std::env::var("RUST_LOG").ok(), fallback)
}

/// Human-readable backend logs on stdout, filtered by [`BACKEND_FILTER`] unless `RUST_LOG` is set.
pub fn init_logging_default() {
    let _ = fmt()
        .with_env_filter(env_filter(BACKEND_FILTER))
        .with_target(true)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// One JSON object per event on stdout; enabled by `logging.json = true`.
pub fn init_logging_json() {
    let _ = fmt()
        .with_env_filter(env_filter(BACKEND_FILTER))
        .with_target(false)
        .json()
        .with_writer(io::stdout)
        .try_init();
}

/// Client logs go to stderr so task listings on stdout stay clean.
/// `RUST_LOG=service=debug` shows each request.
pub fn init_logging_cli() {
    let _ = fmt()
        .with_env_filter(env_filter(CLI_FILTER))
        .with_target(true)
        .compact()
        .with_writer(io::stderr)
        .try_init();
}
