use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Initialize logging to stderr, keeping stdout free for command output.
///
/// If RUST_LOG is not set, default to `info`, or `debug` with `--verbose`.
pub fn setup_logging(verbose: bool) {
    if std::env::var("RUST_LOG").is_err() {
        // Safety: single-threaded at startup
        unsafe {
            std::env::set_var("RUST_LOG", if verbose { "debug" } else { "info" });
        }
    }

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(fmt_layer).init();

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        "Logging initialized"
    );
}
