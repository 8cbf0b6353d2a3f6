use std::fs;
use std::path::Path;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "delivery_insights.log";
const DEFAULT_DIRECTIVE: &str = "delivery_insights=info";

/// Initializes logging with a console layer on stderr and a daily JSON file.
/// Stdout is left to command output.
///
/// The JSON file under `logs/` doubles as the audit trail for cleaning: every
/// row a cleaner rejects is a `debug` event carrying its table, row index and
/// reason, kept when `RUST_LOG=delivery_insights=debug`.
pub fn init_logging() {
    init_logging_in(Path::new(LOG_DIR));
}

/// Same as [`init_logging`] with the JSON file under `dir`. Only the first
/// call in a process installs a subscriber.
pub fn init_logging_in(dir: &Path) {
    let _ = fs::create_dir_all(dir);

    let (audit_writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE));
    let audit_layer = fmt::layer().json().with_writer(audit_writer);
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(audit_layer)
        .with(console_layer)
        .try_init()
        .is_ok();

    if installed {
        // Flushes on drop; the subscriber lives as long as the process
        std::mem::forget(guard);
    }
}
