//! Logging Infrastructure
//!
//! `RUST_LOG` wins over the configured level when set. With a log directory,
//! output goes to a daily rolling file `slab-server.YYYY-MM-DD` instead of
//! stdout.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber; later calls are no-ops.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.unwrap_or("info")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    match log_dir.map(Path::new).filter(|dir| dir.is_dir()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "slab-server");
            let _ = builder.with_ansi(false).with_writer(appender).try_init();
        }
        None => {
            let _ = builder.try_init();
        }
    }
}
