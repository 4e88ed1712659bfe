use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const TUI_DEFAULT_FILTER: &str = "neobbs=info";
const CLI_DEFAULT_FILTER: &str = "neobbs=warn";

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Routes logs to `log_path`; the terminal belongs to the TUI while it runs.
///
/// Keep the returned guard alive until exit so buffered lines get flushed.
pub fn init_file_logging(log_path: &Path) -> Result<WorkerGuard, io::Error> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options.open(log_path)?;

    let (writer, guard) = tracing_appender::non_blocking(file);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(false)
        .with_ansi(false)
        .with_filter(env_filter(TUI_DEFAULT_FILTER));

    let _ = tracing_subscriber::registry().with(file_layer).try_init();
    Ok(guard)
}

pub fn init_stderr_logging() {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(env_filter(CLI_DEFAULT_FILTER));

    let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
}
