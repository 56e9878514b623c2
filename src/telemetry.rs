use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LEVEL: &str = "info";

fn env_filter(log_level: Option<&str>) -> anyhow::Result<EnvFilter> {
    match log_level {
        Some(level) => Ok(EnvFilter::try_new(level)?),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))),
    }
}

/// Install the global subscriber.
///
/// Logs go to stderr, or to `log_file` when one is given. The returned guard
/// flushes the file writer on drop and must be held until exit.
pub fn init_tracing_subscriber(
    log_level: Option<&str>,
    log_file: Option<&Path>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = env_filter(log_level)?;

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)?;
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("log file path has no file name: {}", path.display()))?;

            let file_appender = RollingFileAppender::new(Rotation::NEVER, dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(file_appender);

            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter);

            tracing_subscriber::registry().with(file_layer).try_init()?;
            Ok(Some(guard))
        }
        None => {
            let console_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter);

            tracing_subscriber::registry().with(console_layer).try_init()?;
            Ok(None)
        }
    }
}
