use std::fs;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "importer.log";

/// Initializes console logging plus a JSON file layer rotated daily under `logs/`.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// lifetime of the process.
pub fn init_logging() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("retreat_carpool=info"));

    let dir_error = fs::create_dir_all(LOG_DIR).err();
    let (file_writer, guard) = match dir_error {
        Some(_) => (None, None),
        None => {
            let file_appender = tracing_appender::rolling::daily(LOG_DIR, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(file_appender);
            (Some(writer), Some(guard))
        }
    };

    build_subscriber(filter, file_writer).init();

    if let Some(e) = dir_error {
        tracing::warn!("File logging disabled, cannot create {}: {}", LOG_DIR, e);
    }
    guard
}

/// Console layer on stderr, plus JSON lines to `file_writer` when one is given.
fn build_subscriber(
    filter: EnvFilter,
    file_writer: Option<NonBlocking>,
) -> impl Subscriber + Send + Sync + 'static {
    let file_layer = file_writer.map(|writer| fmt::layer().json().with_writer(writer));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(fmt::layer().with_writer(std::io::stderr))
}
