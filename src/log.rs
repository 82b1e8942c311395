use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_FILE: &str = "aggwalk.log";

/// Install the global subscriber.
///
/// Events go to stderr, filtered by `RUST_LOG` (default `info`), so stdout
/// stays free for table and JSON output. With `log_dir` set they are also
/// written to a daily rolling file; keep the returned guard alive until exit
/// or buffered lines are lost.
pub fn init(log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(rolling::daily(dir, LOG_FILE));
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false); // no color codes in file
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .is_ok();

    if !installed {
        tracing::debug!("subscriber already installed; keeping the existing one");
    }

    guard
}
