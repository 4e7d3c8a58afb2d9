use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes the global tracing subscriber.
///
/// Diagnostics go to stderr so they never interleave with the interactive
/// console output on stdout. The returned guard must be held for the
/// process lifetime to ensure logs are flushed on exit.
pub fn init() -> tracing_appender::non_blocking::WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rotor=info"));

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_line_number(true)
                .with_writer(non_blocking_writer),
        )
        .with(filter)
        .init();

    guard
}
