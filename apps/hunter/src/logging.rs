use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where the fmt layer writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    /// Keeps stdout free for a machine-readable payload.
    Stderr,
}

/// Installs the global subscriber. `RUST_LOG` wins when set; otherwise
/// `hunter=<level>`.
pub fn init_tracing(level: &str, target: LogTarget) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={level}", env!("CARGO_PKG_NAME"))));

    let registry = tracing_subscriber::registry().with(filter);
    match target {
        LogTarget::Stdout => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogTarget::Stderr => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
