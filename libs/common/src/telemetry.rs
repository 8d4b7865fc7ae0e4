//! Tracing setup shared by the binaries

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber, writing to stderr
///
/// `RUST_LOG` wins over `default_filter` when set. Calling this twice is
/// harmless; the second installation is ignored.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
