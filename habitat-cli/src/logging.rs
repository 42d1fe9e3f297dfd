//! Log subscriber installation.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install an `RUST_LOG`-driven subscriber writing to stderr.
///
/// Records emitted through `log` by the library crates are forwarded to the
/// same subscriber. A second call is a no-op.
pub(crate) fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
    if installed.is_err() {
        log::debug!("log subscriber already installed");
    }
}
