//! Logging setup for binaries embedding Lightcycle.

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, defaulting to
/// `info`. Set `RUST_LOG=lightcycle_board=trace` to see the grid after
/// every tick.
///
/// Does nothing if a global subscriber is already set, so tests and
/// embedding applications can call it freely.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init();
}
