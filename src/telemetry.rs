//! Structured logging wire-up for binaries and tests that embed `ragcore`.
//!
//! Wiring an actual subscriber into a running service is the host's job per
//! spec.md §1 ("Observability stack ... wire-up is external"); this helper
//! exists only so examples and integration tests have one line to call,
//! following the same `EnvFilter` + `fmt` layering every example in the
//! teacher repo uses.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a process-global `tracing` subscriber reading `RUST_LOG`
/// (defaulting to `info`). Safe to call more than once; later calls are
/// no-ops once a subscriber is already installed.
pub fn init_default_subscriber() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
