//! Structured logging setup.
//!
//! Library code only emits `tracing` events; binaries and test harnesses
//! call [`init_tracing`] once to route them to stderr. The filter honours
//! `RUST_LOG` and falls back to `info`.

use thiserror::Error;
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::ChronoLocal, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber is already installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInitialised(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError::AlreadyInitialised`] when called a second time
/// in the same process.
pub fn init_tracing() -> Result<(), TelemetryError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            fmt::layer()
                .with_target(false)
                .with_line_number(true)
                .with_timer(ChronoLocal::rfc_3339()),
        )
        .try_init()?;
    Ok(())
}
