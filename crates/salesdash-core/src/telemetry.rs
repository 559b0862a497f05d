//! Tracing subscriber setup for the binary

use tracing_subscriber::{fmt, EnvFilter};

/// Install a global subscriber
///
/// Honours `RUST_LOG`, falling back to `default_directive`. A second call is
/// a no-op.
pub fn init_tracing(default_directive: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let result = if json {
        fmt().with_env_filter(filter).json().try_init()
    } else {
        fmt().with_env_filter(filter).with_target(false).try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
