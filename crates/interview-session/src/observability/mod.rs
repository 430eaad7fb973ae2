//! Observability for the interview session controller.
//!
//! - [`metrics`] - `interview_session_*` counters and histograms
//! - [`init_tracing`] - subscriber setup for host binaries

pub mod metrics;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Set `json` for
/// machine-readable output.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(
    default_filter: &str,
    json: bool,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_fails() {
        // Other tests may have installed a subscriber already; only the
        // second call in this test is guaranteed to fail.
        let _ = init_tracing("interview_session=debug", false);
        assert!(init_tracing("interview_session=debug", true).is_err());
    }
}
