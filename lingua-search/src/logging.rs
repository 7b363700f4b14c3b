//! Tracing subscriber setup for the binaries.

use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Install a registry with an `EnvFilter` from `RUST_LOG` (or `default_filter`)
/// and a fmt layer on stderr. Later calls are no-ops.
pub fn init_tracing(default_filter: &str) {
    INIT.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init();
    });
}
