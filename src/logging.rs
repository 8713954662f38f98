//! Tracing initialization

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter directives
pub const LOG_ENV: &str = "BENFORD_LOG";

/// Install the global subscriber.
///
/// Reads [`LOG_ENV`] for filter directives, e.g. `BENFORD_LOG=benford::store=debug`,
/// falling back to `benford=info`. Logs go to stderr so stdout only carries
/// command output. Later calls are no-ops.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("benford=info"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .init();
    });
}
