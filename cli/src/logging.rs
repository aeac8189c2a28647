// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static LOGGER_INIT: Once = Once::new();

/// Filter used when `RUST_LOG` is unset
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install the stderr subscriber. Later calls are no-ops.
pub fn init_logging(verbose: bool) {
    LOGGER_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
        // A subscriber installed elsewhere (e.g. by a test harness) wins
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
