//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "COVARIATE_SIM_LOG";

const DEFAULT_FILTER: &str = "covariate_simulation=info,adjustment=info";

static INIT: Once = Once::new();

/// Install the global tracing subscriber.
///
/// Reads `COVARIATE_SIM_LOG` (e.g. `covariate_simulation=debug`) and falls
/// back to info level for this crate. Safe to call more than once.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    });
}
