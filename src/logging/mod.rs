// Logging module for structured logging using the tracing crate

use std::error::Error;
use tracing_subscriber::EnvFilter;

/// Default filter directive when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "info";

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - Filtering from `RUST_LOG` (falls back to `info`)
/// - JSON formatting when `json` is true, human-readable lines otherwise
/// - Output to stderr so encoded images can be piped through stdout
///
/// # Errors
///
/// Returns an error if a global subscriber was already installed.
///
/// # Examples
///
/// ```
/// use photomark::logging::init_subscriber;
///
/// init_subscriber(false).expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(json: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.compact().try_init()
    }
}
