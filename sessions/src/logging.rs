//! Diagnostics for the session engine, written to stderr.
//!
//! Script output and menu text go to stdout and never pass through here, so
//! `RUST_LOG` changes what is traced without changing what the user sees.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset or unparsable.
const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the global subscriber: `RUST_LOG` filter, compact lines on stderr.
///
/// A second call keeps the subscriber already installed.
///
/// ```bash
/// RUST_LOG=sessions=debug evc-sessions status
/// ```
pub fn init() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter_from(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}
