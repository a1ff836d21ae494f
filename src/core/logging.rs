//! Diagnostic logging setup
//!
//! Diagnostics go to stderr through `tracing`; stdout is left to the
//! console progress lines and the commands' own output.

use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor `--verbose` says otherwise
pub const DEFAULT_FILTER: &str = "warn";

/// Filter selected by the global flags
pub fn default_filter(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "catload=debug,info"
    } else if quiet {
        "error"
    } else {
        DEFAULT_FILTER
    }
}

/// Install the global subscriber; `RUST_LOG` wins over the flags
///
/// Calling it twice is harmless: the second install fails and is ignored.
pub fn init_tracing(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose, quiet)));

    let _ = SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_line_number(verbose)
        .try_init();
}
