//! Diagnostic logging setup.
//!
//! Operator output goes through `crate::output`; tracing events go to stderr
//! and are filtered by `CONVOY_LOG` (an `EnvFilter` directive string).

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "CONVOY_LOG";

/// Directive used when `--verbose` is passed and `CONVOY_LOG` is unset.
const VERBOSE_DIRECTIVE: &str = "convoy_cli=debug";

/// Directive used when neither `--verbose` nor `CONVOY_LOG` is set.
const DEFAULT_DIRECTIVE: &str = "warn";

/// Build the filter for this invocation.
#[must_use]
pub fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            VERBOSE_DIRECTIVE
        } else {
            DEFAULT_DIRECTIVE
        })
    })
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(verbose: bool, no_color: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .try_init();
}
