//! Logging setup for the `snaptar` binary.
//!
//! Events are written to stderr through `tracing-subscriber`. The filter is
//! taken from `SNAPTAR_LOG` when set (standard `EnvFilter` syntax), otherwise
//! `info`, or `debug` for this crate when running verbose.

use std::io::IsTerminal;

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "SNAPTAR_LOG";

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "info,snaptar=debug"
    } else {
        "info"
    }
}

/// Builds the filter the subscriber will use.
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Installs the global subscriber.
///
/// Fails if one is already installed.
pub fn init_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_crate_level() {
        assert_eq!(default_directive(false), "info");
        assert!(default_directive(true).contains("snaptar=debug"));
    }
}
