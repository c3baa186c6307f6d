//! Log output for the binary.
//!
//! Logs go to stderr so `serve` keeps stdout for protocol messages.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "notekeep=warn",
        1 => "notekeep=info",
        2 => "notekeep=debug",
        _ => "notekeep=trace",
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `-v`.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(verbosity: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_directive(0), "notekeep=warn");
        assert_eq!(default_directive(1), "notekeep=info");
        assert_eq!(default_directive(2), "notekeep=debug");
        assert_eq!(default_directive(9), "notekeep=trace");
    }
}
