//! Log output for binaries embedding Gatehouse.
//!
//! The library crates only emit `tracing` events. A binary installs a
//! subscriber once at startup; `RUST_LOG` selects what is shown, `info` when
//! unset.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global fmt subscriber. Panics if one is already installed.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .init();
}

/// Like [`init`], but reports an already installed subscriber as an error
pub fn try_init() -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_try_init_fails() {
        let _ = try_init();
        assert!(try_init().is_err());
    }
}
