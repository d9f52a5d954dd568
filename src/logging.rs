//! Tracing subscriber setup for applications embedding the crate

use tracing_subscriber::{fmt, EnvFilter};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_DIRECTIVE: &str = "studyrag=info";

/// Install a fmt subscriber filtered by `RUST_LOG`, else `default_directive`
///
/// Returns false if a global subscriber was already installed.
pub fn init_logging(default_directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_init_is_harmless() {
        init_logging(DEFAULT_DIRECTIVE);
        assert!(!init_logging("studyrag=debug"));
    }
}
