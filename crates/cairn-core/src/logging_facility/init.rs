//! Logging initialization module

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output for interactive runs
    Development,
    /// JSON lines for machine consumption
    Production,
    /// Bare registry, events are dropped unless a capture layer is installed
    Test,
}

static INIT_ONCE: Once = Once::new();

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize the logging facility
///
/// Only the first call has any effect. If another subscriber was already
/// installed as the global default (e.g. by a test capture), this call
/// leaves it in place.
///
/// # Profiles
///
/// - **Development**: human-readable logs, `cairn=debug` unless `RUST_LOG` is set
/// - **Production**: JSON logs, `cairn=info` unless `RUST_LOG` is set
/// - **Test**: bare registry
///
/// # Example
///
/// ```
/// use cairn_core::logging_facility::{init, Profile};
///
/// init(Profile::Production);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let _ = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter("cairn=debug"))
                .finish()
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_writer(std::io::stderr)
                .with_env_filter(filter("cairn=info"))
                .finish()
                .try_init(),
            Profile::Test => tracing_subscriber::registry().try_init(),
        };
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init(Profile::Test);
        init(Profile::Test);
        init(Profile::Development);
    }

    #[test]
    fn test_profile_equality() {
        assert_eq!(Profile::Production, Profile::Production);
        assert_ne!(Profile::Development, Profile::Production);
    }
}
