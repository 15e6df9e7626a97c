// Tracing subscriber setup for binaries and tests embedding the key client

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

//-----------------------------------------------------------------------------
// Tracing Initialization
//-----------------------------------------------------------------------------

/// Initializes the global tracing subscriber.
///
/// # Arguments
///
/// * `log_level`: Filter directives used when `RUST_LOG` is unset.
///                Defaults to "info". Module directives such as
///                "kvgate=debug,info" are accepted.
/// * `json_output`: Emit JSON lines instead of human-readable output.
///                  Defaults to `false`.
///
/// Logs always go to stderr so command output on stdout stays parseable.
pub fn init_tracing(log_level: Option<&str>, json_output: Option<bool>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or("info")))?;

    let subscriber = Registry::default().with(env_filter);

    if json_output.unwrap_or(false) {
        let json_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr);
        tracing::subscriber::set_global_default(subscriber.with(json_layer))?;
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr);
        tracing::subscriber::set_global_default(subscriber.with(fmt_layer))?;
    }

    Ok(())
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;

    static INIT: Once = Once::new();

    #[test]
    fn test_tracing_init_once() {
        INIT.call_once(|| {
            init_tracing(Some("debug"), None).unwrap();
        });
        tracing::debug!(key = "app/config", "tracing initialized");

        // A second global subscriber is refused
        assert!(init_tracing(Some("info"), Some(true)).is_err());
    }

    #[test]
    fn test_invalid_directive_is_rejected_before_install() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(init_tracing(Some("kvgate=notalevel"), None).is_err());
        }
    }
}
