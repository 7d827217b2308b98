//! Subscriber installation for binaries and examples.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::errors::StudioError;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_DIRECTIVE: &str = "devstudio=info";

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `default_directive`. Logs go to stderr so
/// that stdout stays free for command output.
///
/// # Errors
///
/// Returns `Config` if the directive is invalid or a global subscriber is
/// already installed.
pub fn init_tracing(format: LogFormat, default_directive: &str) -> Result<(), StudioError> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(default_directive),
    }
    .map_err(|e| StudioError::Config(format!("invalid log filter: {e}")))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    installed.map_err(|e| StudioError::Config(format!("tracing already initialised: {e}")))
}
