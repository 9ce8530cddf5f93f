//! Startup helpers for the bookline terminal surfaces.
//!
//! Both binaries resolve their configuration from the environment, bring up
//! tracing once, and run their surface loop on a fresh runtime.

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiError, BackendConfig, HttpBackend};

/// Environment variable overriding the backend base URL.
pub const ENV_BASE_URL: &str = "BOOKLINE_BASE_URL";
/// Environment variable overriding the request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "BOOKLINE_TIMEOUT_SECS";

/// Push subscription path for the chat surface.
pub const CHAT_STREAM_PATH: &str = "stream";
/// Push subscription path for the operator dashboard.
pub const DASHBOARD_STREAM_PATH: &str = "stream/dashboard";

/// Initialize tracing with an env filter, INFO by default.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}

/// Resolve the backend configuration from the environment.
#[must_use]
pub fn config_from_env() -> BackendConfig {
    let mut config = BackendConfig::default();
    if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
        config = config.with_base_url(base_url);
    }
    if let Some(secs) = std::env::var(ENV_TIMEOUT_SECS)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
    {
        config = config.with_request_timeout(Duration::from_secs(secs));
    }
    config
}

/// Build the shared backend client from the environment.
///
/// # Errors
/// Returns an error if the HTTP client cannot be created.
pub fn backend_from_env() -> Result<Arc<HttpBackend>, ApiError> {
    let config = config_from_env();
    tracing::info!(base_url = %config.base_url, "bookline backend configured");
    Ok(Arc::new(HttpBackend::new(config)?))
}

/// Run a surface entry point on a fresh runtime.
///
/// # Returns
/// `ExitCode::SUCCESS` on clean exit, `1` on failure.
#[must_use]
pub fn run_surface<F, Fut>(entry: F) -> ExitCode
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    init_tracing();
    tracing::info!("Starting bookline v{}", env!("CARGO_PKG_VERSION"));

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            tracing::error!("Failed to create runtime: {err}");
            return ExitCode::from(1);
        }
    };

    match rt.block_on(entry()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Surface error: {err}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_without_env() {
        // Not set in the test environment; defaults apply.
        let config = config_from_env();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
