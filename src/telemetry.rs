use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging.
///
/// `RUST_LOG` wins over the configured level when set. Logs go to stderr so
/// the interactive prompt on stdout stays readable.
pub fn init_telemetry(settings: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))?;

    let registry = tracing_subscriber::registry().with(filter);

    if settings.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::debug!("Clinic scheduler telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one scheduling session from start node to exit
pub fn create_session_span(session_id: &str) -> tracing::Span {
    tracing::info_span!(
        "scheduling_session",
        session.id = session_id,
        otel.kind = "internal"
    )
}

pub fn shutdown_telemetry() {
    // Nothing buffered for stdout/stderr subscribers
    tracing::debug!("Clinic scheduler telemetry shutdown complete");
}
