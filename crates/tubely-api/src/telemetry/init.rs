use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use tubely_core::Config;

const DEFAULT_FILTER: &str = "tubely=debug,tubely_api=debug,tower_http=debug";

/// Install the global tracing subscriber.
///
/// Development gets a compact console format; production emits one JSON
/// object per event. A subscriber that is already installed is left alone.
pub fn init_telemetry(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let result = if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        let console_fmt = tracing_subscriber::fmt::layer().event_format(
            Format::default()
                .compact()
                .with_target(false)
                .without_time(),
        );
        tracing_subscriber::registry()
            .with(filter)
            .with(console_fmt)
            .try_init()
    };

    match result {
        Ok(()) => tracing::info!(
            environment = %config.environment(),
            "Tracing initialized"
        ),
        Err(e) => tracing::debug!(error = %e, "Tracing subscriber already installed"),
    }
}
