use std::{sync::Once, time::Duration};

use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

pub const RENDER_TOTAL: &str = "mgraph_render_total";
pub const RENDER_MS: &str = "mgraph_render_ms";
pub const GRAPHVIZ_CACHE_HIT_TOTAL: &str = "mgraph_graphviz_cache_hit_total";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            RENDER_TOTAL,
            Unit::Count,
            "Render requests by backend, output format and result."
        );
        describe_histogram!(
            RENDER_MS,
            Unit::Milliseconds,
            "Render latency in milliseconds by backend."
        );
        describe_counter!(
            GRAPHVIZ_CACHE_HIT_TOTAL,
            Unit::Count,
            "Graphviz renders served from the on-disk cache."
        );
    });
}

/// Records one finished render for `backend` (`graphviz`, `plot` or `browser`).
pub fn record_render(backend: &'static str, format: &'static str, ok: bool, elapsed: Duration) {
    let result = if ok { "ok" } else { "error" };
    counter!(RENDER_TOTAL, "backend" => backend, "format" => format, "result" => result)
        .increment(1);
    histogram!(RENDER_MS, "backend" => backend).record(elapsed.as_secs_f64() * 1000.0);
}

pub fn record_graphviz_cache_hit() {
    counter!(GRAPHVIZ_CACHE_HIT_TOTAL).increment(1);
}
