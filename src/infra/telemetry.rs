use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

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

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "bayaz_cache_hit_total",
            Unit::Count,
            "Total number of reads served from a cache tier, labeled by dataset."
        );
        describe_counter!(
            "bayaz_cache_miss_total",
            Unit::Count,
            "Total number of reads that required a remote fetch, labeled by dataset."
        );
        describe_counter!(
            "bayaz_remote_call_total",
            Unit::Count,
            "Total number of calls made to the remote document API, labeled by dataset."
        );
        describe_counter!(
            "bayaz_local_filter_total",
            Unit::Count,
            "Total number of filter applications served from the in-memory corpus."
        );
    });
}
