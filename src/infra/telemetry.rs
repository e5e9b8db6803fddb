use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge};
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
            "satchel_etag_hit_total",
            Unit::Count,
            "ETag lookups answered from a stored fingerprint."
        );
        describe_counter!(
            "satchel_etag_miss_total",
            Unit::Count,
            "ETag lookups that had to record a fresh fingerprint."
        );
        describe_counter!(
            "satchel_cache_record_total",
            Unit::Count,
            "Fingerprints written to the key store."
        );
        describe_counter!(
            "satchel_cache_remove_total",
            Unit::Count,
            "Fingerprints removed from the key store."
        );
        describe_counter!(
            "satchel_not_modified_total",
            Unit::Count,
            "Responses answered with 304 Not Modified."
        );
        describe_counter!(
            "satchel_jsonp_wrapped_total",
            Unit::Count,
            "Responses wrapped in a JSONP callback."
        );
        describe_counter!(
            "satchel_invalid_version_total",
            Unit::Count,
            "Requests rejected because of an unacceptable API version."
        );
        describe_gauge!(
            "satchel_key_store_entries",
            Unit::Count,
            "Fingerprints currently held by the in-memory key store."
        );
    });
}
