//! Process-wide tracing subscriber and metric descriptions.

use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Registry, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::posts::{POSTS_CREATED_TOTAL, POSTS_DELETED_TOTAL, POSTS_UPDATED_TOTAL};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber. `RUST_LOG` directives refine the configured level.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(output_layer(logging.format))
        .with(ErrorLayer::default())
        .with(filter)
        .try_init()
        .map_err(|err| InfraError::Telemetry(err.to_string()))
}

fn output_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    }
}

/// Register descriptions for the post counters. Safe to call more than once.
pub fn describe_metrics() {
    static DESCRIBED: Once = Once::new();
    DESCRIBED.call_once(|| {
        for (name, help) in [
            (POSTS_CREATED_TOTAL, "Posts created."),
            (POSTS_UPDATED_TOTAL, "Posts whose content was replaced."),
            (POSTS_DELETED_TOTAL, "Posts removed."),
        ] {
            describe_counter!(name, Unit::Count, help);
        }
    });
}
