//! Prometheus metrics for Icecast sources.
//!
//! This module turns the Icecast stats document into observations and
//! renders them in the Prometheus text exposition format, one collection
//! per scrape.
//!
//! # Metrics Exposed
//!
//! All metrics carry a `mountpoint` label.
//!
//! - `icecast_source_listeners` (gauge) - Listeners currently connected
//! - `icecast_source_peak_listeners` (counter) - Peak concurrent listeners
//! - `icecast_source_total_bytes_read` (counter) - Bytes read from the source client
//! - `icecast_source_total_bytes_sent` (counter) - Bytes sent to listeners
//!
//! # Example
//!
//! ```
//! use icecast_exporter::metrics::{
//!     exposition, CollectionResult, MetricSchema, Observation, MOUNTPOINT_LABEL,
//! };
//!
//! let schema = MetricSchema::icecast();
//! let result = CollectionResult::new(
//!     1_700_000_000_000,
//!     vec![Observation::new("icecast_source_listeners", 5).with_label(MOUNTPOINT_LABEL, "/live")],
//! );
//!
//! let body = exposition::render(&schema, &result);
//! assert!(body.contains("icecast_source_listeners{mountpoint=\"/live\"} 5 1700000000000"));
//! ```

mod collector;
pub mod exposition;
mod extract;
mod observation;
mod schema;
#[cfg(feature = "server")]
mod server;

pub use collector::{CollectError, Collector, Scrape};
pub use extract::{extract, Extraction, MalformedSourceStats, SourceStats, SourceStatsError};
pub use observation::{CollectionResult, LabelSet, Observation, MOUNTPOINT_LABEL};
pub use schema::{
    MetricSchema, MetricSchemaEntry, MetricType, SOURCE_LISTENERS, SOURCE_PEAK_LISTENERS,
    SOURCE_TOTAL_BYTES_READ, SOURCE_TOTAL_BYTES_SENT,
};
#[cfg(feature = "server")]
pub use server::{error_status, MetricsServer, MetricsServerConfig, ServerError};
