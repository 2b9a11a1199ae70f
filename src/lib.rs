//! Icecast Prometheus Exporter
//!
//! Queries an Icecast server's `/admin/stats` endpoint on every scrape and
//! republishes per-mountpoint listener and traffic figures in the
//! Prometheus text exposition format.
//!
//! # Architecture
//!
//! Each scrape runs the same stateless pipeline:
//!
//! ```text
//! credentials → fetch (/admin/stats) → extract → render
//!                                         ↓
//!                         per-mountpoint failures (logged)
//! ```
//!
//! # Design Principles
//!
//! - **All or nothing per scrape**: credential, network, auth or XML
//!   failures abort the scrape; no partial body is ever served
//! - **Isolated mountpoints**: a malformed source drops only its own samples,
//!   an absent one is simply not reported
//! - **One timestamp per scrape**: the clock is read once per run
//!
//! # Example
//!
//! ```no_run
//! use icecast_exporter::{config::ExporterConfig, metrics::Collector};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExporterConfig::from_file("icecast-exporter.toml")?;
//! let collector = Collector::new(&config)?;
//!
//! let body = collector.render().await?;
//! print!("{}", body);
//! # Ok(())
//! # }
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod metrics;
pub mod upstream;

// Re-export commonly used types at crate root
pub use config::ExporterConfig;
pub use metrics::{CollectError, Collector, MetricSchema};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
