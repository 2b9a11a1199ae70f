//! Static metric schema.

use std::fmt;

/// Current listeners on a mountpoint.
pub const SOURCE_LISTENERS: &str = "icecast_source_listeners";
/// Peak listeners since the source connected.
pub const SOURCE_PEAK_LISTENERS: &str = "icecast_source_peak_listeners";
/// Bytes received from the source client.
pub const SOURCE_TOTAL_BYTES_READ: &str = "icecast_source_total_bytes_read";
/// Bytes sent to listeners.
pub const SOURCE_TOTAL_BYTES_SENT: &str = "icecast_source_total_bytes_sent";

/// Exposition metric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Gauge,
    Counter,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gauge => "gauge",
            Self::Counter => "counter",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One metric declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSchemaEntry {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: Option<&'static str>,
}

impl MetricSchemaEntry {
    pub const fn gauge(name: &'static str) -> Self {
        Self {
            name,
            metric_type: MetricType::Gauge,
            help: None,
        }
    }

    pub const fn counter(name: &'static str) -> Self {
        Self {
            name,
            metric_type: MetricType::Counter,
            help: None,
        }
    }

    pub const fn with_help(self, help: &'static str) -> Self {
        Self {
            help: Some(help),
            ..self
        }
    }
}

/// Ordered, immutable set of metric declarations.
///
/// Rendering walks the entries in declaration order, so the order here is
/// the order of blocks in every scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSchema {
    entries: Vec<MetricSchemaEntry>,
}

impl MetricSchema {
    /// Builds a schema. Later duplicates of a name are dropped.
    pub fn new(entries: impl IntoIterator<Item = MetricSchemaEntry>) -> Self {
        let mut unique: Vec<MetricSchemaEntry> = Vec::new();
        for entry in entries {
            if unique.iter().any(|e| e.name == entry.name) {
                tracing::warn!(metric = entry.name, "Duplicate metric in schema ignored");
                continue;
            }
            unique.push(entry);
        }
        Self { entries: unique }
    }

    /// The Icecast source metrics.
    ///
    /// `icecast_source_peak_listeners` is declared a counter although a peak
    /// can drop when the source reconnects. Dashboards already depend on the
    /// published type, so it is left as is.
    pub fn icecast() -> Self {
        Self::new([
            MetricSchemaEntry::gauge(SOURCE_LISTENERS)
                .with_help("Number of listeners currently connected to the mountpoint"),
            MetricSchemaEntry::counter(SOURCE_PEAK_LISTENERS)
                .with_help("Peak number of concurrent listeners on the mountpoint"),
            MetricSchemaEntry::counter(SOURCE_TOTAL_BYTES_READ)
                .with_help("Total bytes read from the source client"),
            MetricSchemaEntry::counter(SOURCE_TOTAL_BYTES_SENT)
                .with_help("Total bytes sent to listeners"),
        ])
    }

    pub fn entries(&self) -> &[MetricSchemaEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&MetricSchemaEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MetricSchema {
    fn default() -> Self {
        Self::icecast()
    }
}
