//! Stats extraction.
//!
//! Turns the loosely-typed stats document into observations. Each
//! configured mountpoint is validated into a [`SourceStats`] record on its
//! own, so one bad source only costs its own samples:
//!
//! - mountpoint absent from the document: no observations, no error
//! - field missing or not a non-negative integer: no observations, one
//!   [`MalformedSourceStats`] recorded
//! - otherwise: one observation per field, labelled with the mountpoint

use super::observation::{Observation, MOUNTPOINT_LABEL};
use super::schema::{
    SOURCE_LISTENERS, SOURCE_PEAK_LISTENERS, SOURCE_TOTAL_BYTES_READ, SOURCE_TOTAL_BYTES_SENT,
};
use crate::upstream::{SourceNode, StatsDocument};
use thiserror::Error;

const FIELD_LISTENERS: &str = "listeners";
const FIELD_LISTENER_PEAK: &str = "listener_peak";
const FIELD_TOTAL_BYTES_READ: &str = "total_bytes_read";
const FIELD_TOTAL_BYTES_SENT: &str = "total_bytes_sent";

/// Why a present source could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceStatsError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is not a non-negative integer: {value:?}")]
    NotNumeric { field: &'static str, value: String },
}

/// A mountpoint whose source element was present but unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed stats for mountpoint {mountpoint}: {reason}")]
pub struct MalformedSourceStats {
    pub mountpoint: String,
    #[source]
    pub reason: SourceStatsError,
}

/// Validated per-source counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceStats {
    pub listeners: u64,
    pub listener_peak: u64,
    pub total_bytes_read: u64,
    pub total_bytes_sent: u64,
}

impl SourceStats {
    /// Reads the four required fields.
    pub fn from_node(node: &SourceNode) -> Result<Self, SourceStatsError> {
        Ok(Self {
            listeners: read_u64(node, FIELD_LISTENERS)?,
            listener_peak: read_u64(node, FIELD_LISTENER_PEAK)?,
            total_bytes_read: read_u64(node, FIELD_TOTAL_BYTES_READ)?,
            total_bytes_sent: read_u64(node, FIELD_TOTAL_BYTES_SENT)?,
        })
    }

    /// One observation per metric, labelled with `mountpoint`.
    pub fn observations(&self, mountpoint: &str) -> [Observation; 4] {
        let labelled = |metric, value| {
            Observation::new(metric, value).with_label(MOUNTPOINT_LABEL, mountpoint)
        };
        [
            labelled(SOURCE_LISTENERS, self.listeners),
            labelled(SOURCE_PEAK_LISTENERS, self.listener_peak),
            labelled(SOURCE_TOTAL_BYTES_READ, self.total_bytes_read),
            labelled(SOURCE_TOTAL_BYTES_SENT, self.total_bytes_sent),
        ]
    }
}

fn read_u64(node: &SourceNode, field: &'static str) -> Result<u64, SourceStatsError> {
    let raw = node
        .field(field)
        .ok_or(SourceStatsError::MissingField(field))?;
    raw.trim()
        .parse::<u64>()
        .map_err(|_| SourceStatsError::NotNumeric {
            field,
            value: raw.to_string(),
        })
}

/// Output of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Observations in configured mountpoint order.
    pub observations: Vec<Observation>,
    /// Mountpoints that were present but malformed.
    pub failures: Vec<MalformedSourceStats>,
    /// Configured mountpoints with no source in the document.
    pub absent: Vec<String>,
}

/// Extracts observations for `mountpoints`, in the given order.
pub fn extract(document: &StatsDocument, mountpoints: &[String]) -> Extraction {
    let mut extraction = Extraction::default();

    for mountpoint in mountpoints {
        let Some(node) = document.source(mountpoint) else {
            tracing::debug!(mountpoint = %mountpoint, "Mountpoint not present upstream");
            extraction.absent.push(mountpoint.clone());
            continue;
        };

        match SourceStats::from_node(node) {
            Ok(stats) => extraction
                .observations
                .extend(stats.observations(mountpoint)),
            Err(reason) => extraction.failures.push(MalformedSourceStats {
                mountpoint: mountpoint.clone(),
                reason,
            }),
        }
    }

    extraction
}
