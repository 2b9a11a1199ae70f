//! Access to the Icecast server.
//!
//! This module resolves the admin credentials, performs the single
//! authenticated stats request per scrape, and parses the XML body into a
//! [`StatsDocument`]. Every way this can fail is reported as a distinct
//! [`UpstreamError`] variant so the HTTP layer can pick a status code.

mod credentials;
mod document;
mod fetcher;

pub use credentials::{
    provider_from_config, CredentialProvider, Credentials, CredentialsError,
    IcecastConfigCredentials, StaticCredentials,
};
pub use document::{DocumentError, SourceNode, StatsDocument};
pub use fetcher::{StatsFetcher, STATS_PATH};

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that abort a collection run at the upstream boundary.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream url: {0}")]
    InvalidUrl(String),
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("upstream unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    #[error("upstream rejected admin credentials ({0})")]
    AuthFailed(StatusCode),
    #[error("upstream returned unexpected status {0}")]
    Status(StatusCode),
    #[error("malformed upstream response: {0}")]
    MalformedResponse(#[from] DocumentError),
}

impl UpstreamError {
    /// True when the request ran out of time rather than failing outright.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Unreachable(e) if e.is_timeout())
    }
}
