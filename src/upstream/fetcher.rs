//! Fetches `/admin/stats` from the Icecast server.

use super::{Credentials, StatsDocument, UpstreamError};
use crate::config::UpstreamConfig;
use reqwest::{redirect, Client, StatusCode, Url};
use std::time::Duration;

/// Path of the Icecast admin statistics endpoint.
pub const STATS_PATH: &str = "/admin/stats";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Issues one authenticated stats request per call. Never retries.
#[derive(Debug, Clone)]
pub struct StatsFetcher {
    client: Client,
    url: Url,
}

impl StatsFetcher {
    /// Creates a fetcher for the configured upstream.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let url = stats_url(&config.base_url)?;
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout()))
            .user_agent(concat!("icecast-exporter/", env!("CARGO_PKG_VERSION")))
            // A 3xx is an upstream answer, not a second request.
            .redirect(redirect::Policy::none())
            .build()
            .map_err(UpstreamError::Client)?;
        Ok(Self { client, url })
    }

    /// The full stats URL this fetcher requests.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Performs the request and parses the body.
    pub async fn fetch(&self, credentials: &Credentials) -> Result<StatsDocument, UpstreamError> {
        tracing::debug!(url = %self.url, "Fetching upstream stats");

        let response = self
            .client
            .get(self.url.clone())
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await
            .map_err(UpstreamError::Unreachable)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(UpstreamError::AuthFailed(status));
        }
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let body = response.text().await.map_err(UpstreamError::Unreachable)?;
        let document = StatsDocument::parse(&body)?;

        tracing::debug!(
            status = status.as_u16(),
            bytes = body.len(),
            sources = document.sources().len(),
            "Upstream stats fetched"
        );
        Ok(document)
    }
}

/// Joins the admin stats path onto the base address, keeping any path prefix.
fn stats_url(base: &str) -> Result<Url, UpstreamError> {
    let mut url = Url::parse(base).map_err(|e| UpstreamError::InvalidUrl(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(UpstreamError::InvalidUrl(format!(
            "unsupported scheme {}",
            url.scheme()
        )));
    }
    let path = format!("{}{}", url.path().trim_end_matches('/'), STATS_PATH);
    url.set_path(&path);
    Ok(url)
}
