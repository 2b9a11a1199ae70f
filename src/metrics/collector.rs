//! The collection pipeline.
//!
//! One call to [`Collector::collect`] is one scrape: read the clock,
//! resolve credentials, fetch the stats document, extract observations.
//! Nothing is carried from one call to the next.

use super::exposition;
use super::extract::{extract, MalformedSourceStats};
use super::observation::CollectionResult;
use super::schema::MetricSchema;
use crate::config::ExporterConfig;
use crate::upstream::{
    provider_from_config, CredentialProvider, CredentialsError, StatsFetcher, UpstreamError,
};
use chrono::Utc;
use thiserror::Error;

/// Errors that abort a whole collection run.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("credentials unavailable: {0}")]
    CredentialsUnavailable(#[from] CredentialsError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Outcome of one successful run.
#[derive(Debug, Clone)]
pub struct Scrape {
    pub result: CollectionResult,
    /// Mountpoints dropped because their stats were malformed.
    pub failures: Vec<MalformedSourceStats>,
    /// Configured mountpoints that were not present upstream.
    pub absent: Vec<String>,
}

impl Scrape {
    /// Renders the exposition body for this scrape.
    pub fn render(&self, schema: &MetricSchema) -> String {
        exposition::render(schema, &self.result)
    }
}

/// Runs the fetch, extract, render pipeline against one Icecast server.
pub struct Collector {
    schema: MetricSchema,
    mountpoints: Vec<String>,
    credentials: Box<dyn CredentialProvider>,
    fetcher: StatsFetcher,
}

impl Collector {
    /// Builds a collector from validated configuration.
    pub fn new(config: &ExporterConfig) -> Result<Self, UpstreamError> {
        let fetcher = StatsFetcher::new(&config.upstream)?;
        tracing::info!(
            url = %fetcher.url(),
            timeout_secs = config.upstream.timeout_secs,
            "Upstream stats endpoint"
        );
        Ok(Self::with_parts(
            MetricSchema::icecast(),
            config.upstream.mountpoints.clone(),
            provider_from_config(&config.credentials),
            fetcher,
        ))
    }

    /// Builds a collector from explicit parts.
    pub fn with_parts(
        schema: MetricSchema,
        mountpoints: Vec<String>,
        credentials: Box<dyn CredentialProvider>,
        fetcher: StatsFetcher,
    ) -> Self {
        Self {
            schema,
            mountpoints,
            credentials,
            fetcher,
        }
    }

    pub fn schema(&self) -> &MetricSchema {
        &self.schema
    }

    pub fn mountpoints(&self) -> &[String] {
        &self.mountpoints
    }

    /// Performs one collection run.
    pub async fn collect(&self) -> Result<Scrape, CollectError> {
        // One clock read per run; every sample carries this timestamp.
        let timestamp_ms = Utc::now().timestamp_millis();

        let credentials = self.credentials.credentials()?;
        let document = self.fetcher.fetch(&credentials).await?;
        let extraction = extract(&document, &self.mountpoints);

        for failure in &extraction.failures {
            tracing::warn!(
                mountpoint = %failure.mountpoint,
                reason = %failure.reason,
                "Dropping malformed source stats"
            );
        }
        tracing::debug!(
            observations = extraction.observations.len(),
            failures = extraction.failures.len(),
            absent = extraction.absent.len(),
            "Collection finished"
        );

        Ok(Scrape {
            result: CollectionResult::new(timestamp_ms, extraction.observations),
            failures: extraction.failures,
            absent: extraction.absent,
        })
    }

    /// Collects and renders in one step. Either the full body or an error.
    pub async fn render(&self) -> Result<String, CollectError> {
        let scrape = self.collect().await?;
        Ok(scrape.render(&self.schema))
    }
}
