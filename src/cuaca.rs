//! This module provides the main entry point of the pipeline: a client that
//! fetches, normalizes, and persists one weather record per registered
//! location, then rebuilds the location index. A failure for one location
//! degrades to the stored fallback record (or a skip) without affecting the
//! others.

use crate::error::CuacaError;
use crate::fetch::{Fetcher, ProviderEndpoints, RetryPolicy, DEFAULT_REQUEST_TIMEOUT};
use crate::providers;
use crate::registry::{default_locations, Location};
use crate::store::{FallbackOutcome, WeatherStore};
use crate::utils::DEFAULT_STORE_DIR;
use bon::bon;
use futures_util::{stream, StreamExt};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

/// Locations processed concurrently per run unless configured otherwise.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 3;

/// How one location ended up after a pipeline pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A fresh record was persisted at this path.
    Success(PathBuf),
    /// The refresh failed; the prior record was annotated and re-persisted.
    FallbackUsed(PathBuf),
    /// Nothing was written for the location.
    Skipped(String),
}

/// Per-location result of [`Cuaca::run_once`].
#[derive(Debug, Clone)]
pub struct LocationOutcome {
    pub id: String,
    pub name: String,
    pub outcome: Outcome,
}

/// The pipeline client.
///
/// Create an instance with the builder, then call [`Cuaca::run_once`] for a
/// single pass or wrap it in a [`crate::Scheduler`] for periodic operation.
///
/// # Examples
///
/// ```no_run
/// # use cuaca::{Cuaca, CuacaError};
/// # async fn run() -> Result<(), CuacaError> {
/// let pipeline = Cuaca::builder().store_dir("api").build().await?;
/// let outcomes = pipeline.run_once().await?;
/// println!("processed {} locations", outcomes.len());
/// # Ok(())
/// # }
/// ```
pub struct Cuaca {
    registry: Vec<Location>,
    fetcher: Fetcher,
    store: WeatherStore,
    concurrency_limit: usize,
}

#[bon]
impl Cuaca {
    /// Creates a pipeline client.
    ///
    /// All builder fields are optional:
    ///
    /// * `.store_dir(path)` — output directory, default `api`.
    /// * `.locations(vec)` — registry, default the built-in eight cities.
    /// * `.concurrency_limit(n)` — bounded per-run concurrency, default 3.
    /// * `.retry(policy)` — fetch retry policy, default 3 attempts / 500 ms base.
    /// * `.endpoints(eps)` — provider base URLs, default the public services.
    /// * `.request_timeout(d)` — per-request HTTP timeout, default 10 s.
    ///
    /// # Errors
    ///
    /// Returns [`CuacaError::Store`] when the store directory cannot be
    /// created and [`CuacaError::Fetch`] when the HTTP client cannot be built.
    #[builder]
    pub async fn new(
        #[builder(into)] store_dir: Option<PathBuf>,
        locations: Option<Vec<Location>>,
        concurrency_limit: Option<usize>,
        retry: Option<RetryPolicy>,
        endpoints: Option<ProviderEndpoints>,
        request_timeout: Option<Duration>,
    ) -> Result<Self, CuacaError> {
        let store_dir = store_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR));
        let store = WeatherStore::open(store_dir).await?;
        let fetcher = Fetcher::new(
            retry.unwrap_or_default(),
            endpoints.unwrap_or_default(),
            request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        )?;
        Ok(Self {
            registry: locations.unwrap_or_else(default_locations),
            fetcher,
            store,
            concurrency_limit: concurrency_limit
                .unwrap_or(DEFAULT_CONCURRENCY_LIMIT)
                .max(1),
        })
    }

    pub fn registry(&self) -> &[Location] {
        &self.registry
    }

    pub fn store(&self) -> &WeatherStore {
        &self.store
    }

    /// Runs one full pipeline pass.
    ///
    /// Locations are processed independently with bounded concurrency; the
    /// index is rebuilt only after every location has been attempted. Only a
    /// store setup or index write failure aborts the pass — per-location
    /// failures degrade to [`Outcome::FallbackUsed`] or [`Outcome::Skipped`].
    pub async fn run_once(&self) -> Result<Vec<LocationOutcome>, CuacaError> {
        info!("Updating {} locations", self.registry.len());
        let outcomes: Vec<LocationOutcome> = stream::iter(self.registry.iter())
            .map(|location| self.process_location(location))
            .buffer_unordered(self.concurrency_limit)
            .collect()
            .await;

        // Barrier: every per-location attempt has completed before this write.
        self.store.write_index(&self.registry).await?;

        let fresh = outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Success(_)))
            .count();
        let reused = outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::FallbackUsed(_)))
            .count();
        info!(
            "Pass complete: {} fresh, {} reused, {} skipped",
            fresh,
            reused,
            outcomes.len() - fresh - reused
        );
        Ok(outcomes)
    }

    async fn process_location(&self, location: &Location) -> LocationOutcome {
        let outcome = self.refresh_location(location).await;
        match &outcome {
            Outcome::Success(path) => {
                info!("Updated {} -> {}", location.name, path.display())
            }
            Outcome::FallbackUsed(path) => {
                warn!(
                    "Reused stored record for {} -> {}",
                    location.name,
                    path.display()
                )
            }
            Outcome::Skipped(reason) => warn!("Skipped {}: {}", location.name, reason),
        }
        LocationOutcome {
            id: location.id.clone(),
            name: location.name.clone(),
            outcome,
        }
    }

    async fn refresh_location(&self, location: &Location) -> Outcome {
        let failure = match self.fetcher.fetch(location).await {
            Ok(raw) => match providers::normalize(&raw, location) {
                Ok(record) => match self.store.persist(&location.id, &record).await {
                    Ok(path) => return Outcome::Success(path),
                    Err(e) => return Outcome::Skipped(format!("store write failed: {e}")),
                },
                Err(e) => e.to_string(),
            },
            Err(e) => e.to_string(),
        };
        match self.store.persist_fallback(&location.id, &failure).await {
            Ok(FallbackOutcome::Reused(path)) => Outcome::FallbackUsed(path),
            Ok(FallbackOutcome::NoPriorRecord) => {
                Outcome::Skipped(format!("{failure} (no stored record to fall back to)"))
            }
            Err(e) => Outcome::Skipped(format!("{failure}; fallback write failed: {e}")),
        }
    }
}
