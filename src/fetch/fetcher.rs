//! Issues one HTTP request per location against the configured provider
//! endpoint, with bounded exponential-backoff retry on transport errors and
//! non-success statuses.

use crate::fetch::error::FetchError;
use crate::registry::{Location, ProviderAddress, ProviderKind};
use log::{info, warn};
use reqwest::Client;
use std::time::Duration;

/// Per-request timeout applied to the shared HTTP client, bounding how long a
/// single attempt can hang.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded retry with exponential backoff and no jitter.
///
/// The delay before attempt `n + 1` is `base_delay * 2^(n-1)`, so the default
/// policy sleeps 500 ms, then 1 s, between its three attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the given 1-based attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// Base URLs of the supported providers. Overridable so tests can point the
/// fetcher at a local mock server.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub open_meteo: String,
    pub bmkg_json: String,
    pub bmkg_xml: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            open_meteo: "https://api.open-meteo.com/v1/forecast".to_string(),
            bmkg_json: "https://api.bmkg.go.id/publik/prakiraan-cuaca".to_string(),
            bmkg_xml: "https://data.bmkg.go.id/cuaca/prakiraan-cuaca".to_string(),
        }
    }
}

pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
    endpoints: ProviderEndpoints,
}

impl Fetcher {
    pub fn new(
        retry: RetryPolicy,
        endpoints: ProviderEndpoints,
        request_timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(FetchError::ClientBuild)?;
        Ok(Self {
            client,
            retry,
            endpoints,
        })
    }

    /// Fetches the raw provider payload for one location.
    ///
    /// Transport errors and non-success statuses are retried up to the
    /// configured attempt count; intermediate failures are logged and only the
    /// last cause is surfaced. An address/provider mismatch fails immediately
    /// since no request can be built for it.
    pub async fn fetch(&self, location: &Location) -> Result<String, FetchError> {
        let (url, query) = self.request_parts(location)?;
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.attempt(&url, &query).await {
                Ok(body) => {
                    info!("Fetched {} ({} bytes)", location.name, body.len());
                    return Ok(body);
                }
                Err(e) if attempt < max_attempts => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        "Attempt {}/{} failed for {}: {}; retrying in {:?}",
                        attempt, max_attempts, location.name, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "Attempt {}/{} failed for {}: {}; giving up",
                        attempt, max_attempts, location.name, e
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Builds the provider-specific URL and query string for a location.
    fn request_parts(
        &self,
        location: &Location,
    ) -> Result<(String, Vec<(&'static str, String)>), FetchError> {
        match (location.provider, &location.address) {
            (
                ProviderKind::OpenMeteo,
                ProviderAddress::Coordinates {
                    latitude,
                    longitude,
                },
            ) => Ok((
                self.endpoints.open_meteo.clone(),
                vec![
                    ("latitude", latitude.to_string()),
                    ("longitude", longitude.to_string()),
                    ("current_weather", "true".to_string()),
                    ("timezone", location.timezone.name().to_string()),
                ],
            )),
            (ProviderKind::BmkgJson, ProviderAddress::StationCode { code }) => Ok((
                self.endpoints.bmkg_json.clone(),
                vec![("adm4", code.clone())],
            )),
            (ProviderKind::BmkgXml, ProviderAddress::StationCode { code }) => Ok((
                format!("{}/{}.xml", self.endpoints.bmkg_xml, code),
                Vec::new(),
            )),
            (provider, _) => Err(FetchError::AddressMismatch {
                id: location.id.clone(),
                provider,
            }),
        }
    }

    async fn attempt(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    FetchError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        response
            .text()
            .await
            .map_err(|e| FetchError::BodyRead(url.to_string(), e))
    }
}
