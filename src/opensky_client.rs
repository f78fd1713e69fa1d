//! HTTP client for the OpenSky Network state-vector endpoint.
//!
//! One call to `/states/all` per pipeline run, restricted to a bounding box.
//! The response's `states` field is a list of fixed-position arrays; see
//! [`StateVector::from_row`] for the indices we read.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://opensky-network.org/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("OpenSky request timed out after {0:?}")]
    Timeout(Duration),
    #[error("OpenSky request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("OpenSky returned error status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to decode OpenSky response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Short label used for metrics and error-report tags
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout(_) => "timeout",
            FetchError::Request(_) => "request",
            FetchError::Status { .. } => "status",
            FetchError::Decode(_) => "decode",
        }
    }
}

/// Latitude/longitude rectangle used as the feed query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lamin: f64,
    pub lamax: f64,
    pub lomin: f64,
    pub lomax: f64,
}

impl BoundingBox {
    /// Roughly a degree of airspace around Gunnison-Crested Butte Regional (KGUC).
    pub const GUNNISON: Self = Self {
        lamin: 38.0,
        lamax: 39.0,
        lomin: -107.4,
        lomax: -106.4,
    };

    pub fn new(lamin: f64, lamax: f64, lomin: f64, lomax: f64) -> Self {
        Self {
            lamin,
            lamax,
            lomin,
            lomax,
        }
    }

    fn query_params(&self) -> [(&'static str, String); 4] {
        [
            ("lamin", self.lamin.to_string()),
            ("lamax", self.lamax.to_string()),
            ("lomin", self.lomin.to_string()),
            ("lomax", self.lomax.to_string()),
        ]
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::GUNNISON
    }
}

/// One aircraft observation as delivered by the feed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateVector {
    pub icao24: String,
    pub callsign: Option<String>,
    pub origin_country: Option<String>,
    /// Epoch seconds of the last position report
    pub time_position: Option<i64>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    /// Barometric altitude in meters
    pub baro_altitude: Option<f64>,
    pub on_ground: bool,
    /// Ground speed in m/s
    pub velocity: Option<f64>,
    /// Vertical rate in m/s, negative when descending
    pub vertical_rate: Option<f64>,
}

impl StateVector {
    /// Parse one positional row from the `states` array.
    ///
    /// Returns `None` when the row is not an array or has no identity string.
    pub fn from_row(row: &serde_json::Value) -> Option<Self> {
        let fields = row.as_array()?;
        let field = |idx: usize| fields.get(idx).filter(|v| !v.is_null());

        let icao24 = field(0)?.as_str()?.trim().to_ascii_lowercase();
        if icao24.is_empty() {
            return None;
        }

        Some(Self {
            icao24,
            callsign: field(1).and_then(|v| v.as_str()).map(str::to_string),
            origin_country: field(2).and_then(|v| v.as_str()).map(str::to_string),
            time_position: field(4)
                .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))),
            longitude: field(5).and_then(|v| v.as_f64()),
            latitude: field(6).and_then(|v| v.as_f64()),
            baro_altitude: field(7).and_then(|v| v.as_f64()),
            on_ground: field(8).and_then(|v| v.as_bool()).unwrap_or(false),
            velocity: field(9).and_then(|v| v.as_f64()),
            vertical_rate: field(11).and_then(|v| v.as_f64()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct StatesResponse {
    #[serde(default)]
    time: Option<i64>,
    #[serde(default)]
    states: Option<Vec<serde_json::Value>>,
}

/// Source of live state vectors for a bounding box.
#[async_trait]
pub trait StateFeed: Send + Sync {
    async fn fetch_states(&self, bbox: &BoundingBox) -> Result<Vec<StateVector>, FetchError>;
}

/// Optional OpenSky account credentials (raises the anonymous rate limit).
#[derive(Debug, Clone)]
pub struct OpenSkyCredentials {
    pub username: String,
    pub password: String,
}

/// Client for the OpenSky REST API.
pub struct OpenSkyClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    credentials: Option<OpenSkyCredentials>,
}

impl OpenSkyClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("planespotter/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(FetchError::Request)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            credentials: None,
        })
    }

    pub fn with_credentials(mut self, credentials: OpenSkyCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    fn map_request_error(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Request(error)
        }
    }

    /// Fetch all state vectors inside `bbox`. A missing `states` array is an empty result.
    pub async fn fetch_states(&self, bbox: &BoundingBox) -> Result<Vec<StateVector>, FetchError> {
        let url = format!("{}/states/all", self.base_url);
        debug!("Fetching OpenSky states for {:?}", bbox);

        let mut request = self.client.get(&url).query(&bbox.query_params());
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_request_error(e))?;
        let parsed: StatesResponse = serde_json::from_str(&body)?;

        let rows = parsed.states.unwrap_or_default();
        let total = rows.len();
        let states: Vec<StateVector> = rows
            .iter()
            .filter_map(|row| {
                let state = StateVector::from_row(row);
                if state.is_none() {
                    warn!("Skipping malformed OpenSky state row: {}", row);
                }
                state
            })
            .collect();

        info!(
            "Fetched {} state vectors ({} rows) at feed time {:?}",
            states.len(),
            total,
            parsed.time
        );
        Ok(states)
    }
}

#[async_trait]
impl StateFeed for OpenSkyClient {
    async fn fetch_states(&self, bbox: &BoundingBox) -> Result<Vec<StateVector>, FetchError> {
        OpenSkyClient::fetch_states(self, bbox).await
    }
}
