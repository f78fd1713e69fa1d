use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::classifier::{AircraftCategory, ClassifiedFlight, LandingStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sightings store is not configured")]
    Unavailable,
    #[error("failed to get database connection: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("database query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A stored private-aircraft sighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateSighting {
    pub id: Uuid,
    pub icao24: String,
    pub callsign: String,
    pub origin_country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub velocity: Option<f64>,
    pub on_ground: bool,
    pub category: AircraftCategory,
    pub landing_status: LandingStatus,
    /// Filled in out-of-band; never written by the ingestion pipeline
    pub owner_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row to insert for a newly seen private aircraft
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrivateSighting {
    pub id: Uuid,
    pub icao24: String,
    pub callsign: String,
    pub origin_country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub velocity: Option<f64>,
    pub on_ground: bool,
    pub category: AircraftCategory,
    pub landing_status: LandingStatus,
}

impl From<&ClassifiedFlight> for NewPrivateSighting {
    fn from(flight: &ClassifiedFlight) -> Self {
        Self {
            id: Uuid::now_v7(),
            icao24: flight.icao24.clone(),
            callsign: flight.callsign.clone(),
            origin_country: flight.origin_country.clone(),
            latitude: flight.latitude,
            longitude: flight.longitude,
            altitude: flight.altitude,
            velocity: flight.velocity,
            on_ground: flight.on_ground,
            category: flight.category,
            landing_status: flight.landing_status,
        }
    }
}

/// Persistence capability for sightings.
///
/// Deduplication is check-then-insert on `icao24` and is not atomic across callers.
#[async_trait]
pub trait SightingStore: Send + Sync {
    /// False for the unconfigured store
    fn is_available(&self) -> bool {
        true
    }

    async fn exists_by_identity(&self, icao24: &str) -> Result<bool, StoreError>;

    async fn insert(&self, sighting: NewPrivateSighting) -> Result<(), StoreError>;

    /// Newest first
    async fn list_by_category(
        &self,
        category: AircraftCategory,
    ) -> Result<Vec<PrivateSighting>, StoreError>;
}

/// Store used when no database is configured: writes fail with
/// [`StoreError::Unavailable`] and reads are empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSightingStore;

#[async_trait]
impl SightingStore for DisabledSightingStore {
    fn is_available(&self) -> bool {
        false
    }

    async fn exists_by_identity(&self, _icao24: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn insert(&self, _sighting: NewPrivateSighting) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn list_by_category(
        &self,
        _category: AircraftCategory,
    ) -> Result<Vec<PrivateSighting>, StoreError> {
        Ok(Vec::new())
    }
}

/// Process-local store, for tests and running without PostgreSQL.
#[derive(Debug, Default)]
pub struct InMemorySightingStore {
    rows: Mutex<Vec<PrivateSighting>>,
}

impl InMemorySightingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Set the owner name on every row for `icao24`, the way an operator would.
    pub fn set_owner_name(&self, icao24: &str, owner_name: &str) {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.iter_mut()
            .filter(|row| row.icao24 == icao24)
            .for_each(|row| row.owner_name = Some(owner_name.to_string()));
    }
}

#[async_trait]
impl SightingStore for InMemorySightingStore {
    async fn exists_by_identity(&self, icao24: &str) -> Result<bool, StoreError> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        Ok(rows.iter().any(|row| row.icao24 == icao24))
    }

    async fn insert(&self, sighting: NewPrivateSighting) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.push(PrivateSighting {
            id: sighting.id,
            icao24: sighting.icao24,
            callsign: sighting.callsign,
            origin_country: sighting.origin_country,
            latitude: sighting.latitude,
            longitude: sighting.longitude,
            altitude: sighting.altitude,
            velocity: sighting.velocity,
            on_ground: sighting.on_ground,
            category: sighting.category,
            landing_status: sighting.landing_status,
            owner_name: None,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_by_category(
        &self,
        category: AircraftCategory,
    ) -> Result<Vec<PrivateSighting>, StoreError> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        Ok(rows
            .iter()
            .rev()
            .filter(|row| row.category == category)
            .cloned()
            .collect())
    }
}
