use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::classifier::{AircraftCategory, LandingStatus};
use crate::db::PgPool;
use crate::schema::private_sightings;
use crate::sightings::{NewPrivateSighting, PrivateSighting, SightingStore, StoreError};

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = private_sightings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PrivateSightingRecord {
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
    pub owner_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<PrivateSightingRecord> for PrivateSighting {
    fn from(record: PrivateSightingRecord) -> Self {
        PrivateSighting {
            id: record.id,
            icao24: record.icao24,
            callsign: record.callsign,
            origin_country: record.origin_country,
            latitude: record.latitude,
            longitude: record.longitude,
            altitude: record.altitude,
            velocity: record.velocity,
            on_ground: record.on_ground,
            category: record.category,
            landing_status: record.landing_status,
            owner_name: record.owner_name,
            created_at: record.created_at,
        }
    }
}

/// Insert form; `owner_name` and `created_at` are left to the database.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = private_sightings)]
pub struct NewPrivateSightingRecord {
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

impl From<NewPrivateSighting> for NewPrivateSightingRecord {
    fn from(sighting: NewPrivateSighting) -> Self {
        NewPrivateSightingRecord {
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
        }
    }
}

/// PostgreSQL-backed sightings store
#[derive(Clone)]
pub struct SightingsRepository {
    pool: PgPool,
}

impl SightingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Whether any sighting exists for this aircraft identity
    pub async fn exists_by_icao24(&self, icao24: &str) -> Result<bool, StoreError> {
        let pool = self.pool.clone();
        let icao24 = icao24.to_string();
        tokio::task::spawn_blocking(move || -> Result<bool, StoreError> {
            let mut conn = pool.get()?;
            let found = diesel::select(diesel::dsl::exists(
                private_sightings::table.filter(private_sightings::icao24.eq(&icao24)),
            ))
            .get_result::<bool>(&mut conn)?;
            Ok(found)
        })
        .await?
    }

    pub async fn insert(&self, sighting: NewPrivateSighting) -> Result<(), StoreError> {
        let pool = self.pool.clone();
        let record = NewPrivateSightingRecord::from(sighting);
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let mut conn = pool.get()?;
            diesel::insert_into(private_sightings::table)
                .values(&record)
                .execute(&mut conn)?;
            Ok(())
        })
        .await?
    }

    /// All sightings in a category, newest first
    pub async fn get_by_category(
        &self,
        category: AircraftCategory,
    ) -> Result<Vec<PrivateSighting>, StoreError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<PrivateSighting>, StoreError> {
            let mut conn = pool.get()?;
            let records = private_sightings::table
                .filter(private_sightings::category.eq(category))
                .order(private_sightings::created_at.desc())
                .select(PrivateSightingRecord::as_select())
                .load::<PrivateSightingRecord>(&mut conn)?;
            Ok(records.into_iter().map(|r| r.into()).collect())
        })
        .await?
    }

    /// Number of rows stored for one identity. Only tests and diagnostics need this.
    pub async fn count_by_icao24(&self, icao24: &str) -> Result<i64, StoreError> {
        let pool = self.pool.clone();
        let icao24 = icao24.to_string();
        tokio::task::spawn_blocking(move || -> Result<i64, StoreError> {
            let mut conn = pool.get()?;
            let count = private_sightings::table
                .filter(private_sightings::icao24.eq(&icao24))
                .count()
                .get_result::<i64>(&mut conn)?;
            Ok(count)
        })
        .await?
    }
}

#[async_trait]
impl SightingStore for SightingsRepository {
    async fn exists_by_identity(&self, icao24: &str) -> Result<bool, StoreError> {
        self.exists_by_icao24(icao24).await
    }

    async fn insert(&self, sighting: NewPrivateSighting) -> Result<(), StoreError> {
        SightingsRepository::insert(self, sighting).await
    }

    async fn list_by_category(
        &self,
        category: AircraftCategory,
    ) -> Result<Vec<PrivateSighting>, StoreError> {
        self.get_by_category(category).await
    }
}
