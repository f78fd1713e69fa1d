use anyhow::{Context, Result, anyhow};
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::sightings::{DisabledSightingStore, SightingStore};
use crate::sightings_repo::SightingsRepository;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/");

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

pub fn create_pool(database_url: &str, max_size: u32) -> Result<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(max_size)
        .connection_timeout(Duration::from_secs(5))
        .build(manager)
        .context("Failed to create PostgreSQL connection pool")
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = pool
            .get()
            .context("Failed to get connection for migrations")?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow!("Failed to run database migrations: {e}"))?;
        info!("Applied {} pending migration(s)", applied.len());
        Ok(())
    })
    .await
    .context("Migration task panicked")?
}

/// Pick the sightings store for this process.
///
/// Without a `DATABASE_URL`, or when the database cannot be reached, persistence is
/// disabled and the rest of the service keeps working.
pub async fn connect_store(database_url: Option<&str>, max_size: u32) -> Arc<dyn SightingStore> {
    let Some(url) = database_url.filter(|u| !u.trim().is_empty()) else {
        warn!("DATABASE_URL not set, private sightings will not be persisted");
        return Arc::new(DisabledSightingStore);
    };

    let pool = match create_pool(url, max_size) {
        Ok(pool) => pool,
        Err(e) => {
            warn!("{:#}; private sightings will not be persisted", e);
            return Arc::new(DisabledSightingStore);
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        warn!("{:#}; private sightings will not be persisted", e);
        return Arc::new(DisabledSightingStore);
    }

    info!("Connected to PostgreSQL sightings store");
    Arc::new(SightingsRepository::new(pool))
}
