use anyhow::{Context, Result};
use diesel::prelude::*;
use diesel_migrations::MigrationHarness;
use planespotter::db::{MIGRATIONS, PgPool, create_pool};
use uuid::Uuid;

/// An isolated database created for one test and dropped afterwards.
///
/// `TEST_DATABASE_URL` points at any database on the server (default
/// `postgresql://localhost/planespotter_test`); the admin connection goes to
/// `postgres` on the same server.
pub struct TestDatabase {
    db_name: String,
    pool: PgPool,
    admin_url: String,
}

impl TestDatabase {
    pub async fn new() -> Result<Self> {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/planespotter_test".to_string());
        let (server_url, _) = base_url
            .rsplit_once('/')
            .context("TEST_DATABASE_URL has no database name")?;
        let server_url = server_url.to_string();

        let db_name = format!("planespotter_test_{}", Uuid::new_v4().simple());
        let admin_url = format!("{}/postgres", server_url);
        let test_url = format!("{}/{}", server_url, db_name);

        let admin = admin_url.clone();
        let name = db_name.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = PgConnection::establish(&admin)
                .context("Failed to connect to PostgreSQL. Is it running?")?;
            // db_name is generated from a uuid, safe to interpolate
            diesel::sql_query(format!("CREATE DATABASE \"{}\"", name))
                .execute(&mut conn)
                .with_context(|| format!("Failed to create database {}", name))?;
            Ok(())
        })
        .await
        .context("Database creation task panicked")??;

        let pool = create_pool(&test_url, 5)?;
        let migrate_pool = pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = migrate_pool.get()?;
            conn.run_pending_migrations(MIGRATIONS)
                .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
            Ok(())
        })
        .await
        .context("Migration task panicked")??;

        Ok(Self {
            db_name,
            pool,
            admin_url,
        })
    }

    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        let result = PgConnection::establish(&self.admin_url).map(|mut conn| {
            diesel::sql_query(format!(
                "DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)",
                self.db_name
            ))
            .execute(&mut conn)
        });

        if !matches!(result, Ok(Ok(_))) {
            eprintln!(
                "Warning: failed to drop test database {}. Drop it manually.",
                self.db_name
            );
        }
    }
}
