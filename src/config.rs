//! Service settings shared by the CLI subcommands.
//!
//! Every option can also come from the environment (a `.env` file is loaded at
//! startup), so a deployment only needs `DATABASE_URL` and perhaps `SENTRY_DSN`.

use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

use crate::classifier::{
    Classifier, ClassifierConfig, DEFAULT_COMMERCIAL_PREFIXES, DEFAULT_MILITARY_PREFIXES,
    DEFAULT_OWNER_LOOKUP_TEMPLATE,
};
use crate::opensky_client::{
    BoundingBox, DEFAULT_BASE_URL, OpenSkyClient, OpenSkyCredentials, StateFeed,
};
use crate::persistence::{DEFAULT_PERSIST_CONCURRENCY, SightingGateway};
use crate::pipeline::SightingPipeline;
use crate::sightings::SightingStore;

#[derive(Debug, Clone, Args)]
pub struct ServiceConfig {
    /// PostgreSQL URL for the sightings log; persistence is disabled when unset
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum pooled database connections
    #[arg(long, env = "DATABASE_POOL_SIZE", default_value_t = 10)]
    pub database_pool_size: u32,

    /// OpenSky REST API base URL
    #[arg(long, env = "OPENSKY_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub opensky_base_url: String,

    #[arg(long, env = "OPENSKY_USERNAME")]
    pub opensky_username: Option<String>,

    #[arg(long, env = "OPENSKY_PASSWORD", hide_env_values = true)]
    pub opensky_password: Option<String>,

    /// Feed request timeout in seconds
    #[arg(long, env = "OPENSKY_TIMEOUT_SECS", default_value_t = 20)]
    pub opensky_timeout_secs: u64,

    #[arg(long, env = "BBOX_LAMIN", default_value_t = BoundingBox::GUNNISON.lamin, allow_hyphen_values = true)]
    pub lamin: f64,

    #[arg(long, env = "BBOX_LAMAX", default_value_t = BoundingBox::GUNNISON.lamax, allow_hyphen_values = true)]
    pub lamax: f64,

    #[arg(long, env = "BBOX_LOMIN", default_value_t = BoundingBox::GUNNISON.lomin, allow_hyphen_values = true)]
    pub lomin: f64,

    #[arg(long, env = "BBOX_LOMAX", default_value_t = BoundingBox::GUNNISON.lomax, allow_hyphen_values = true)]
    pub lomax: f64,

    /// Airline callsign prefixes (comma separated)
    #[arg(long, env = "COMMERCIAL_PREFIXES", value_delimiter = ',')]
    pub commercial_prefixes: Vec<String>,

    /// Military and government callsign prefixes (comma separated)
    #[arg(long, env = "MILITARY_PREFIXES", value_delimiter = ',')]
    pub military_prefixes: Vec<String>,

    /// Owner lookup URL; `{n_number}` is replaced by the tail number without its N
    #[arg(long, env = "OWNER_LOOKUP_TEMPLATE", default_value = DEFAULT_OWNER_LOOKUP_TEMPLATE)]
    pub owner_lookup_template: String,

    /// Private aircraft persisted concurrently per run
    #[arg(long, env = "PERSIST_CONCURRENCY", default_value_t = DEFAULT_PERSIST_CONCURRENCY)]
    pub persist_concurrency: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            database_pool_size: 10,
            opensky_base_url: DEFAULT_BASE_URL.to_string(),
            opensky_username: None,
            opensky_password: None,
            opensky_timeout_secs: 20,
            lamin: BoundingBox::GUNNISON.lamin,
            lamax: BoundingBox::GUNNISON.lamax,
            lomin: BoundingBox::GUNNISON.lomin,
            lomax: BoundingBox::GUNNISON.lomax,
            commercial_prefixes: Vec::new(),
            military_prefixes: Vec::new(),
            owner_lookup_template: DEFAULT_OWNER_LOOKUP_TEMPLATE.to_string(),
            persist_concurrency: DEFAULT_PERSIST_CONCURRENCY,
        }
    }
}

fn prefixes_or_default(configured: &[String], defaults: &[&str]) -> Vec<String> {
    let cleaned: Vec<String> = configured
        .iter()
        .map(|p| p.trim().to_ascii_uppercase())
        .filter(|p| !p.is_empty())
        .collect();
    if cleaned.is_empty() {
        defaults.iter().map(|p| p.to_string()).collect()
    } else {
        cleaned
    }
}

impl ServiceConfig {
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.lamin, self.lamax, self.lomin, self.lomax)
    }

    pub fn opensky_timeout(&self) -> Duration {
        Duration::from_secs(self.opensky_timeout_secs)
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            commercial_prefixes: prefixes_or_default(
                &self.commercial_prefixes,
                DEFAULT_COMMERCIAL_PREFIXES,
            ),
            military_prefixes: prefixes_or_default(
                &self.military_prefixes,
                DEFAULT_MILITARY_PREFIXES,
            ),
            owner_lookup_template: self.owner_lookup_template.clone(),
        }
    }

    pub fn opensky_client(&self) -> Result<OpenSkyClient> {
        let client = OpenSkyClient::new(&self.opensky_base_url, self.opensky_timeout())?;
        Ok(match (&self.opensky_username, &self.opensky_password) {
            (Some(username), Some(password)) => client.with_credentials(OpenSkyCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => client,
        })
    }

    /// Assemble the pipeline around an already selected store.
    pub fn build_pipeline(
        &self,
        feed: Arc<dyn StateFeed>,
        store: Arc<dyn SightingStore>,
    ) -> SightingPipeline {
        SightingPipeline::new(
            feed,
            Classifier::new(self.classifier_config()),
            SightingGateway::new(store).with_concurrency(self.persist_concurrency),
            self.bounding_box(),
        )
    }
}
