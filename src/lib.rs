//! Planespotter - watches OpenSky traffic around Gunnison airport
//!
//! Each request to the live endpoint fetches state vectors for a fixed bounding
//! box, classifies every aircraft by callsign, and logs newly seen private
//! aircraft to PostgreSQL.

pub mod actions;
pub mod classifier;
pub mod config;
pub mod db;
pub mod metrics;
pub mod opensky_client;
pub mod persistence;
pub mod pipeline;
pub mod poller;
pub mod schema;
pub mod sightings;
pub mod sightings_repo;
pub mod web;

pub use classifier::{AircraftCategory, ClassifiedFlight, Classifier, LandingStatus};
pub use opensky_client::{BoundingBox, FetchError, OpenSkyClient, StateFeed, StateVector};
pub use persistence::{PersistOutcome, PersistReport, SightingGateway};
pub use pipeline::{PipelineRun, RunSummary, SightingPipeline};
pub use sightings::{SightingStore, StoreError};
