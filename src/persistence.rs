//! Check-then-insert persistence of private sightings.
//!
//! Each candidate gets its own [`PersistOutcome`]; a failure on one record never
//! stops the others and never reaches the HTTP response. Two overlapping runs may
//! both see an identity as absent and both insert it; within one batch each
//! identity is persisted at most once.

use futures_util::{StreamExt, stream};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::classifier::ClassifiedFlight;
use crate::sightings::{NewPrivateSighting, SightingStore};

pub const DEFAULT_PERSIST_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Inserted,
    AlreadyExists,
    /// Not a private aircraft; never written
    Skipped,
    Failed(String),
}

impl PersistOutcome {
    fn metric_label(&self) -> &'static str {
        match self {
            PersistOutcome::Inserted => "inserted",
            PersistOutcome::AlreadyExists => "already_exists",
            PersistOutcome::Skipped => "skipped",
            PersistOutcome::Failed(_) => "failed",
        }
    }
}

/// Per-record outcomes of one batch, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistReport {
    pub outcomes: Vec<(String, PersistOutcome)>,
    pub inserted: usize,
    pub already_existed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PersistReport {
    fn record(mut self, icao24: String, outcome: PersistOutcome) -> Self {
        match &outcome {
            PersistOutcome::Inserted => self.inserted += 1,
            PersistOutcome::AlreadyExists => self.already_existed += 1,
            PersistOutcome::Skipped => self.skipped += 1,
            PersistOutcome::Failed(_) => self.failed += 1,
        }
        metrics::counter!("sightings_persist_total", "outcome" => outcome.metric_label())
            .increment(1);
        self.outcomes.push((icao24, outcome));
        self
    }

    pub fn outcome_for(&self, icao24: &str) -> Option<&PersistOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == icao24)
            .map(|(_, outcome)| outcome)
    }
}

/// Persist one flight if it is private and not yet stored.
pub async fn persist_if_new(store: &dyn SightingStore, flight: &ClassifiedFlight) -> PersistOutcome {
    if !flight.is_private() {
        return PersistOutcome::Skipped;
    }

    match store.exists_by_identity(&flight.icao24).await {
        Ok(true) => {
            debug!("{} ({}) already logged", flight.callsign, flight.icao24);
            return PersistOutcome::AlreadyExists;
        }
        Ok(false) => {}
        Err(e) => {
            warn!("Existence check failed for {}: {}", flight.icao24, e);
            return PersistOutcome::Failed(e.to_string());
        }
    }

    match store.insert(NewPrivateSighting::from(flight)).await {
        Ok(()) => {
            info!(
                "Logged private aircraft {} ({}) - {}",
                flight.callsign, flight.icao24, flight.landing_status
            );
            PersistOutcome::Inserted
        }
        Err(e) => {
            warn!("Failed to log {} ({}): {}", flight.callsign, flight.icao24, e);
            PersistOutcome::Failed(e.to_string())
        }
    }
}

/// Writes newly seen private aircraft to a [`SightingStore`].
#[derive(Clone)]
pub struct SightingGateway {
    store: Arc<dyn SightingStore>,
    concurrency: usize,
}

impl SightingGateway {
    pub fn new(store: Arc<dyn SightingStore>) -> Self {
        Self {
            store,
            concurrency: DEFAULT_PERSIST_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn store(&self) -> Arc<dyn SightingStore> {
        self.store.clone()
    }

    /// Persist a batch with bounded concurrency; outcomes keep input order.
    ///
    /// A private identity repeated within the batch is only checked and written
    /// once; later occurrences report `AlreadyExists`.
    pub async fn persist_batch(&self, flights: &[ClassifiedFlight]) -> PersistReport {
        let mut seen = HashSet::new();
        let candidates: Vec<(ClassifiedFlight, bool)> = flights
            .iter()
            .map(|flight| {
                let repeated = flight.is_private() && !seen.insert(flight.icao24.clone());
                (flight.clone(), repeated)
            })
            .collect();

        let store = self.store.clone();
        let report = stream::iter(candidates)
            .map(move |(flight, repeated)| {
                let store = store.clone();
                async move {
                    let outcome = if repeated {
                        debug!("{} repeated within batch", flight.icao24);
                        PersistOutcome::AlreadyExists
                    } else {
                        persist_if_new(store.as_ref(), &flight).await
                    };
                    (flight.icao24, outcome)
                }
            })
            .buffered(self.concurrency)
            .fold(PersistReport::default(), |report, (icao24, outcome)| async move {
                report.record(icao24, outcome)
            })
            .await;

        if report.failed > 0 {
            warn!(
                "Persisted batch with {} failure(s): {} inserted, {} already logged",
                report.failed, report.inserted, report.already_existed
            );
        } else {
            debug!(
                "Persisted batch: {} inserted, {} already logged, {} skipped",
                report.inserted, report.already_existed, report.skipped
            );
        }
        report
    }
}
