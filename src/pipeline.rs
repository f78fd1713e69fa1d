use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::classifier::{ClassifiedFlight, Classifier};
use crate::opensky_client::{BoundingBox, FetchError, StateFeed};
use crate::persistence::{PersistReport, SightingGateway};
use crate::sightings::SightingStore;

/// Result of one fetch → classify → persist run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// In feed order
    pub flights: Vec<ClassifiedFlight>,
    pub report: PersistReport,
}

impl PipelineRun {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            aircraft: self.flights.len(),
            newly_logged: self.report.inserted,
            log_failures: self.report.failed,
        }
    }
}

/// Counts of one run, attached to the live endpoint's response so the request
/// log line can report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub aircraft: usize,
    pub newly_logged: usize,
    pub log_failures: usize,
}

/// The ingestion pipeline for one bounding box.
///
/// Cheap to share behind an `Arc`; every call to [`SightingPipeline::run`] is
/// independent, so overlapping requests do not serialize on each other.
pub struct SightingPipeline {
    feed: Arc<dyn StateFeed>,
    classifier: Classifier,
    gateway: SightingGateway,
    bbox: BoundingBox,
}

impl SightingPipeline {
    pub fn new(
        feed: Arc<dyn StateFeed>,
        classifier: Classifier,
        gateway: SightingGateway,
        bbox: BoundingBox,
    ) -> Self {
        Self {
            feed,
            classifier,
            gateway,
            bbox,
        }
    }

    pub fn store(&self) -> Arc<dyn SightingStore> {
        self.gateway.store()
    }

    /// A fetch failure fails the whole run before anything is persisted.
    /// Persistence failures are only reflected in the returned report.
    pub async fn run(&self) -> Result<PipelineRun, FetchError> {
        let started = Instant::now();
        metrics::counter!("opensky_fetch_total").increment(1);

        let states = match self.feed.fetch_states(&self.bbox).await {
            Ok(states) => states,
            Err(e) => {
                metrics::counter!("opensky_fetch_errors_total", "kind" => e.kind()).increment(1);
                warn!("OpenSky fetch failed: {}", e);
                return Err(e);
            }
        };

        let flights = self.classifier.classify_all(&states, Utc::now());
        let report = self.gateway.persist_batch(&flights).await;

        metrics::histogram!("pipeline_run_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        info!(
            "Pipeline run: {} aircraft, {} private logged, {} already known, {} failed in {:.2}ms",
            flights.len(),
            report.inserted,
            report.already_existed,
            report.failed,
            started.elapsed().as_secs_f64() * 1000.0
        );

        Ok(PipelineRun { flights, report })
    }
}
