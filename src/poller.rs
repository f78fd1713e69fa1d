use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::pipeline::SightingPipeline;

/// Run the pipeline on a fixed interval so private aircraft get logged even when
/// nobody has the page open. Failures are logged and the next tick proceeds.
pub async fn run_poller(pipeline: Arc<SightingPipeline>, every: Duration) {
    info!("Polling OpenSky every {:?}", every);
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match pipeline.run().await {
            Ok(run) => info!(
                "Poll: {} aircraft, {} newly logged",
                run.flights.len(),
                run.report.inserted
            ),
            Err(e) => warn!("Poll failed: {}", e),
        }
    }
}
