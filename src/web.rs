use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::actions;
use crate::pipeline::{RunSummary, SightingPipeline};
use crate::sightings::SightingStore;

// App state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SightingPipeline>,
    /// Same store the pipeline writes to; read by the log listing
    pub store: Arc<dyn SightingStore>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(pipeline: Arc<SightingPipeline>) -> Self {
        let store = pipeline.store();
        Self {
            pipeline,
            store,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Set on a failed `/planes-near-gunnison` response, holding [`FetchError::kind`].
///
/// [`FetchError::kind`]: crate::opensky_client::FetchError::kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchFailure(pub &'static str);

/// What the live endpoint did for this request, if it ran the pipeline
fn pipeline_note(response: &Response) -> Option<String> {
    let extensions = response.extensions();
    if let Some(summary) = extensions.get::<RunSummary>() {
        return Some(format!(
            "{} aircraft, {} newly logged, {} log failures",
            summary.aircraft, summary.newly_logged, summary.log_failures
        ));
    }
    extensions
        .get::<FetchFailure>()
        .map(|failure| format!("OpenSky {} failure", failure.0))
}

// Request log line with a short correlation id and the pipeline counts
async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let id = Uuid::new_v4().simple().to_string();
    let request_id = &id[..8];
    let started = Instant::now();

    debug!("{} {} [{}] started", method, path, request_id);

    let response = next.run(request).await;
    let elapsed = started.elapsed();
    let status = response.status().as_u16();

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(elapsed.as_secs_f64());

    match pipeline_note(&response) {
        Some(note) => info!(
            "{} {} [{}] {} in {:.2}ms ({})",
            method,
            path,
            request_id,
            status,
            elapsed.as_secs_f64() * 1000.0,
            note
        ),
        None => info!(
            "{} {} [{}] {} in {:.2}ms",
            method,
            path,
            request_id,
            status,
            elapsed.as_secs_f64() * 1000.0
        ),
    }

    response
}

// Server errors go to Sentry, tagged with the OpenSky failure kind when known
async fn report_server_errors(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    let status = response.status();
    if !status.is_server_error() {
        return response;
    }

    let failure = response.extensions().get::<FetchFailure>().copied();
    let message = match failure {
        Some(FetchFailure(kind)) => format!(
            "HTTP {} on {} {}: OpenSky {} failure",
            status.as_u16(),
            method,
            path,
            kind
        ),
        None => format!("HTTP {} on {} {}", status.as_u16(), method, path),
    };
    error!("{}", message);

    sentry::with_scope(
        |scope| {
            scope.set_tag("http.method", method.as_str());
            scope.set_tag("http.route", &path);
            scope.set_tag("http.status_code", status.as_u16().to_string());
            if let Some(FetchFailure(kind)) = failure {
                scope.set_tag("opensky.failure", kind);
            }
        },
        || sentry::capture_message(&message, sentry::Level::Error),
    );

    response
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Build the application router. Unknown paths are served from `static_dir`
/// (the page at `/` lives there) when one is given.
pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let api = Router::new()
        .route("/planes-near-gunnison", get(actions::planes_near_gunnison))
        .route("/private-planes-logs", get(actions::private_planes_logs))
        .route("/api/flights", get(actions::private_planes_logs))
        .route("/health", get(actions::health))
        .route("/metrics", get(actions::render_metrics));

    let api = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api.fallback(not_found),
    };

    api.with_state(state)
        .layer(middleware::from_fn(log_requests))
        .layer(middleware::from_fn(report_server_errors))
        .layer(CorsLayer::permissive())
}

pub async fn start_web_server(
    interface: String,
    port: u16,
    state: AppState,
    static_dir: Option<PathBuf>,
) -> Result<()> {
    sentry::configure_scope(|scope| {
        scope.set_tag("operation", "web-server");
    });
    info!("Starting web server on {}:{}", interface, port);

    let app = router(state, static_dir);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", interface, port)).await?;
    info!("Web server listening on http://{}:{}", interface, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_note_from_response_extensions() {
        let mut ok = StatusCode::OK.into_response();
        ok.extensions_mut().insert(RunSummary {
            aircraft: 3,
            newly_logged: 1,
            log_failures: 0,
        });
        assert_eq!(
            pipeline_note(&ok).as_deref(),
            Some("3 aircraft, 1 newly logged, 0 log failures")
        );

        let mut failed = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        failed.extensions_mut().insert(FetchFailure("timeout"));
        assert_eq!(
            pipeline_note(&failed).as_deref(),
            Some("OpenSky timeout failure")
        );

        assert_eq!(pipeline_note(&StatusCode::NOT_FOUND.into_response()), None);
    }
}
