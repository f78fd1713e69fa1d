use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;

use crate::actions::ErrorResponse;
use crate::actions::views::assemble_flights;
use crate::web::{AppState, FetchFailure};

/// GET /planes-near-gunnison - Live aircraft around the airport, classified
///
/// Newly seen private aircraft are logged as a side effect; logging failures
/// never change the response.
pub async fn planes_near_gunnison(State(state): State<AppState>) -> Response {
    match state.pipeline.run().await {
        Ok(run) => {
            let mut response = Json(assemble_flights(&run.flights)).into_response();
            response.extensions_mut().insert(run.summary());
            response
        }
        Err(e) => {
            error!("Failed to fetch planes: {}", e);
            let mut response = (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Error retrieving planes")),
            )
                .into_response();
            response.extensions_mut().insert(FetchFailure(e.kind()));
            response
        }
    }
}
