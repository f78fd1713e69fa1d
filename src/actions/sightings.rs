use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::error;

use crate::actions::ErrorResponse;
use crate::actions::views::PrivateSightingView;
use crate::classifier::AircraftCategory;
use crate::web::AppState;

/// GET /private-planes-logs - Private aircraft logged so far, newest first
///
/// Also served at /api/flights. Empty when no database is configured.
pub async fn private_planes_logs(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list_by_category(AircraftCategory::Private).await {
        Ok(sightings) => {
            let views: Vec<PrivateSightingView> =
                sightings.into_iter().map(PrivateSightingView::from).collect();
            Json(views).into_response()
        }
        Err(e) => {
            error!("Failed to list private sightings: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Error retrieving private plane logs")),
            )
                .into_response()
        }
    }
}
