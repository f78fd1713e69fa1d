use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub enum MockResponse {
    Json(Value),
    Status(StatusCode),
    Delayed(Duration, Value),
}

#[derive(Clone)]
struct MockState {
    response: MockResponse,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

async fn states_all(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.queries.lock().unwrap().push(params);
    match state.response {
        MockResponse::Json(body) => Json(body).into_response(),
        MockResponse::Status(status) => (status, "upstream unavailable").into_response(),
        MockResponse::Delayed(delay, body) => {
            tokio::time::sleep(delay).await;
            Json(body).into_response()
        }
    }
}

/// Local stand-in for the OpenSky REST API
pub struct MockOpenSky {
    pub base_url: String,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    handle: JoinHandle<()>,
}

impl MockOpenSky {
    pub async fn start(response: MockResponse) -> Self {
        let queries = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/api/states/all", get(states_all))
            .with_state(MockState {
                response,
                queries: queries.clone(),
            });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock OpenSky");
        let addr = listener.local_addr().expect("mock address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock OpenSky server");
        });

        Self {
            base_url: format!("http://{}/api", addr),
            queries,
            handle,
        }
    }

    /// Query strings received so far
    pub fn queries(&self) -> Vec<HashMap<String, String>> {
        self.queries.lock().unwrap().clone()
    }
}

impl Drop for MockOpenSky {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
