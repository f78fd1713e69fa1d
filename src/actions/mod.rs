pub mod planes;
pub mod sightings;
pub mod status;
pub mod views;

pub use planes::*;
pub use sightings::*;
pub use status::*;

use serde::{Deserialize, Serialize};

/// JSON error body, e.g. `{"error":"Error retrieving planes"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
