use serde::{Deserialize, Serialize};

use crate::sightings::PrivateSighting;

/// Shown when no owner has been recorded for a sighting
pub const OWNER_NOT_AVAILABLE: &str = "Not Available";

/// A logged private aircraft as returned by `/private-planes-logs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateSightingView {
    pub callsign: String,
    pub category: String,
    pub landing_status: String,
    pub altitude: Option<f64>,
    pub velocity: Option<f64>,
    pub owner_name: String,
}

impl From<PrivateSighting> for PrivateSightingView {
    fn from(sighting: PrivateSighting) -> Self {
        Self {
            callsign: sighting.callsign,
            category: sighting.category.label().to_string(),
            landing_status: sighting.landing_status.label().to_string(),
            altitude: sighting.altitude,
            velocity: sighting.velocity,
            owner_name: sighting
                .owner_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| OWNER_NOT_AVAILABLE.to_string()),
        }
    }
}
