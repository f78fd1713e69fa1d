use serde::{Deserialize, Serialize};

use crate::classifier::ClassifiedFlight;

/// One aircraft as returned by `/planes-near-gunnison`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightView {
    pub icao24: String,
    pub callsign: String,
    pub origin_country: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub altitude: Option<f64>,
    pub on_ground: bool,
    pub velocity: Option<f64>,
    /// Display label of the category, e.g. "🛩️ Private"
    pub label: String,
    pub landing_status: String,
    pub owner_lookup: Option<String>,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl From<&ClassifiedFlight> for FlightView {
    fn from(flight: &ClassifiedFlight) -> Self {
        Self {
            icao24: flight.icao24.clone(),
            callsign: flight.callsign.clone(),
            origin_country: flight.origin_country.clone(),
            longitude: flight.longitude,
            latitude: flight.latitude,
            altitude: flight.altitude,
            on_ground: flight.on_ground,
            velocity: flight.velocity,
            label: flight.category.label().to_string(),
            landing_status: flight.landing_status.label().to_string(),
            owner_lookup: flight.owner_lookup.clone(),
            timestamp: flight.timestamp,
        }
    }
}

/// Assemble the response body, keeping feed order.
pub fn assemble_flights(flights: &[ClassifiedFlight]) -> Vec<FlightView> {
    flights.iter().map(FlightView::from).collect()
}
