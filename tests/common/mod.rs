//! Shared helpers for integration tests
//!
//! - [`opensky::MockOpenSky`] serves canned `/states/all` responses on a local port.
//! - [`database::TestDatabase`] creates a throwaway PostgreSQL database with the
//!   schema applied; tests using it are `#[ignore]`d and need `TEST_DATABASE_URL`.
#![allow(dead_code)]

pub mod database;
pub mod opensky;

use serde_json::{Value, json};

/// A `states` row in OpenSky's positional layout
pub fn state_row(
    icao24: &str,
    callsign: Option<&str>,
    altitude: Option<f64>,
    on_ground: bool,
    vertical_rate: Option<f64>,
) -> Value {
    json!([
        icao24,
        callsign,
        "United States",
        1717000000,
        1717000001,
        -106.93,
        38.53,
        altitude,
        on_ground,
        55.0,
        270.0,
        vertical_rate,
        null,
        altitude,
        "1200",
        false,
        0
    ])
}

pub fn states_body(rows: Vec<Value>) -> Value {
    json!({ "time": 1717000001, "states": rows })
}
