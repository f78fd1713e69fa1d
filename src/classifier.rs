//! Callsign-based classification of state vectors.
//!
//! Pure and total: every state vector yields exactly one [`ClassifiedFlight`].

use chrono::{DateTime, Utc};
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::opensky_client::StateVector;

pub const DEFAULT_COMMERCIAL_PREFIXES: &[&str] = &[
    "UAL", "AAL", "SWA", "SKW", "DAL", "ASA", "FFT", "JBU", "NKS", "ASH", "ENY", "RPA", "QXE",
];
pub const DEFAULT_MILITARY_PREFIXES: &[&str] =
    &["RCH", "MC", "VV", "VM", "BAF", "NATO", "ROF", "GAF"];
pub const DEFAULT_OWNER_LOOKUP_TEMPLATE: &str =
    "https://registry.faa.gov/aircraftinquiry/Search/NNumberResult?nNumberTxt={n_number}";

/// Callsign reported when the feed has none
pub const UNKNOWN_CALLSIGN: &str = "Unknown";

/// US civil registrations start with N
const CIVIL_REGISTRATION_PREFIX: char = 'N';

/// Altitude (meters) under which a descending aircraft is considered to be landing
const LANDING_ALTITUDE_CEILING_M: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DbEnum)]
#[db_enum(existing_type_path = "crate::schema::sql_types::AircraftCategory")]
#[serde(rename_all = "snake_case")]
pub enum AircraftCategory {
    Commercial,
    Military,
    Private,
    PossiblyPrivateOrNonUs,
}

impl AircraftCategory {
    pub fn label(&self) -> &'static str {
        match self {
            AircraftCategory::Commercial => "✈️ Commercial",
            AircraftCategory::Military => "🪖 Military",
            AircraftCategory::Private => "🛩️ Private",
            AircraftCategory::PossiblyPrivateOrNonUs => "🛩️ Possibly Private or Non-U.S.",
        }
    }
}

impl fmt::Display for AircraftCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DbEnum)]
#[db_enum(existing_type_path = "crate::schema::sql_types::LandingStatus")]
#[serde(rename_all = "snake_case")]
pub enum LandingStatus {
    OnGround,
    LikelyLandingSoon,
    InAir,
}

impl LandingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LandingStatus::OnGround => "🟢 On Ground",
            LandingStatus::LikelyLandingSoon => "🔻 Likely Landing Soon",
            LandingStatus::InAir => "🟠 In Air",
        }
    }

    /// On-ground wins; otherwise descending below the landing ceiling means landing soon.
    /// A missing vertical rate or altitude never counts as landing.
    pub fn derive(on_ground: bool, vertical_rate: Option<f64>, altitude: Option<f64>) -> Self {
        if on_ground {
            return LandingStatus::OnGround;
        }
        match (vertical_rate, altitude) {
            (Some(rate), Some(alt)) if rate < 0.0 && alt < LANDING_ALTITUDE_CEILING_M => {
                LandingStatus::LikelyLandingSoon
            }
            _ => LandingStatus::InAir,
        }
    }
}

impl fmt::Display for LandingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A state vector enriched with category, landing status and owner lookup link.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedFlight {
    pub icao24: String,
    /// Trimmed callsign, or [`UNKNOWN_CALLSIGN`]
    pub callsign: String,
    pub origin_country: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub altitude: Option<f64>,
    pub on_ground: bool,
    pub velocity: Option<f64>,
    pub category: AircraftCategory,
    pub landing_status: LandingStatus,
    pub owner_lookup: Option<String>,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl ClassifiedFlight {
    pub fn is_private(&self) -> bool {
        self.category == AircraftCategory::Private
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub commercial_prefixes: Vec<String>,
    pub military_prefixes: Vec<String>,
    /// Must contain `{n_number}`
    pub owner_lookup_template: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            commercial_prefixes: DEFAULT_COMMERCIAL_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            military_prefixes: DEFAULT_MILITARY_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            owner_lookup_template: DEFAULT_OWNER_LOOKUP_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Category by tail-number prefix. Precedence is Commercial, Military, Private, so an
    /// N-prefixed military callsign is never reported as private.
    pub fn categorize(&self, tail_number: &str) -> AircraftCategory {
        let matches_any =
            |prefixes: &[String]| prefixes.iter().any(|p| tail_number.starts_with(p.as_str()));

        if tail_number.is_empty() {
            AircraftCategory::PossiblyPrivateOrNonUs
        } else if matches_any(&self.config.commercial_prefixes) {
            AircraftCategory::Commercial
        } else if matches_any(&self.config.military_prefixes) {
            AircraftCategory::Military
        } else if tail_number.starts_with(CIVIL_REGISTRATION_PREFIX) {
            AircraftCategory::Private
        } else {
            AircraftCategory::PossiblyPrivateOrNonUs
        }
    }

    /// FAA registry link for a private tail number, with the leading N removed.
    pub fn owner_lookup_url(&self, tail_number: &str) -> Option<String> {
        if tail_number.is_empty() {
            return None;
        }
        let n_number = tail_number
            .strip_prefix(CIVIL_REGISTRATION_PREFIX)
            .unwrap_or(tail_number);
        Some(
            self.config
                .owner_lookup_template
                .replace("{n_number}", n_number),
        )
    }

    /// Classify one state vector. `received_at` stands in for a missing feed timestamp.
    pub fn classify(&self, state: &StateVector, received_at: DateTime<Utc>) -> ClassifiedFlight {
        let callsign = state.callsign.as_deref().map(str::trim).unwrap_or_default();
        let tail_number: String = callsign.chars().filter(|c| !c.is_whitespace()).collect();

        let category = self.categorize(&tail_number);
        let owner_lookup = if category == AircraftCategory::Private {
            self.owner_lookup_url(&tail_number)
        } else {
            None
        };

        ClassifiedFlight {
            icao24: state.icao24.trim().to_ascii_lowercase(),
            callsign: if callsign.is_empty() {
                UNKNOWN_CALLSIGN.to_string()
            } else {
                callsign.to_string()
            },
            origin_country: state.origin_country.clone(),
            longitude: state.longitude,
            latitude: state.latitude,
            altitude: state.baro_altitude,
            on_ground: state.on_ground,
            velocity: state.velocity,
            category,
            landing_status: LandingStatus::derive(
                state.on_ground,
                state.vertical_rate,
                state.baro_altitude,
            ),
            owner_lookup,
            timestamp: state
                .time_position
                .filter(|secs| *secs > 0)
                .and_then(|secs| secs.checked_mul(1000))
                .unwrap_or_else(|| received_at.timestamp_millis()),
        }
    }

    pub fn classify_all(
        &self,
        states: &[StateVector],
        received_at: DateTime<Utc>,
    ) -> Vec<ClassifiedFlight> {
        states
            .iter()
            .map(|state| self.classify(state, received_at))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn state(callsign: Option<&str>) -> StateVector {
        StateVector {
            icao24: "abc123".to_string(),
            callsign: callsign.map(str::to_string),
            origin_country: Some("United States".to_string()),
            baro_altitude: Some(3000.0),
            vertical_rate: Some(0.0),
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_missing_or_blank_callsign_is_unknown() {
        let classifier = Classifier::default();
        for callsign in [None, Some(""), Some("        ")] {
            let flight = classifier.classify(&state(callsign), now());
            assert_eq!(flight.category, AircraftCategory::PossiblyPrivateOrNonUs);
            assert_eq!(flight.callsign, UNKNOWN_CALLSIGN);
            assert_eq!(flight.owner_lookup, None);
        }
    }

    #[test]
    fn test_prefix_precedence() {
        let classifier = Classifier::default();
        assert_eq!(classifier.categorize("UAL123"), AircraftCategory::Commercial);
        assert_eq!(classifier.categorize("NKS402"), AircraftCategory::Commercial);
        assert_eq!(classifier.categorize("RCH871"), AircraftCategory::Military);
        assert_eq!(classifier.categorize("NATO01"), AircraftCategory::Military);
        assert_eq!(classifier.categorize("N12345"), AircraftCategory::Private);
        assert_eq!(
            classifier.categorize("CFABC"),
            AircraftCategory::PossiblyPrivateOrNonUs
        );
    }

    #[test]
    fn test_n_prefixed_military_callsign_stays_military() {
        let config = ClassifierConfig {
            military_prefixes: vec!["NAVY".to_string()],
            ..Default::default()
        };
        let classifier = Classifier::new(config);

        let flight = classifier.classify(&state(Some("NAVY 12 ")), now());
        assert_eq!(flight.category, AircraftCategory::Military);
        assert_eq!(flight.owner_lookup, None);
    }

    #[test]
    fn test_prefix_must_lead_not_merely_appear() {
        let classifier = Classifier::default();
        // Contains UAL and RCH but neither leads
        assert_eq!(
            classifier.categorize("XUAL12"),
            AircraftCategory::PossiblyPrivateOrNonUs
        );
        assert_eq!(classifier.categorize("N1RCH"), AircraftCategory::Private);
    }

    #[test]
    fn test_internal_whitespace_is_ignored_for_matching() {
        let classifier = Classifier::default();
        let flight = classifier.classify(&state(Some(" U AL 9 ")), now());
        assert_eq!(flight.category, AircraftCategory::Commercial);
        assert_eq!(flight.callsign, "U AL 9");
    }

    #[test]
    fn test_on_ground_wins_over_descent() {
        assert_eq!(
            LandingStatus::derive(true, Some(-20.0), Some(500.0)),
            LandingStatus::OnGround
        );
        assert_eq!(
            LandingStatus::derive(true, Some(15.0), Some(12_000.0)),
            LandingStatus::OnGround
        );
        assert_eq!(
            LandingStatus::derive(true, None, None),
            LandingStatus::OnGround
        );
    }

    #[test]
    fn test_landing_soon_requires_descent_below_ceiling() {
        assert_eq!(
            LandingStatus::derive(false, Some(-3.0), Some(9_999.0)),
            LandingStatus::LikelyLandingSoon
        );
        assert_eq!(
            LandingStatus::derive(false, Some(-3.0), Some(10_000.0)),
            LandingStatus::InAir
        );
        assert_eq!(
            LandingStatus::derive(false, Some(0.0), Some(2_000.0)),
            LandingStatus::InAir
        );
        assert_eq!(
            LandingStatus::derive(false, None, Some(2_000.0)),
            LandingStatus::InAir
        );
        assert_eq!(
            LandingStatus::derive(false, Some(-3.0), None),
            LandingStatus::InAir
        );
    }

    #[test]
    fn test_owner_lookup_only_for_private() {
        let classifier = Classifier::default();

        let private = classifier.classify(&state(Some("N8437D")), now());
        assert_eq!(
            private.owner_lookup.as_deref(),
            Some("https://registry.faa.gov/aircraftinquiry/Search/NNumberResult?nNumberTxt=8437D")
        );

        for callsign in ["SWA1200", "RCH871", "CGABC", ""] {
            let flight = classifier.classify(&state(Some(callsign)), now());
            assert!(flight.owner_lookup.is_none(), "{callsign} has a lookup link");
        }
    }

    #[test]
    fn test_gunnison_private_arrival() {
        let classifier = Classifier::default();
        let mut record = state(Some(" N12345 "));
        record.baro_altitude = Some(8000.0);
        record.vertical_rate = Some(-5.0);
        record.on_ground = false;

        let flight = classifier.classify(&record, now());
        assert_eq!(flight.callsign, "N12345");
        assert_eq!(flight.category, AircraftCategory::Private);
        assert_eq!(flight.landing_status, LandingStatus::LikelyLandingSoon);
        assert!(flight.owner_lookup.unwrap().contains("12345"));
    }

    #[test]
    fn test_timestamp_uses_feed_time_or_now() {
        let classifier = Classifier::default();

        let mut record = state(Some("N1"));
        record.time_position = Some(1_717_000_000);
        assert_eq!(
            classifier.classify(&record, now()).timestamp,
            1_717_000_000_000
        );

        record.time_position = None;
        assert_eq!(
            classifier.classify(&record, now()).timestamp,
            now().timestamp_millis()
        );
    }

    #[test]
    fn test_out_of_range_feed_time_falls_back_to_now() {
        let classifier = Classifier::default();
        let row = serde_json::json!([
            "abc123", "N1", "United States", null, 1.0e17, -106.9, 38.5, 3000.0, false,
            50.0, 0.0, 0.0
        ]);
        let record = StateVector::from_row(&row).unwrap();

        assert_eq!(
            classifier.classify(&record, now()).timestamp,
            now().timestamp_millis()
        );

        let mut record = state(Some("N1"));
        record.time_position = Some(i64::MAX);
        assert_eq!(
            classifier.classify(&record, now()).timestamp,
            now().timestamp_millis()
        );
    }

    #[test]
    fn test_identity_is_case_normalized() {
        let classifier = Classifier::default();
        let mut record = state(Some("N1"));
        record.icao24 = " A1B2C3".to_string();
        assert_eq!(classifier.classify(&record, now()).icao24, "a1b2c3");
    }

    #[test]
    fn test_classify_all_keeps_feed_order() {
        let classifier = Classifier::default();
        let states = vec![state(Some("UAL1")), state(Some("N2")), state(None)];
        let categories: Vec<_> = classifier
            .classify_all(&states, now())
            .into_iter()
            .map(|f| f.category)
            .collect();
        assert_eq!(
            categories,
            vec![
                AircraftCategory::Commercial,
                AircraftCategory::Private,
                AircraftCategory::PossiblyPrivateOrNonUs
            ]
        );
    }
}
