use serde::Serialize;

use crate::_01_session::SessionError;

//
// ======================================================
// Cities and routes
// ======================================================
//

#[derive(Debug, Clone)]
pub struct CityReference {
    pub display_name: String,
    pub canonical_slug: String,
}

#[derive(Debug, Clone)]
pub struct RoutePair {
    pub origin: CityReference,
    pub destination: CityReference,
}

//
// ======================================================
// Occupancy
// ======================================================
//

/// Seat counts at the moment of the interactive reveal. All-`None` when the
/// reveal failed; the owning record is kept either way.
#[derive(Debug, Clone, Copy, Default)]
pub struct OccupancySnapshot {
    pub available_seats: Option<u32>,
    pub total_seats: Option<u32>,
    pub load_factor: Option<f64>,
}

impl OccupancySnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_counts(total: u32, occupied: u32) -> Self {
        let load_factor = if total > 0 {
            f64::from(occupied) / f64::from(total)
        } else {
            0.0
        };
        Self {
            available_seats: Some(total.saturating_sub(occupied)),
            total_seats: Some(total),
            load_factor: Some(load_factor),
        }
    }
}

//
// ======================================================
// Trip records
// ======================================================
//

/// One visible trip offer as read off the results page. Fares are still the
/// raw advertised strings ("R$ 1.234,56", or the "N/A" sentinel); the
/// normalizer coerces them after the sweep.
#[derive(Debug, Clone)]
pub struct TripRecord {
    pub origin: String,
    pub destination: String,
    pub route_description: String,
    pub fare_class: String,
    pub schedule_window: String,
    pub duration: String,
    pub original_fare: String,
    pub promotional_fare: String,
    pub connection_info: String,
    pub boarding_point: String,
    pub available_seats: Option<u32>,
    pub total_seats: Option<u32>,
    pub load_factor: Option<f64>,
    pub query_date: String,
    pub collection_date: String,
}

/// The persisted row: accent-stripped strings, numeric fares, PBD.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedRecord {
    pub origin: String,
    pub destination: String,
    pub route_description: String,
    pub fare_class: String,
    pub schedule_window: String,
    pub duration: String,
    pub original_fare: Option<f64>,
    pub promotional_fare: Option<f64>,
    pub connection_info: String,
    pub boarding_point: String,
    pub available_seats: Option<u32>,
    pub total_seats: Option<u32>,
    pub load_factor: Option<f64>,
    pub query_date: String,
    pub collection_date: String,
    pub days_before_departure: Option<i64>,
}

//
// ======================================================
// Errors
// ======================================================
//

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("city not found in reference dataset: {0}")]
    CityNotFound(String),

    #[error("no slug combination served trips for {origin} -> {destination}")]
    ProbeExhausted { origin: String, destination: String },

    #[error("results page flagged the session (captcha/block marker)")]
    PageBlocked,

    #[error("reference dataset: {0}")]
    Dataset(#[from] csv::Error),

    #[error(transparent)]
    Session(#[from] SessionError),
}
