use chrono::NaiveDate;
use deunicode::deunicode;
use tracing::debug;

use crate::_02_records::{NormalizedRecord, TripRecord};

/// Parse an advertised fare ("R$ 1.234,56") into a number. "N/A" and
/// anything malformed yield `None`, never an error.
pub fn parse_price(price_text: &str) -> Option<f64> {
    if price_text == "N/A" {
        return None;
    }
    let cleaned = price_text
        .replace("R$", "")
        .trim()
        .replace('.', "")
        .replace(',', ".");
    match cleaned.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!("unparseable price: {price_text:?}");
            None
        }
    }
}

/// Whole days between the travel date and the collection date, both
/// dd-mm-yyyy. `None` when either date does not parse. A negative value
/// means the sweep was misconfigured; it is kept as-is for the analyst.
pub fn days_before_departure(query_date: &str, collection_date: &str) -> Option<i64> {
    let departure = NaiveDate::parse_from_str(query_date, "%d-%m-%Y").ok()?;
    let collected = NaiveDate::parse_from_str(collection_date, "%d-%m-%Y").ok()?;
    Some((departure - collected).num_days())
}

/// Post-sweep pass over the accumulated records: accent-strip every string
/// field, coerce fares, compute PBD.
pub fn normalize_records(records: Vec<TripRecord>) -> Vec<NormalizedRecord> {
    records.into_iter().map(normalize_record).collect()
}

fn normalize_record(record: TripRecord) -> NormalizedRecord {
    let days = days_before_departure(&record.query_date, &record.collection_date);
    NormalizedRecord {
        origin: deunicode(&record.origin),
        destination: deunicode(&record.destination),
        route_description: deunicode(&record.route_description),
        fare_class: deunicode(&record.fare_class),
        schedule_window: deunicode(&record.schedule_window),
        duration: deunicode(&record.duration),
        original_fare: parse_price(&record.original_fare),
        promotional_fare: parse_price(&record.promotional_fare),
        connection_info: deunicode(&record.connection_info),
        boarding_point: deunicode(&record.boarding_point),
        available_seats: record.available_seats,
        total_seats: record.total_seats,
        load_factor: record.load_factor,
        query_date: record.query_date,
        collection_date: record.collection_date,
        days_before_departure: days,
    }
}
