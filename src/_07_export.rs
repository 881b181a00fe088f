use std::path::Path;

use crate::_02_records::{NormalizedRecord, SweepError};

/// Write the sweep's records to one CSV file: header row plus one row per
/// record, in collection order.
pub fn write_records(path: &Path, records: &[NormalizedRecord]) -> Result<(), SweepError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> NormalizedRecord {
        NormalizedRecord {
            origin: "Fortaleza - CE".to_string(),
            destination: "Recife - PE".to_string(),
            route_description: "FORTALEZA - CE -> RECIFE - PE".to_string(),
            fare_class: "CONVENCIONAL".to_string(),
            schedule_window: "08:00 - 20:30 (+1)".to_string(),
            duration: "12h30".to_string(),
            original_fare: None,
            promotional_fare: Some(189.90),
            connection_info: "No connection".to_string(),
            boarding_point: "Terminal Rodoviario".to_string(),
            available_seats: Some(2),
            total_seats: Some(3),
            load_factor: Some(1.0 / 3.0),
            query_date: "02-06-2025".to_string(),
            collection_date: "01-06-2025".to_string(),
            days_before_departure: Some(1),
        }
    }

    #[test]
    fn rows_serialize_with_headers_in_field_order() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(sample_row()).expect("serializable");
        let bytes = writer.into_inner().expect("flushed");
        let text = String::from_utf8(bytes).expect("utf8");
        let mut lines = text.lines();
        let header = lines.next().expect("header row");
        assert!(header.starts_with("origin,destination,route_description"));
        assert!(header.ends_with("query_date,collection_date,days_before_departure"));
        let row = lines.next().expect("data row");
        assert!(row.contains("189.9"));
        assert!(row.contains("02-06-2025"));
    }
}
