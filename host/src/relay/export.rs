//! CSV rendering for the `download-excel` route.

use crate::domain::MoistureRecord;

pub const CSV_HEADER: &str = "Timestamp,Sensor ID,Moisture,State";

/// header line, then one row per record; no trailing newline
pub fn records_to_csv(records: &[MoistureRecord]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + records.len() * 48);
    out.push_str(CSV_HEADER);
    out.push('\n');
    let rows: Vec<String> = records
        .iter()
        .map(|r| format!("\"{}\",{},{},{}", display_timestamp(r), r.sensor_id, r.moisture, r.state))
        .collect();
    out.push_str(&rows.join("\n"));
    out
}

/// en-US display form in UTC ("1/1/2024, 12:00:00 AM"); unparseable input is kept as-is
pub fn display_timestamp(record: &MoistureRecord) -> String {
    match record.parsed_timestamp() {
        Some(ts) => ts.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        None => record.timestamp.clone(),
    }
}

pub fn csv_filename(sensor_id: Option<i64>) -> String {
    match sensor_id {
        Some(id) => format!("moisture_data_{id}.csv"),
        None => "moisture_data_all.csv".to_string(),
    }
}
