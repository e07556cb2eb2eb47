//! CSV loading for the household power consumption dataset.
//!
//! Expected columns: `Date` (day-first, `%d/%m/%Y`), `Time` (`%H:%M:%S`),
//! `Global_active_power`, `Global_reactive_power` and `Sub_metering_1..3`.
//! An unparsable date or time rejects the row as fatal; an unparsable
//! numeric field (the dataset marks gaps with `?`) becomes NaN and is
//! handled downstream by the resampler.

use std::fs::File;
use std::io;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use csv::StringRecord;
use tracing::info;

use crate::core::Reading;
use crate::error::{ForecastError, Result};

const DATE_COLUMN: &str = "Date";
const TIME_COLUMN: &str = "Time";
const NUMERIC_COLUMNS: [&str; 5] = [
    "Global_active_power",
    "Global_reactive_power",
    "Sub_metering_1",
    "Sub_metering_2",
    "Sub_metering_3",
];

/// Load readings from a CSV file, sorted by timestamp.
pub fn load_readings_csv(path: impl AsRef<Path>) -> Result<Vec<Reading>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let readings = parse_readings(file)?;
    info!(rows = readings.len(), path = %path.display(), "loaded readings");
    Ok(readings)
}

/// Parse readings from any CSV source, sorted by timestamp.
pub fn parse_readings<R: io::Read>(source: R) -> Result<Vec<Reading>> {
    let mut reader = csv::Reader::from_reader(source);

    let headers = reader.headers()?.clone();
    let date_col = column_index(&headers, DATE_COLUMN)?;
    let time_col = column_index(&headers, TIME_COLUMN)?;
    let numeric_cols: Vec<usize> = NUMERIC_COLUMNS
        .iter()
        .map(|name| column_index(&headers, name))
        .collect::<Result<_>>()?;

    let mut readings = Vec::new();
    for (record_number, record) in reader.records().enumerate() {
        let record = record?;
        readings.push(parse_record(
            &record,
            record_number + 1,
            date_col,
            time_col,
            &numeric_cols,
        )?);
    }

    readings.sort_by_key(|r| r.timestamp);
    Ok(readings)
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ForecastError::UnknownColumn(name.to_string()))
}

fn parse_record(
    record: &StringRecord,
    record_number: usize,
    date_col: usize,
    time_col: usize,
    numeric_cols: &[usize],
) -> Result<Reading> {
    let field = |col: usize| -> Result<&str> {
        record.get(col).ok_or(ForecastError::ParseError {
            record: record_number,
            message: "row has too few fields".to_string(),
        })
    };

    let date_text = field(date_col)?;
    let date = NaiveDate::parse_from_str(date_text, "%d/%m/%Y").map_err(|e| {
        ForecastError::ParseError {
            record: record_number,
            message: format!("bad date {date_text:?}: {e}"),
        }
    })?;
    let time_text = field(time_col)?;
    let time = NaiveTime::parse_from_str(time_text, "%H:%M:%S").map_err(|e| {
        ForecastError::ParseError {
            record: record_number,
            message: format!("bad time {time_text:?}: {e}"),
        }
    })?;
    let timestamp = date.and_time(time).and_utc();

    let mut values = [f64::NAN; 5];
    for (slot, &col) in values.iter_mut().zip(numeric_cols) {
        *slot = field(col)?.trim().parse().unwrap_or(f64::NAN);
    }

    Ok(Reading {
        timestamp,
        active_power: values[0],
        reactive_power: values[1],
        sub_metering_1: values[2],
        sub_metering_2: values[3],
        sub_metering_3: values[4],
    })
}
