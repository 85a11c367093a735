/// Bar input for the replay host
///
/// Reads the same `Date,Open,High,Low,Close,Volume` layout the exporter writes,
/// with dates given as wall-clock time in the configured timezone.
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::info;

use crate::error::{ExportError, Result};
use crate::types::Bar;
use crate::utils::time::BAR_TIME_FORMAT;

#[derive(Debug, Deserialize)]
struct BarRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: u64,
}

pub fn load_bars_csv<P: AsRef<Path>>(path: P, tz: Tz) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let bars = read_bars_csv(file, tz)?;
    info!("📥 Loaded {} bars from {}", bars.len(), path.display());
    Ok(bars)
}

pub fn read_bars_csv<R: Read>(reader: R, tz: Tz) -> Result<Vec<Bar>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut bars = Vec::new();
    for (line, row) in rdr.deserialize::<BarRow>().enumerate() {
        let row = row.map_err(|e| ExportError::InvalidBarData(format!("row {}: {}", line + 1, e)))?;

        let naive = NaiveDateTime::parse_from_str(&row.date, BAR_TIME_FORMAT)
            .map_err(|e| ExportError::InvalidBarData(format!("row {}: bad date '{}': {}", line + 1, row.date, e)))?;
        let open_time = tz
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| ExportError::InvalidBarData(format!("row {}: '{}' does not exist in {}", line + 1, row.date, tz)))?
            .with_timezone(&Utc);

        bars.push(Bar::new(open_time, row.open, row.high, row.low, row.close, row.volume));
    }

    Ok(bars)
}
