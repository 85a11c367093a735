/// One CSV line of the export
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::types::Bar;
use crate::utils::time::format_bar_time;

/// Header line written first in every export file
pub const HEADER: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub open_time: DateTime<Utc>,
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl OutputRecord {
    pub fn from_bar(bar: &Bar, tz: Tz) -> Self {
        OutputRecord {
            open_time: bar.open_time,
            date: format_bar_time(bar.open_time, tz),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }

    /// Field values in header order.
    ///
    /// `f64` Display is locale-free and prints the shortest round-trip form,
    /// so `100.0` renders as `100` and `0.5` as `0.5`.
    pub fn fields(&self) -> [String; 6] {
        [
            self.date.clone(),
            self.open.to_string(),
            self.high.to_string(),
            self.low.to_string(),
            self.close.to_string(),
            self.volume.to_string(),
        ]
    }

    pub fn to_line(&self) -> String {
        self.fields().join(",")
    }
}
