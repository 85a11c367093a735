/// Core type definitions for the bar exporter
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV Bar data structure
///
/// `open_time` is the bar's identity: no two bars of one series share it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    pub fn new(open_time: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Bar {
            open_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn ohlcv(&self) -> Ohlcv {
        Ohlcv {
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

/// Price/volume part of a bar, without its timestamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ohlcv {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Per-run export counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStats {
    pub records_written: usize,
    pub skipped_before_boundary: usize,
    pub skipped_already_exported: usize,
    pub out_of_range: usize,
}

/// Configuration for one export run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Bars opening before this are never exported
    #[serde(default = "default_start_date")]
    pub start_date: String,

    /// File name without extension
    #[serde(default = "default_file_name")]
    pub file_name: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// IANA zone used to read `start_date` and to render bar times
    #[serde(default = "default_timezone")]
    pub timezone: String,

    // Logging
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_start_date() -> String {
    "2024-01-01".to_string()
}

fn default_file_name() -> String {
    "BacktestDataExport".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/exports")
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            start_date: default_start_date(),
            file_name: default_file_name(),
            output_dir: default_output_dir(),
            timezone: default_timezone(),
            log_level: default_log_level(),
        }
    }
}

impl ExportConfig {
    /// Full destination path: `output_dir/file_name.csv`
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_config() {
        let config = ExportConfig::default();
        assert_eq!(config.start_date, "2024-01-01");
        assert_eq!(config.file_name, "BacktestDataExport");
        assert_eq!(config.timezone, "UTC");
        assert_eq!(
            config.output_path(),
            PathBuf::from("data/exports").join("BacktestDataExport.csv")
        );
    }

    #[test]
    fn test_bar_ohlcv() {
        let bar = Bar::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 1.5, 2.0, 1.0, 1.75, 42);
        let ohlcv = bar.ohlcv();
        assert_eq!(ohlcv.open, 1.5);
        assert_eq!(ohlcv.close, 1.75);
        assert_eq!(ohlcv.volume, 42);
    }
}
