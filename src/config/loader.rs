/// Configuration loading from TOML file
use std::path::Path;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::{ExportError, Result};
use crate::types::ExportConfig;
use crate::utils::time::{parse_start_date, parse_timezone};

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ExportConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ExportError::ConfigError(format!("Failed to read config file: {}", e)))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<ExportConfig> {
    let config: ExportConfig = toml::from_str(content)
        .map_err(|e| ExportError::ConfigError(format!("Failed to parse config: {}", e)))?;

    // Validate config
    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &ExportConfig) -> Result<()> {
    let name = config.file_name.trim();
    if name.is_empty() {
        return Err(ExportError::ConfigError("file_name is empty".to_string()));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(ExportError::ConfigError(format!(
            "file_name must not contain a path separator: {}",
            config.file_name
        )));
    }

    if name.to_ascii_lowercase().ends_with(".csv") {
        return Err(ExportError::ConfigError(format!(
            "file_name is given without extension: {}",
            config.file_name
        )));
    }

    let tz = parse_timezone(&config.timezone)?;
    parse_start_date(&config.start_date, tz)?;

    Ok(())
}

impl ExportConfig {
    pub fn tz(&self) -> Result<Tz> {
        parse_timezone(&self.timezone)
    }

    /// Start boundary as an instant
    pub fn start_boundary(&self) -> Result<DateTime<Utc>> {
        parse_start_date(&self.start_date, self.tz()?)
    }
}
