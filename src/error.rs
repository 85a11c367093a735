/// Centralized error types for the bar exporter
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    // Output Errors
    #[error("I/O failure: {0}")]
    IoFailure(#[from] std::io::Error),

    // Configuration Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Lifecycle Errors
    #[error("Invalid lifecycle state: {0}")]
    InvalidState(String),

    // Data Errors (replay input only)
    #[error("Invalid bar data: {0}")]
    InvalidBarData(String),
}

pub type Result<T> = std::result::Result<T, ExportError>;

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(io) => ExportError::IoFailure(io),
            other => ExportError::IoFailure(std::io::Error::other(format!("{:?}", other))),
        }
    }
}

impl ExportError {
    /// An I/O failure ends the run; nothing else does
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExportError::IoFailure(_))
    }

    /// Get error code for logging
    pub fn error_code(&self) -> &str {
        match self {
            ExportError::IoFailure(_) => "IO_001",
            ExportError::ConfigError(_) => "CFG_001",
            ExportError::InvalidState(_) => "STATE_001",
            ExportError::InvalidBarData(_) => "DATA_001",
        }
    }
}
