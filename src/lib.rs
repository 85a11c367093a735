pub mod types;
pub mod error;
pub mod config;
pub mod data;
pub mod export;
pub mod host;
pub mod utils;

pub use types::*;
pub use error::{ExportError, Result};
