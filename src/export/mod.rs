pub mod exporter;
pub mod record;
pub mod sink;

pub use exporter::{BarExporter, EmitOutcome};
pub use record::{OutputRecord, HEADER};
pub use sink::{CsvFileSink, RecordSink};
