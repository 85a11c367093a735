/// Durable, line-oriented CSV output
///
/// Every `write_record` is written and synced before it returns, so a crash
/// right after the call still leaves the record in the file. A failed write
/// is rolled back to the last durable length and the file is released; the
/// failed record is never retried.
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::{debug, error, info, warn};

use crate::error::{ExportError, Result};
use crate::export::record::{OutputRecord, HEADER};

/// Append-only record sink
pub trait RecordSink {
    /// Create or truncate `path` and write the header line
    fn open(&mut self, path: &Path) -> Result<()>;

    /// Append one record; durable on return
    fn write_record(&mut self, record: &OutputRecord) -> Result<()>;

    /// Flush and release; safe to call repeatedly or without `open`
    fn close(&mut self) -> Result<()>;

    fn is_open(&self) -> bool;
}

/// Byte storage under a sink
pub trait DurableStorage: Write {
    /// Force written bytes down to the device
    fn sync_data(&mut self) -> io::Result<()>;

    /// Cut the storage back to `len` bytes
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl DurableStorage for File {
    fn sync_data(&mut self) -> io::Result<()> {
        File::sync_data(self)
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Active writer state for the open file
struct ActiveWriter<W: DurableStorage> {
    storage: W,
    path: PathBuf,
    durable_len: u64,
    records_written: usize,
}

impl<W: DurableStorage> ActiveWriter<W> {
    fn append_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.storage.write_all(line)?;
        self.storage.flush()?;
        self.storage.sync_data()?;
        self.durable_len += line.len() as u64;
        Ok(())
    }

    /// Drop any partial line left by a failed append
    fn roll_back(&mut self) {
        let rollback = self
            .storage
            .truncate(self.durable_len)
            .and_then(|_| self.storage.sync_data());
        if let Err(e) = rollback {
            warn!(?e, path = %self.path.display(), len = self.durable_len, "Failed to roll back partial record");
        }
    }
}

/// CSV file sink
pub struct CsvFileSink<W: DurableStorage = File> {
    active: Option<ActiveWriter<W>>,
}

impl CsvFileSink<File> {
    pub fn new() -> Self {
        Self { active: None }
    }
}

impl Default for CsvFileSink<File> {
    fn default() -> Self {
        Self::new()
    }
}

/// Render one CSV line, terminator included
fn render_line<I, T>(fields: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let terminator = if cfg!(windows) {
        Terminator::CRLF
    } else {
        Terminator::Any(b'\n')
    };
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .terminator(terminator)
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    writer.into_inner().map_err(|e| ExportError::IoFailure(e.into_error()))
}

impl<W: DurableStorage> CsvFileSink<W> {
    pub fn path(&self) -> Option<&Path> {
        self.active.as_ref().map(|a| a.path.as_path())
    }

    pub fn records_written(&self) -> usize {
        self.active.as_ref().map(|a| a.records_written).unwrap_or(0)
    }

    /// Take ownership of empty `storage` and write the header
    fn attach(&mut self, storage: W, path: &Path) -> Result<()> {
        let mut active = ActiveWriter {
            storage,
            path: path.to_path_buf(),
            durable_len: 0,
            records_written: 0,
        };
        active.append_line(&render_line(HEADER)?)?;

        self.active = Some(active);
        Ok(())
    }

    fn append(&mut self, record: &OutputRecord) -> Result<()> {
        let active = self.active.as_mut().ok_or_else(|| {
            ExportError::IoFailure(io::Error::new(io::ErrorKind::NotConnected, "export sink is not open"))
        })?;
        let line = render_line(record.fields())?;

        if let Err(e) = active.append_line(&line) {
            error!(path = %active.path.display(), date = %record.date, "Record write failed: {}", e);
            active.roll_back();
            // The failed record is gone with the writer
            self.active = None;
            return Err(e.into());
        }
        active.records_written += 1;

        debug!(date = %record.date, total = active.records_written, "Wrote bar record");
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        if let Some(mut active) = self.active.take() {
            // Every appended line is already synced
            let result = active.storage.sync_data().map_err(ExportError::from);
            if let Err(e) = &result {
                warn!(?e, path = %active.path.display(), "Failed to sync export on close");
            }
            info!(
                path = %active.path.display(),
                records = active.records_written,
                "Closed CSV export"
            );
            return result;
        }
        Ok(())
    }
}

impl RecordSink for CsvFileSink<File> {
    fn open(&mut self, path: &Path) -> Result<()> {
        // A previous file is never left dangling
        self.release()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        info!(path = %path.display(), "Opening CSV export (truncate mode)");

        let file = File::create(path)?;
        self.attach(file, path)
    }

    fn write_record(&mut self, record: &OutputRecord) -> Result<()> {
        self.append(record)
    }

    fn close(&mut self) -> Result<()> {
        self.release()
    }

    fn is_open(&self) -> bool {
        self.active.is_some()
    }
}

impl<W: DurableStorage> Drop for CsvFileSink<W> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(?e, "Failed to close export sink on drop");
        }
    }
}
