/// Bar export decision logic
///
/// Walks closed bars of a host sequence and writes each eligible one exactly
/// once. A bar is eligible iff `open_time >= start boundary` and
/// `open_time > cursor`, where the cursor is the open time of the last bar
/// written. Equal open times are therefore written at most once.
///
/// Callers must not overlap calls; the `&mut self` receivers make that the
/// host's problem, not ours.
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::path::Path;
use tracing::{debug, error, info};

use crate::data::BarSequence;
use crate::error::Result;
use crate::export::record::OutputRecord;
use crate::export::sink::RecordSink;
use crate::types::ExportStats;

/// Result of a single emission decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    Written,
    BeforeBoundary,
    AlreadyExported,
    OutOfRange,
}

pub struct BarExporter<S: RecordSink> {
    sink: S,
    timezone: Tz,
    start_boundary: Option<DateTime<Utc>>,
    /// `None` is "before all time"
    cursor: Option<DateTime<Utc>>,
    stats: ExportStats,
}

impl<S: RecordSink> BarExporter<S> {
    pub fn new(sink: S, timezone: Tz) -> Self {
        BarExporter {
            sink,
            timezone,
            start_boundary: None,
            cursor: None,
            stats: ExportStats::default(),
        }
    }

    /// Set the boundary, reset the cursor and open the sink at `destination`.
    ///
    /// On failure nothing is retained: the sink is released and the exporter
    /// stays uninitialized.
    pub fn initialize(&mut self, start_boundary: DateTime<Utc>, destination: &Path) -> Result<()> {
        self.start_boundary = None;
        self.cursor = None;
        self.stats = ExportStats::default();

        if let Err(e) = self.sink.open(destination) {
            error!(path = %destination.display(), "Failed to open export sink: {}", e);
            let _ = self.sink.close();
            return Err(e);
        }

        self.start_boundary = Some(start_boundary);
        debug!(start = %start_boundary, "Exporter initialized");
        Ok(())
    }

    /// Emit every closed bar `[0, N-2]` in ascending order.
    ///
    /// Returns the number of records written. The first I/O failure stops the
    /// walk and is returned.
    pub fn export_historical<B: BarSequence + ?Sized>(&mut self, bars: &B) -> Result<usize> {
        let Some(last_closed) = bars.last_closed_index() else {
            debug!(len = bars.len(), "No closed bars to backfill");
            return Ok(0);
        };

        let before = self.stats.records_written;
        for index in 0..=last_closed {
            self.try_emit(bars, index)?;
        }
        let written = self.stats.records_written - before;

        info!(
            closed_bars = last_closed + 1,
            written,
            skipped_before_boundary = self.stats.skipped_before_boundary,
            "Historical backfill complete"
        );
        Ok(written)
    }

    /// Emit the most recently closed bar (`N-2`), if eligible
    pub fn on_bar_closed<B: BarSequence + ?Sized>(&mut self, bars: &B) -> Result<EmitOutcome> {
        match bars.last_closed_index() {
            Some(index) => self.try_emit(bars, index),
            None => {
                self.stats.out_of_range += 1;
                Ok(EmitOutcome::OutOfRange)
            }
        }
    }

    /// Decide on one index and write it when eligible.
    ///
    /// The cursor only moves after the record is durable.
    pub fn try_emit<B: BarSequence + ?Sized>(&mut self, bars: &B, index: usize) -> Result<EmitOutcome> {
        let Some(bar) = (index < bars.len()).then(|| bars.bar_at(index)).flatten() else {
            self.stats.out_of_range += 1;
            return Ok(EmitOutcome::OutOfRange);
        };

        // Uninitialized exporters treat every bar as before the boundary
        let Some(boundary) = self.start_boundary else {
            self.stats.skipped_before_boundary += 1;
            return Ok(EmitOutcome::BeforeBoundary);
        };

        if bar.open_time < boundary {
            self.stats.skipped_before_boundary += 1;
            return Ok(EmitOutcome::BeforeBoundary);
        }

        if self.cursor.is_some_and(|cursor| bar.open_time <= cursor) {
            self.stats.skipped_already_exported += 1;
            return Ok(EmitOutcome::AlreadyExported);
        }

        let record = OutputRecord::from_bar(&bar, self.timezone);
        self.sink.write_record(&record)?;

        self.cursor = Some(bar.open_time);
        self.stats.records_written += 1;
        Ok(EmitOutcome::Written)
    }

    /// Close the sink; safe to call repeatedly
    pub fn shutdown(&mut self) -> Result<()> {
        self.sink.close()
    }

    pub fn cursor(&self) -> Option<DateTime<Utc>> {
        self.cursor
    }

    pub fn start_boundary(&self) -> Option<DateTime<Utc>> {
        self.start_boundary
    }

    pub fn stats(&self) -> ExportStats {
        self.stats
    }

    pub fn is_initialized(&self) -> bool {
        self.start_boundary.is_some() && self.sink.is_open()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
