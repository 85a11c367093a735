/// Host lifecycle adapter
///
/// The host calls `on_start` once, `on_new_bar_closed` zero or more times and
/// `on_stop` once, never concurrently. A fatal (I/O) failure aborts the run:
/// the sink is released, later bar notifications are ignored and the error is
/// handed back so the host can stop calling. Other errors are returned without
/// touching the run state.
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::data::BarSequence;
use crate::error::{ExportError, Result};
use crate::export::{BarExporter, CsvFileSink, RecordSink};
use crate::types::{ExportConfig, ExportStats};

/// Callbacks a host drives
pub trait BarLifecycle {
    fn on_start(&mut self, bars: &dyn BarSequence) -> Result<()>;

    fn on_new_bar_closed(&mut self, bars: &dyn BarSequence) -> Result<()>;

    fn on_stop(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Stopped,
    Aborted,
}

impl RunState {
    pub fn as_str(&self) -> &str {
        match self {
            RunState::Idle => "IDLE",
            RunState::Running => "RUNNING",
            RunState::Stopped => "STOPPED",
            RunState::Aborted => "ABORTED",
        }
    }
}

pub struct ExportRobot<S: RecordSink = CsvFileSink> {
    config: ExportConfig,
    exporter: BarExporter<S>,
    state: RunState,
}

impl ExportRobot<CsvFileSink> {
    /// Robot writing to a CSV file at `config.output_path()`
    pub fn new(config: ExportConfig) -> Result<Self> {
        Self::with_sink(config, CsvFileSink::new())
    }
}

impl<S: RecordSink> ExportRobot<S> {
    pub fn with_sink(config: ExportConfig, sink: S) -> Result<Self> {
        crate::config::validate_config(&config)?;
        let tz = config.tz()?;

        Ok(ExportRobot {
            config,
            exporter: BarExporter::new(sink, tz),
            state: RunState::Idle,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn stats(&self) -> ExportStats {
        self.exporter.stats()
    }

    pub fn output_path(&self) -> PathBuf {
        self.config.output_path()
    }

    pub fn exporter(&self) -> &BarExporter<S> {
        &self.exporter
    }

    fn abort(&mut self, err: &ExportError) {
        error!("Export aborted: {} ({})", err, err.error_code());
        if let Err(e) = self.exporter.shutdown() {
            warn!(?e, "Failed to release export sink after abort");
        }
        self.state = RunState::Aborted;
    }

    fn start(&mut self, bars: &dyn BarSequence) -> Result<()> {
        let boundary = self.config.start_boundary()?;
        let path = self.config.output_path();

        self.exporter.initialize(boundary, &path)?;
        self.state = RunState::Running;
        info!("Export started. Writing to: {}", path.display());

        self.exporter.export_historical(bars)?;
        Ok(())
    }
}

impl<S: RecordSink> BarLifecycle for ExportRobot<S> {
    fn on_start(&mut self, bars: &dyn BarSequence) -> Result<()> {
        if self.state != RunState::Idle {
            return Err(ExportError::InvalidState(format!(
                "on_start called while {}",
                self.state.as_str()
            )));
        }

        let result = self.start(bars);
        if let Err(e) = &result {
            if e.is_fatal() {
                self.abort(e);
            } else {
                warn!("Export not started: {} ({})", e, e.error_code());
            }
        }
        result
    }

    fn on_new_bar_closed(&mut self, bars: &dyn BarSequence) -> Result<()> {
        if self.state != RunState::Running {
            return Ok(());
        }

        if let Err(e) = self.exporter.on_bar_closed(bars) {
            if e.is_fatal() {
                self.abort(&e);
            }
            return Err(e);
        }
        Ok(())
    }

    fn on_stop(&mut self) -> Result<()> {
        let result = self.exporter.shutdown();

        let stats = self.exporter.stats();
        info!(
            written = stats.records_written,
            skipped_before_boundary = stats.skipped_before_boundary,
            skipped_already_exported = stats.skipped_already_exported,
            "Export stopped."
        );

        if self.state != RunState::Aborted {
            self.state = RunState::Stopped;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::exporter::tests::{bar_at, ts, MemorySink};
    use crate::types::Bar;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> ExportConfig {
        ExportConfig {
            output_dir: dir.path().to_path_buf(),
            file_name: "Export".to_string(),
            ..Default::default()
        }
    }

    fn scenario_bars() -> Vec<Bar> {
        vec![
            bar_at(ts(2023, 12, 31, 0)),
            bar_at(ts(2024, 1, 1, 0)),
            bar_at(ts(2024, 1, 1, 1)),
        ]
    }

    fn file_lines(robot: &ExportRobot) -> Vec<String> {
        std::fs::read_to_string(robot.output_path())
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn test_full_run_to_file() {
        let dir = TempDir::new().unwrap();
        let mut robot = ExportRobot::new(config_in(&dir)).unwrap();
        let mut bars = scenario_bars();

        robot.on_start(&bars).unwrap();
        assert_eq!(robot.state(), RunState::Running);
        assert_eq!(
            file_lines(&robot),
            vec!["Date,Open,High,Low,Close,Volume", "2024-01-01 00:00:00,1.1,1.2,1,1.15,10"]
        );

        bars.push(bar_at(ts(2024, 1, 1, 2)));
        robot.on_new_bar_closed(&bars).unwrap();
        robot.on_new_bar_closed(&bars).unwrap();

        // Durable before stop
        let lines = file_lines(&robot);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "2024-01-01 01:00:00,1.1,1.2,1,1.15,10");
        assert_eq!(robot.exporter().cursor(), Some(ts(2024, 1, 1, 1)));

        robot.on_stop().unwrap();
        assert_eq!(robot.state(), RunState::Stopped);
        assert_eq!(file_lines(&robot).len(), 3);
    }

    #[test]
    fn test_rerun_overwrites_previous_file() {
        let dir = TempDir::new().unwrap();
        let bars = scenario_bars();

        let mut first = ExportRobot::new(config_in(&dir)).unwrap();
        first.on_start(&bars).unwrap();
        first.on_stop().unwrap();

        let mut second = ExportRobot::new(ExportConfig {
            start_date: "2030-01-01".to_string(),
            ..config_in(&dir)
        })
        .unwrap();
        second.on_start(&bars).unwrap();
        second.on_stop().unwrap();

        assert_eq!(file_lines(&second), vec!["Date,Open,High,Low,Close,Volume"]);
    }

    #[test]
    fn test_open_failure_aborts_run() {
        let sink = MemorySink {
            fail_open: true,
            ..Default::default()
        };
        let mut robot = ExportRobot::with_sink(ExportConfig::default(), sink).unwrap();

        let result = robot.on_start(&scenario_bars());
        assert!(matches!(result, Err(ExportError::IoFailure(_))));
        assert_eq!(robot.state(), RunState::Aborted);
        assert!(robot.exporter().sink().lines.is_empty());

        robot.on_stop().unwrap();
        assert_eq!(robot.state(), RunState::Aborted);
    }

    #[test]
    fn test_write_failure_stops_processing() {
        let sink = MemorySink {
            fail_on_record: Some(2),
            ..Default::default()
        };
        let mut robot = ExportRobot::with_sink(ExportConfig::default(), sink).unwrap();
        let mut bars = scenario_bars();

        robot.on_start(&bars).unwrap();
        bars.push(bar_at(ts(2024, 1, 1, 2)));
        assert!(robot.on_new_bar_closed(&bars).is_err());
        assert_eq!(robot.state(), RunState::Aborted);

        // Later notifications are ignored
        bars.push(bar_at(ts(2024, 1, 1, 3)));
        robot.on_new_bar_closed(&bars).unwrap();
        assert_eq!(robot.exporter().sink().records().len(), 1);
    }

    #[test]
    fn test_double_start_rejected() {
        let mut robot = ExportRobot::with_sink(ExportConfig::default(), MemorySink::default()).unwrap();
        let bars = scenario_bars();
        robot.on_start(&bars).unwrap();

        let result = robot.on_start(&bars);
        assert!(matches!(result, Err(ExportError::InvalidState(_))));
        assert_eq!(robot.state(), RunState::Running);
        assert_eq!(robot.exporter().sink().records().len(), 1);
    }

    #[test]
    fn test_bar_closed_before_start_is_ignored() {
        let mut robot = ExportRobot::with_sink(ExportConfig::default(), MemorySink::default()).unwrap();
        robot.on_new_bar_closed(&scenario_bars()).unwrap();
        assert!(robot.exporter().sink().lines.is_empty());
        assert_eq!(robot.state(), RunState::Idle);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ExportConfig {
            timezone: "Not/AZone".to_string(),
            ..Default::default()
        };
        assert!(matches!(ExportRobot::new(config), Err(ExportError::ConfigError(_))));
    }

    #[test]
    fn test_config_error_on_start_leaves_run_idle() {
        let mut robot = ExportRobot::with_sink(ExportConfig::default(), MemorySink::default()).unwrap();
        robot.config.start_date = "not a date".to_string();

        let result = robot.on_start(&scenario_bars());
        assert!(matches!(result, Err(ExportError::ConfigError(_))));
        assert_eq!(robot.state(), RunState::Idle);
        assert!(!robot.exporter().sink().open);
        assert_eq!(robot.exporter().sink().close_calls, 0);
    }

    #[test]
    fn test_sink_reports_destination_while_running() {
        let dir = TempDir::new().unwrap();
        let mut robot = ExportRobot::new(config_in(&dir)).unwrap();

        robot.on_start(&scenario_bars()).unwrap();
        assert_eq!(robot.exporter().sink().path(), Some(robot.output_path().as_path()));

        robot.on_stop().unwrap();
        assert!(robot.exporter().sink().path().is_none());
    }
}
