/// Drive a lifecycle over a recorded bar file
///
/// The first `history` bars plus one forming bar are visible at start; the
/// rest arrive one at a time, each followed by a closed-bar notification.
use tracing::error;

use crate::error::Result;
use crate::host::lifecycle::BarLifecycle;
use crate::types::Bar;

/// Replay `bars` through `robot`, always calling `on_stop`.
///
/// The first error from `on_start` or `on_new_bar_closed` ends the replay and
/// is returned after the stop callback.
pub fn replay<L: BarLifecycle + ?Sized>(robot: &mut L, bars: &[Bar], history: usize) -> Result<()> {
    // Visible at start: the history plus the forming bar
    let initial = history.saturating_add(1).min(bars.len());
    let mut visible: Vec<Bar> = bars[..initial].to_vec();

    let mut outcome = robot.on_start(&visible);
    if let Err(e) = &outcome {
        error!("❌ Export failed to start: {}", e);
    } else {
        for bar in &bars[initial..] {
            visible.push(bar.clone());
            if let Err(e) = robot.on_new_bar_closed(&visible) {
                error!("❌ Stopping replay: {}", e);
                outcome = Err(e);
                break;
            }
        }
    }

    let stopped = robot.on_stop();
    outcome.and(stopped)
}
