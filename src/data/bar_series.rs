/// Host-owned bar sequence contract
///
/// The host feed is append-only and ordered by strictly increasing open time.
/// Index `len() - 1` is the forming bar; `len() - 2` is the last closed one.
use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::types::{Bar, Ohlcv};

pub trait BarSequence {
    fn len(&self) -> usize;

    fn open_time_at(&self, index: usize) -> Option<DateTime<Utc>>;

    fn ohlcv_at(&self, index: usize) -> Option<Ohlcv>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the most recently closed bar, if any
    fn last_closed_index(&self) -> Option<usize> {
        self.len().checked_sub(2)
    }

    fn bar_at(&self, index: usize) -> Option<Bar> {
        let open_time = self.open_time_at(index)?;
        let o = self.ohlcv_at(index)?;
        Some(Bar::new(open_time, o.open, o.high, o.low, o.close, o.volume))
    }
}

impl BarSequence for [Bar] {
    fn len(&self) -> usize {
        <[Bar]>::len(self)
    }

    fn open_time_at(&self, index: usize) -> Option<DateTime<Utc>> {
        self.get(index).map(|b| b.open_time)
    }

    fn ohlcv_at(&self, index: usize) -> Option<Ohlcv> {
        self.get(index).map(Bar::ohlcv)
    }
}

impl BarSequence for Vec<Bar> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn open_time_at(&self, index: usize) -> Option<DateTime<Utc>> {
        self.as_slice().open_time_at(index)
    }

    fn ohlcv_at(&self, index: usize) -> Option<Ohlcv> {
        self.as_slice().ohlcv_at(index)
    }
}

impl BarSequence for VecDeque<Bar> {
    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn open_time_at(&self, index: usize) -> Option<DateTime<Utc>> {
        self.get(index).map(|b| b.open_time)
    }

    fn ohlcv_at(&self, index: usize) -> Option<Ohlcv> {
        self.get(index).map(Bar::ohlcv)
    }
}
