pub mod bar_series;
pub mod replay;

pub use bar_series::BarSequence;
pub use replay::{load_bars_csv, read_bars_csv};
