pub mod lifecycle;
pub mod replay;

pub use lifecycle::{BarLifecycle, ExportRobot, RunState};
pub use replay::replay;
