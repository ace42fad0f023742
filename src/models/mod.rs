// Models module
pub mod stats;

pub use stats::{AccountInfo, AdRow, SheetThresholds, Snapshot};
