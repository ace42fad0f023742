// Spreadsheet dashboard module
pub mod client;
pub mod dashboard;
pub mod ranges;

pub use client::{SheetStore, SheetsClient};
pub use dashboard::Dashboard;
pub use ranges::{NamedRange, RangeMap, SheetField};
