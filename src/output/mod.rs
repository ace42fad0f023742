// Output module
pub mod table;

pub use table::{AccountRunRow, OutputFormat};
