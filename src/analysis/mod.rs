// Analysis module
pub mod accumulate;

pub use accumulate::accumulate;
