// adwatch library crate
// Exposes modules for integration testing

pub mod ads;
pub mod alerts;
pub mod analysis;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod sheets;
