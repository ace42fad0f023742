// Google Ads reporting API module
pub mod client;
pub mod query;

pub use client::{AdsApi, GoogleAdsClient};
