use serde::Serialize;

/// Additive aggregate over a set of hour-segmented report rows.
///
/// All fields are kept as `f64` because the historical baseline is a
/// per-week average and the per-metric values are fractional after
/// scaling. Cost is a currency amount, not micros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub impressions: f64,
    pub clicks: f64,
    pub conversions: f64,
    pub cost: f64,
}

/// One hour-segmented row from a Google Ads account report.
#[derive(Debug, Clone, PartialEq)]
pub struct AdRow {
    pub hour: u32,
    pub impressions: f64,
    pub clicks: f64,
    pub conversions: f64,
    /// Raw cost in micro-currency units, as reported by the API.
    pub cost_micros: f64,
}

/// Account metadata from the customer resource.
#[derive(Debug, Clone)]
pub struct AccountInfo {
    pub id: String,
    pub name: String,
    pub currency_code: String,
    pub time_zone: String,
}

/// Per-account alerting configuration read from the account's dashboard
/// sheet on every run. A `None` threshold disables that metric's check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetThresholds {
    pub impressions: Option<f64>,
    pub clicks: Option<f64>,
    pub conversions: Option<f64>,
    pub cost: Option<f64>,
    pub lookback_weeks: u32,
    pub notify_email: Option<String>,
}
