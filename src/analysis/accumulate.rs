use crate::models::{AdRow, Snapshot};

pub const MICROS_PER_UNIT: f64 = 1_000_000.0;

/// Accumulate report rows into a single snapshot, bounded by the hour
/// cutoff.
///
/// Only rows with `hour` strictly below `hour_cutoff` contribute; a row
/// at exactly the cutoff hour is excluded because that hour's data is
/// not yet complete. Each contribution is scaled by `coefficient`
/// (`1.0` for today's partial day, `1.0 / weeks` to average the
/// historical lookback window). Cost arrives in micros and is converted
/// to currency units before accumulation.
pub fn accumulate(rows: &[AdRow], hour_cutoff: u32, coefficient: f64) -> Snapshot {
    let mut snapshot = Snapshot::default();

    for row in rows.iter().filter(|row| row.hour < hour_cutoff) {
        snapshot.impressions += row.impressions * coefficient;
        snapshot.clicks += row.clicks * coefficient;
        snapshot.conversions += row.conversions * coefficient;
        snapshot.cost += row.cost_micros / MICROS_PER_UNIT * coefficient;
    }

    snapshot
}
