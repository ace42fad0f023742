use crate::models::{SheetThresholds, Snapshot};

/// The four tracked account metrics, in dashboard row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Impressions,
    Clicks,
    Conversions,
    Cost,
}

/// Which side of the expected value is the anomaly.
///
/// Volume metrics alert when they fall below the expected fraction;
/// cost alerts when it exceeds it, because overspend rather than
/// underspend is the risk signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    TooLow,
    TooHigh,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Impressions,
        Metric::Clicks,
        Metric::Conversions,
        Metric::Cost,
    ];

    pub fn direction(self) -> Direction {
        match self {
            Metric::Cost => Direction::TooHigh,
            _ => Direction::TooLow,
        }
    }

    pub fn threshold(self, thresholds: &SheetThresholds) -> Option<f64> {
        match self {
            Metric::Impressions => thresholds.impressions,
            Metric::Clicks => thresholds.clicks,
            Metric::Conversions => thresholds.conversions,
            Metric::Cost => thresholds.cost,
        }
    }

    pub fn value(self, snapshot: &Snapshot) -> f64 {
        match self {
            Metric::Impressions => snapshot.impressions,
            Metric::Clicks => snapshot.clicks,
            Metric::Conversions => snapshot.conversions,
            Metric::Cost => snapshot.cost,
        }
    }

    fn message(self, actual: f64, expected: f64, hour: u32, currency: &str) -> String {
        match self {
            Metric::Impressions => format!(
                "    Impressions are too low: {actual:.0} impressions by {hour}:00, \
                 expecting at least {expected:.0}"
            ),
            Metric::Clicks => format!(
                "    Clicks are too low: {actual:.0} clicks by {hour}:00, \
                 expecting at least {expected:.1}"
            ),
            Metric::Conversions => format!(
                "    Conversions are too low: {actual:.1} conversions by {hour}:00, \
                 expecting at least {expected:.1}"
            ),
            Metric::Cost => format!(
                "    Cost is too high: {actual:.2} {currency} by {hour}:00, \
                 expecting at most {expected:.2}"
            ),
        }
    }
}

/// One triggered threshold check.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub metric: Metric,
    pub hour: u32,
    pub message: String,
}

/// Compare today's partial-day snapshot against the baseline. Both
/// snapshots cover the same hour-bounded window; the baseline is
/// already averaged per week. Metrics with no configured threshold are
/// skipped outright.
pub fn evaluate(
    today: &Snapshot,
    baseline: &Snapshot,
    thresholds: &SheetThresholds,
    hour: u32,
    currency: &str,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for metric in Metric::ALL {
        let Some(threshold) = metric.threshold(thresholds) else {
            continue;
        };

        let actual = metric.value(today);
        let expected = metric.value(baseline) * threshold;
        let triggered = match metric.direction() {
            Direction::TooLow => actual < expected,
            Direction::TooHigh => actual > expected,
        };

        if triggered {
            alerts.push(Alert {
                metric,
                hour,
                message: metric.message(actual, expected, hour, currency),
            });
        }
    }

    alerts
}
