use crate::alerts::Metric;
use crate::models::{AccountInfo, SheetThresholds, Snapshot};
use crate::sheets::client::SheetStore;
use crate::sheets::ranges::{RangeMap, SheetField};
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};

/// Threshold cell value that disables a metric's check.
pub const NO_ALERT: &str = "No alert";

/// The template ships with this example address; it must be replaced
/// or blanked before alerting can run.
pub const PLACEHOLDER_EMAIL: &str = "foo@example.com";

/// One account's sheet in the shared dashboard spreadsheet, with its
/// named ranges resolved up front.
pub struct Dashboard<'a, S: SheetStore> {
    store: &'a S,
    sheet: String,
    ranges: RangeMap,
}

impl<'a, S: SheetStore> Dashboard<'a, S> {
    /// Open the account's sheet, cloning it from the template on first
    /// contact, and resolve every named range the pipeline touches.
    pub async fn open(store: &'a S, template_sheet: &str, account_id: &str) -> Result<Dashboard<'a, S>> {
        if !store.sheet_exists(account_id).await? {
            println!("Creating dashboard sheet for {account_id} from {template_sheet} ...");
            store
                .duplicate_sheet(template_sheet, account_id)
                .await
                .with_context(|| format!("Failed to clone template sheet for {account_id}"))?;
        }

        let named_ranges = store.named_ranges(account_id).await?;
        let ranges = RangeMap::resolve(&named_ranges)
            .with_context(|| format!("Sheet {account_id} does not match the dashboard template"))?;

        Ok(Dashboard {
            store,
            sheet: account_id.to_string(),
            ranges,
        })
    }

    async fn read(&self, field: SheetField) -> Result<Option<String>> {
        self.store.read_cell(&self.sheet, self.ranges.a1(field)).await
    }

    /// Read the per-account alerting configuration. Always fresh; the
    /// sheet is the source of truth.
    pub async fn thresholds(&self) -> Result<SheetThresholds> {
        let weeks_cell = self
            .read(SheetField::LookbackWeeks)
            .await?
            .context("Lookback weeks cell is empty")?;

        Ok(SheetThresholds {
            impressions: parse_threshold(self.read(SheetField::ImpressionsThreshold).await?)
                .context("Invalid impressions threshold")?,
            clicks: parse_threshold(self.read(SheetField::ClicksThreshold).await?)
                .context("Invalid clicks threshold")?,
            conversions: parse_threshold(self.read(SheetField::ConversionsThreshold).await?)
                .context("Invalid conversions threshold")?,
            cost: parse_threshold(self.read(SheetField::CostThreshold).await?)
                .context("Invalid cost threshold")?,
            lookback_weeks: parse_weeks(&weeks_cell)?,
            notify_email: self
                .read(SheetField::NotifyEmail)
                .await?
                .map(|email| email.trim().to_string())
                .filter(|email| !email.is_empty()),
        })
    }

    /// Reset the daily de-duplication window. Runs at the first
    /// hour-bucket of each day regardless of prior marker content.
    pub async fn clear_alert_markers(&self) -> Result<()> {
        for metric in Metric::ALL {
            self.store
                .clear_cell(&self.sheet, self.ranges.a1(marker_field(metric)))
                .await?;
        }
        Ok(())
    }

    /// Mark a metric as alerted for today. Returns `false` when the
    /// marker was already set, so the caller can keep the alert out of
    /// the day's email as well.
    pub async fn record_alert(&self, metric: Metric, hour: u32) -> Result<bool> {
        let a1 = self.ranges.a1(marker_field(metric));
        if self.store.read_cell(&self.sheet, a1).await?.is_some() {
            return Ok(false);
        }
        self.store
            .write_cell(&self.sheet, a1, &format!("Alerting {hour}:00"))
            .await?;
        Ok(true)
    }

    /// Bookkeeping that persists on every run, alerts or not.
    pub async fn write_run_metadata<T>(&self, now: &DateTime<T>, account: &AccountInfo) -> Result<()>
    where
        T: TimeZone,
        T::Offset: std::fmt::Display,
    {
        self.store
            .write_cell(
                &self.sheet,
                self.ranges.a1(SheetField::RunDate),
                &now.format("%Y-%m-%d %H:%M:%S").to_string(),
            )
            .await?;
        self.store
            .write_cell(&self.sheet, self.ranges.a1(SheetField::AccountId), &account.id)
            .await?;
        self.store
            .write_cell(&self.sheet, self.ranges.a1(SheetField::AccountName), &account.name)
            .await?;
        self.store
            .write_cell(
                &self.sheet,
                self.ranges.a1(SheetField::RunTimestamp),
                &now.format("%a %H:%M:%S %Z").to_string(),
            )
            .await?;
        Ok(())
    }

    /// Today-vs-baseline table, one row per metric.
    pub async fn write_snapshots(&self, today: &Snapshot, baseline: &Snapshot) -> Result<()> {
        let rows = vec![
            vec![
                format!("{:.0}", today.impressions),
                format!("{:.0}", baseline.impressions),
            ],
            vec![format!("{:.0}", today.clicks), format!("{:.1}", baseline.clicks)],
            vec![
                format!("{:.1}", today.conversions),
                format!("{:.1}", baseline.conversions),
            ],
            vec![format!("{:.2}", today.cost), format!("{:.2}", baseline.cost)],
        ];

        self.store
            .write_matrix(&self.sheet, self.ranges.a1(SheetField::DataTable), &rows)
            .await
    }
}

fn marker_field(metric: Metric) -> SheetField {
    match metric {
        Metric::Impressions => SheetField::ImpressionsAlert,
        Metric::Clicks => SheetField::ClicksAlert,
        Metric::Conversions => SheetField::ConversionsAlert,
        Metric::Cost => SheetField::CostAlert,
    }
}

/// A blank cell or the literal `No alert` disables the check; anything
/// else must be a number (thousands separators tolerated).
fn parse_threshold(raw: Option<String>) -> Result<Option<f64>> {
    let Some(raw) = raw else { return Ok(None) };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == NO_ALERT {
        return Ok(None);
    }
    trimmed
        .replace(',', "")
        .parse::<f64>()
        .map(Some)
        .with_context(|| format!("Threshold cell holds a non-numeric value: {raw:?}"))
}

/// The template stores the lookback window as e.g. `"26 weeks"`.
fn parse_weeks(raw: &str) -> Result<u32> {
    let token = raw.split_whitespace().next().unwrap_or("");
    let weeks: u32 = token
        .parse()
        .with_context(|| format!("Lookback weeks cell holds a non-numeric value: {raw:?}"))?;
    if weeks == 0 {
        anyhow::bail!("Lookback weeks must be at least 1");
    }
    Ok(weeks)
}
