// Per-account anomaly check pipeline
use crate::ads::AdsApi;
use crate::ads::query;
use crate::alerts::email::{Mailer, alert_body, alert_subject};
use crate::alerts::evaluate;
use crate::analysis::accumulate;
use crate::config::Config;
use crate::sheets::client::SheetStore;
use crate::sheets::dashboard::{Dashboard, PLACEHOLDER_EMAIL};
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Days, Duration, Timelike, Utc};
use chrono_tz::Tz;

/// Result of one account's run, for the end-of-run summary.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub account_id: String,
    pub account_name: String,
    /// Alert messages newly recorded this run (de-duplicated ones are
    /// not included).
    pub alerts: Vec<String>,
    /// False when either query returned no rows and evaluation was
    /// skipped.
    pub evaluated: bool,
}

/// Run the full check for one account: read sheet config, query today
/// and the baseline window, evaluate thresholds, persist results, and
/// send the combined alert email.
///
/// Accounts are independent; the caller decides what to do with a
/// failure.
pub async fn process_account<A, S, M>(
    ads: &A,
    sheets: &S,
    mailer: Option<&M>,
    config: &Config,
    customer_id: &str,
    now_utc: DateTime<Utc>,
) -> Result<RunOutcome>
where
    A: AdsApi,
    S: SheetStore,
    M: Mailer,
{
    let account = ads.account_info(customer_id).await?;
    println!("Processing {} ({}) ...", account.name, account.id);

    let tz: Tz = account
        .time_zone
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid account time zone {:?}: {e}", account.time_zone))?;

    let dashboard = Dashboard::open(sheets, &config.spreadsheet.template_sheet, customer_id).await?;
    let thresholds = dashboard.thresholds().await?;

    if thresholds.notify_email.as_deref() == Some(PLACEHOLDER_EMAIL) {
        anyhow::bail!(
            "Please set a custom email address in the sheet for {customer_id}, \
             or blank the email cell to send no email."
        );
    }

    let now = now_utc.with_timezone(&tz);
    // Reporting stats lag behind; bound today's window at the last
    // complete hour instead of the wall clock.
    let up_to = now - Duration::hours(config.ads.report_lag_hours);
    let hour_cutoff = up_to.hour();

    if hour_cutoff == 1 {
        // First run of the day: open a fresh de-duplication window.
        dashboard.clear_alert_markers().await?;
    }

    let today = up_to.date_naive();
    let baseline_end = today - Days::new(1);
    let baseline_start = today - Days::new(1 + u64::from(thresholds.lookback_weeks) * 7);

    let today_rows = ads
        .search_rows(customer_id, &query::today_query(today))
        .await?;
    let past_rows = ads
        .search_rows(
            customer_id,
            &query::baseline_query(now.weekday(), baseline_start, baseline_end),
        )
        .await?;

    let today_snapshot =
        (!today_rows.is_empty()).then(|| accumulate(&today_rows, hour_cutoff, 1.0));
    let baseline_snapshot = (!past_rows.is_empty()).then(|| {
        accumulate(
            &past_rows,
            hour_cutoff,
            1.0 / f64::from(thresholds.lookback_weeks),
        )
    });

    let mut new_alerts = Vec::new();
    if let (Some(today_stats), Some(baseline_stats)) = (&today_snapshot, &baseline_snapshot) {
        let alerts = evaluate::evaluate(
            today_stats,
            baseline_stats,
            &thresholds,
            hour_cutoff,
            &account.currency_code,
        );

        for alert in alerts {
            if dashboard.record_alert(alert.metric, alert.hour).await? {
                new_alerts.push(alert.message);
            }
        }

        if !new_alerts.is_empty() {
            if let Some(to) = thresholds.notify_email.as_deref() {
                match mailer {
                    Some(mailer) => mailer
                        .send(
                            to,
                            &alert_subject(&account),
                            &alert_body(&account, &new_alerts, &config.spreadsheet.url),
                        )
                        .await
                        .with_context(|| {
                            format!("Failed to send alert email for account {customer_id}")
                        })?,
                    None => eprintln!(
                        "Warning: alerts raised for {} but no [email] section is configured",
                        account.id
                    ),
                }
            }
        }
    }

    dashboard.write_run_metadata(&now, &account).await?;
    if let (Some(today_stats), Some(baseline_stats)) = (&today_snapshot, &baseline_snapshot) {
        dashboard.write_snapshots(today_stats, baseline_stats).await?;
    }

    Ok(RunOutcome {
        account_id: account.id,
        account_name: account.name,
        alerts: new_alerts,
        evaluated: today_snapshot.is_some() && baseline_snapshot.is_some(),
    })
}
