// End-to-end pipeline tests against in-memory service fakes.
use adwatch::ads::AdsApi;
use adwatch::alerts::Mailer;
use adwatch::config::Config;
use adwatch::commands::run_accounts;
use adwatch::models::{AccountInfo, AdRow};
use adwatch::pipeline::process_account;
use adwatch::sheets::client::SheetStore;
use adwatch::sheets::ranges::{NamedRange, SheetField};
use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

const ACCOUNT_ID: &str = "123-123-1234";

struct FakeAds {
    account: AccountInfo,
    today_rows: Vec<AdRow>,
    past_rows: Vec<AdRow>,
    queries: Mutex<Vec<String>>,
}

impl FakeAds {
    fn new(today_rows: Vec<AdRow>, past_rows: Vec<AdRow>) -> Self {
        Self {
            account: AccountInfo {
                id: ACCOUNT_ID.to_string(),
                name: "Acme Retail".to_string(),
                currency_code: "EUR".to_string(),
                time_zone: "UTC".to_string(),
            },
            today_rows,
            past_rows,
            queries: Mutex::new(Vec::new()),
        }
    }
}

impl AdsApi for FakeAds {
    async fn search_rows(&self, _customer_id: &str, gaql: &str) -> Result<Vec<AdRow>> {
        self.queries.lock().unwrap().push(gaql.to_string());
        if gaql.contains("day_of_week=") {
            Ok(self.past_rows.clone())
        } else {
            Ok(self.today_rows.clone())
        }
    }

    async fn account_info(&self, _customer_id: &str) -> Result<AccountInfo> {
        Ok(self.account.clone())
    }

    async fn list_client_accounts(&self) -> Result<Vec<String>> {
        Ok(vec![])
    }
}

struct FakeSheets {
    cells: Mutex<HashMap<String, String>>,
    sheets: Mutex<Vec<String>>,
    duplications: Mutex<Vec<(String, String)>>,
}

impl FakeSheets {
    /// A sheet pre-populated the way the dashboard template ships:
    /// impressions/cost thresholds set, clicks/conversions disabled.
    fn with_default_thresholds() -> Self {
        let store = Self {
            cells: Mutex::new(HashMap::new()),
            sheets: Mutex::new(vec!["templateSheet".to_string(), ACCOUNT_ID.to_string()]),
            duplications: Mutex::new(Vec::new()),
        };
        store.seed(SheetField::ImpressionsThreshold, "0.7");
        store.seed(SheetField::ClicksThreshold, "No alert");
        store.seed(SheetField::ConversionsThreshold, "No alert");
        store.seed(SheetField::CostThreshold, "1.2");
        store.seed(SheetField::LookbackWeeks, "4 weeks");
        store.seed(SheetField::NotifyEmail, "ops@example.com");
        store
    }

    fn seed(&self, field: SheetField, value: &str) {
        self.cells
            .lock()
            .unwrap()
            .insert(key(ACCOUNT_ID, field_a1(field)), value.to_string());
    }

    fn cell(&self, field: SheetField) -> Option<String> {
        self.cells
            .lock()
            .unwrap()
            .get(&key(ACCOUNT_ID, field_a1(field)))
            .cloned()
    }
}

fn key(sheet: &str, a1: &str) -> String {
    format!("{sheet}!{a1}")
}

/// Template layout: one column of single cells plus the data block.
fn field_a1(field: SheetField) -> &'static str {
    match field {
        SheetField::ImpressionsThreshold => "B1",
        SheetField::ClicksThreshold => "B2",
        SheetField::ConversionsThreshold => "B3",
        SheetField::CostThreshold => "B4",
        SheetField::LookbackWeeks => "B5",
        SheetField::NotifyEmail => "B6",
        SheetField::ImpressionsAlert => "B7",
        SheetField::ClicksAlert => "B8",
        SheetField::ConversionsAlert => "B9",
        SheetField::CostAlert => "B10",
        SheetField::RunDate => "B11",
        SheetField::AccountId => "B12",
        SheetField::AccountName => "B13",
        SheetField::RunTimestamp => "B14",
        SheetField::DataTable => "B20:C23",
    }
}

impl SheetStore for FakeSheets {
    async fn sheet_exists(&self, title: &str) -> Result<bool> {
        Ok(self.sheets.lock().unwrap().iter().any(|t| t == title))
    }

    async fn duplicate_sheet(&self, source_title: &str, new_title: &str) -> Result<()> {
        self.duplications
            .lock()
            .unwrap()
            .push((source_title.to_string(), new_title.to_string()));
        self.sheets.lock().unwrap().push(new_title.to_string());
        Ok(())
    }

    async fn named_ranges(&self, _title: &str) -> Result<Vec<NamedRange>> {
        Ok(SheetField::ALL
            .iter()
            .map(|field| NamedRange {
                name: format!("{ACCOUNT_ID}_{}", field.suffix()),
                a1: field_a1(*field).to_string(),
            })
            .collect())
    }

    async fn read_cell(&self, title: &str, a1: &str) -> Result<Option<String>> {
        Ok(self
            .cells
            .lock()
            .unwrap()
            .get(&key(title, a1))
            .filter(|value| !value.is_empty())
            .cloned())
    }

    async fn write_cell(&self, title: &str, a1: &str, value: &str) -> Result<()> {
        self.cells
            .lock()
            .unwrap()
            .insert(key(title, a1), value.to_string());
        Ok(())
    }

    async fn write_matrix(&self, title: &str, a1: &str, values: &[Vec<String>]) -> Result<()> {
        let rendered = values
            .iter()
            .map(|row| row.join("|"))
            .collect::<Vec<_>>()
            .join(";");
        self.cells.lock().unwrap().insert(key(title, a1), rendered);
        Ok(())
    }

    async fn clear_cell(&self, title: &str, a1: &str) -> Result<()> {
        self.cells.lock().unwrap().remove(&key(title, a1));
        Ok(())
    }
}

#[derive(Default)]
struct FakeMailer {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl Mailer for FakeMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.spreadsheet.url = "https://docs.google.com/spreadsheets/d/test123/edit".to_string();
    config
}

fn row(hour: u32, impressions: f64, cost_micros: f64) -> AdRow {
    AdRow {
        hour,
        impressions,
        clicks: 0.0,
        conversions: 0.0,
        cost_micros,
    }
}

/// Monday 2024-03-18 13:00 UTC; with the 3 hour reporting lag the
/// hour cutoff is 10.
fn monday_afternoon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 18, 13, 0, 0).unwrap()
}

fn anomalous_ads() -> FakeAds {
    // Baseline: four Mondays at 1000 impressions / 50.00 each.
    let past = (0..4).map(|_| row(8, 1000.0, 50_000_000.0)).collect();
    // Today: impressions down, cost up.
    let today = vec![row(9, 650.0, 65_000_000.0)];
    FakeAds::new(today, past)
}

#[tokio::test]
async fn test_impressions_and_cost_alerts_end_to_end() {
    let ads = anomalous_ads();
    let sheets = FakeSheets::with_default_thresholds();
    let mailer = FakeMailer::default();
    let config = test_config();

    let outcome = process_account(
        &ads,
        &sheets,
        Some(&mailer),
        &config,
        ACCOUNT_ID,
        monday_afternoon(),
    )
    .await
    .unwrap();

    assert!(outcome.evaluated);
    assert_eq!(outcome.alerts.len(), 2);
    assert_eq!(
        outcome.alerts[0],
        "    Impressions are too low: 650 impressions by 10:00, expecting at least 700"
    );
    assert_eq!(
        outcome.alerts[1],
        "    Cost is too high: 65.00 EUR by 10:00, expecting at most 60.00"
    );

    // Markers set for the two firing metrics only.
    assert_eq!(
        sheets.cell(SheetField::ImpressionsAlert).as_deref(),
        Some("Alerting 10:00")
    );
    assert_eq!(
        sheets.cell(SheetField::CostAlert).as_deref(),
        Some("Alerting 10:00")
    );
    assert!(sheets.cell(SheetField::ClicksAlert).is_none());
    assert!(sheets.cell(SheetField::ConversionsAlert).is_none());

    // One combined email.
    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (to, subject, body) = &sent[0];
    assert_eq!(to, "ops@example.com");
    assert_eq!(
        subject,
        "Google Ads Account Acme Retail (123-123-1234) misbehaved."
    );
    assert!(body.contains("Impressions are too low"));
    assert!(body.contains("Cost is too high"));
    assert!(body.contains("https://docs.google.com/spreadsheets/d/test123/edit"));
    drop(sent);

    // Bookkeeping and the today-vs-baseline table.
    assert_eq!(sheets.cell(SheetField::AccountId).as_deref(), Some(ACCOUNT_ID));
    assert_eq!(sheets.cell(SheetField::AccountName).as_deref(), Some("Acme Retail"));
    assert!(sheets.cell(SheetField::RunDate).is_some());
    assert_eq!(
        sheets.cell(SheetField::DataTable).as_deref(),
        Some("650|1000;0|0.0;0.0|0.0;65.00|50.00")
    );

    // Baseline query covers the same weekday over the lookback window.
    let queries = ads.queries.lock().unwrap();
    assert_eq!(queries.len(), 2);
    assert!(queries[0].contains("BETWEEN \"2024-03-18\" AND \"2024-03-18\""));
    assert!(queries[1].contains("segments.day_of_week=\"MONDAY\""));
    assert!(queries[1].contains("BETWEEN \"2024-02-18\" AND \"2024-03-17\""));
}

#[tokio::test]
async fn test_second_run_same_day_does_not_realert() {
    let ads = anomalous_ads();
    let sheets = FakeSheets::with_default_thresholds();
    let mailer = FakeMailer::default();
    let config = test_config();

    let first = process_account(&ads, &sheets, Some(&mailer), &config, ACCOUNT_ID, monday_afternoon())
        .await
        .unwrap();
    assert_eq!(first.alerts.len(), 2);

    // An hour later the condition still holds, but markers are set.
    let later = monday_afternoon() + chrono::Duration::hours(1);
    let second = process_account(&ads, &sheets, Some(&mailer), &config, ACCOUNT_ID, later)
        .await
        .unwrap();

    assert!(second.evaluated);
    assert!(second.alerts.is_empty());
    assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    // The marker keeps its original hour.
    assert_eq!(
        sheets.cell(SheetField::ImpressionsAlert).as_deref(),
        Some("Alerting 10:00")
    );
}

#[tokio::test]
async fn test_first_run_of_day_clears_all_markers() {
    let ads = FakeAds::new(vec![], vec![]);
    let sheets = FakeSheets::with_default_thresholds();
    let mailer = FakeMailer::default();
    let config = test_config();

    sheets.seed(SheetField::ImpressionsAlert, "Alerting 22:00");
    sheets.seed(SheetField::ClicksAlert, "stale");
    sheets.seed(SheetField::ConversionsAlert, "stale");
    sheets.seed(SheetField::CostAlert, "Alerting 23:00");

    // 04:30 UTC minus the 3 hour lag puts the cutoff in hour bucket 1.
    let early = Utc.with_ymd_and_hms(2024, 3, 18, 4, 30, 0).unwrap();
    let outcome = process_account(&ads, &sheets, Some(&mailer), &config, ACCOUNT_ID, early)
        .await
        .unwrap();

    assert!(sheets.cell(SheetField::ImpressionsAlert).is_none());
    assert!(sheets.cell(SheetField::ClicksAlert).is_none());
    assert!(sheets.cell(SheetField::ConversionsAlert).is_none());
    assert!(sheets.cell(SheetField::CostAlert).is_none());

    // No rows came back, so evaluation was skipped but bookkeeping ran.
    assert!(!outcome.evaluated);
    assert!(outcome.alerts.is_empty());
    assert!(sheets.cell(SheetField::RunDate).is_some());
    assert!(sheets.cell(SheetField::DataTable).is_none());
    assert!(mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_baseline_skips_evaluation() {
    let ads = FakeAds::new(vec![row(9, 650.0, 65_000_000.0)], vec![]);
    let sheets = FakeSheets::with_default_thresholds();
    let mailer = FakeMailer::default();
    let config = test_config();

    let outcome = process_account(&ads, &sheets, Some(&mailer), &config, ACCOUNT_ID, monday_afternoon())
        .await
        .unwrap();

    assert!(!outcome.evaluated);
    assert!(outcome.alerts.is_empty());
    assert!(sheets.cell(SheetField::ImpressionsAlert).is_none());
    assert!(mailer.sent.lock().unwrap().is_empty());
    assert!(sheets.cell(SheetField::RunDate).is_some());
}

#[tokio::test]
async fn test_placeholder_email_fails_before_any_query() {
    let ads = anomalous_ads();
    let sheets = FakeSheets::with_default_thresholds();
    let mailer = FakeMailer::default();
    let config = test_config();

    sheets.seed(SheetField::NotifyEmail, "foo@example.com");

    let err = process_account(&ads, &sheets, Some(&mailer), &config, ACCOUNT_ID, monday_afternoon())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("custom email address"));
    assert!(ads.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_new_account_sheet_is_cloned_once() {
    let ads = anomalous_ads();
    let sheets = FakeSheets::with_default_thresholds();
    let mailer = FakeMailer::default();
    let config = test_config();

    sheets.sheets.lock().unwrap().retain(|title| title != ACCOUNT_ID);

    process_account(&ads, &sheets, Some(&mailer), &config, ACCOUNT_ID, monday_afternoon())
        .await
        .unwrap();
    process_account(&ads, &sheets, Some(&mailer), &config, ACCOUNT_ID, monday_afternoon())
        .await
        .unwrap();

    let duplications = sheets.duplications.lock().unwrap();
    assert_eq!(
        duplications.as_slice(),
        &[("templateSheet".to_string(), ACCOUNT_ID.to_string())]
    );
}

#[tokio::test]
async fn test_empty_account_list_enumerates_managed_accounts() {
    // Manager-level fake: enumeration returns two clients, the first of
    // which does not resolve.
    struct ManagedAds {
        inner: FakeAds,
    }

    impl AdsApi for ManagedAds {
        async fn search_rows(&self, customer_id: &str, gaql: &str) -> Result<Vec<AdRow>> {
            self.inner.search_rows(customer_id, gaql).await
        }
        async fn account_info(&self, customer_id: &str) -> Result<AccountInfo> {
            if customer_id == "999-999-9999" {
                anyhow::bail!("no such account: {customer_id}");
            }
            self.inner.account_info(customer_id).await
        }
        async fn list_client_accounts(&self) -> Result<Vec<String>> {
            Ok(vec!["999-999-9999".to_string(), ACCOUNT_ID.to_string()])
        }
    }

    let ads = ManagedAds {
        inner: anomalous_ads(),
    };
    let sheets = FakeSheets::with_default_thresholds();
    let mailer = FakeMailer::default();
    let config = test_config();
    assert!(config.accounts.ids.is_empty());

    let rows = run_accounts(&ads, &sheets, Some(&mailer), &config, monday_afternoon(), false)
        .await
        .unwrap();

    // One summary row per enumerated account; the broken account does
    // not stop the healthy one.
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].account, "999-999-9999");
    assert!(rows[0].status.starts_with("failed:"));
    assert!(rows[0].status.contains("no such account"));
    assert_eq!(rows[1].account, ACCOUNT_ID);
    assert_eq!(rows[1].status, "checked");
    assert_eq!(rows[1].alerts, "2");
}

#[tokio::test]
async fn test_configured_account_list_skips_enumeration() {
    struct NoEnumAds {
        inner: FakeAds,
    }

    impl AdsApi for NoEnumAds {
        async fn search_rows(&self, customer_id: &str, gaql: &str) -> Result<Vec<AdRow>> {
            self.inner.search_rows(customer_id, gaql).await
        }
        async fn account_info(&self, customer_id: &str) -> Result<AccountInfo> {
            self.inner.account_info(customer_id).await
        }
        async fn list_client_accounts(&self) -> Result<Vec<String>> {
            anyhow::bail!("enumeration must not run for an explicit account list")
        }
    }

    let ads = NoEnumAds {
        inner: anomalous_ads(),
    };
    let sheets = FakeSheets::with_default_thresholds();
    let mailer = FakeMailer::default();
    let mut config = test_config();
    config.accounts.ids = vec![ACCOUNT_ID.to_string()];

    let rows = run_accounts(&ads, &sheets, Some(&mailer), &config, monday_afternoon(), false)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].account, ACCOUNT_ID);
    assert_eq!(rows[0].status, "checked");
}

#[tokio::test]
async fn test_account_failures_are_isolated() {
    struct FailingAds;

    impl AdsApi for FailingAds {
        async fn search_rows(&self, _customer_id: &str, _gaql: &str) -> Result<Vec<AdRow>> {
            anyhow::bail!("query engine unavailable")
        }
        async fn account_info(&self, customer_id: &str) -> Result<AccountInfo> {
            anyhow::bail!("no such account: {customer_id}")
        }
        async fn list_client_accounts(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }
    }

    let sheets = FakeSheets::with_default_thresholds();
    let mailer = FakeMailer::default();
    let config = test_config();

    let failed = process_account(
        &FailingAds,
        &sheets,
        Some(&mailer),
        &config,
        "999-999-9999",
        monday_afternoon(),
    )
    .await;
    assert!(failed.is_err());

    // A healthy account still goes through on the same stores.
    let ads = anomalous_ads();
    let outcome = process_account(&ads, &sheets, Some(&mailer), &config, ACCOUNT_ID, monday_afternoon())
        .await
        .unwrap();
    assert!(outcome.evaluated);
}
