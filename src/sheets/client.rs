use crate::config::Config;
use crate::sheets::ranges::NamedRange;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Access to the shared dashboard spreadsheet.
///
/// The spreadsheet is the source of truth for per-account thresholds
/// and alert state, so nothing read through this trait is cached.
pub trait SheetStore {
    async fn sheet_exists(&self, title: &str) -> Result<bool>;

    /// Clone the template sheet under a new title.
    async fn duplicate_sheet(&self, source_title: &str, new_title: &str) -> Result<()>;

    /// Named ranges whose grid range lives on the given sheet.
    async fn named_ranges(&self, title: &str) -> Result<Vec<NamedRange>>;

    async fn read_cell(&self, title: &str, a1: &str) -> Result<Option<String>>;
    async fn write_cell(&self, title: &str, a1: &str, value: &str) -> Result<()>;
    async fn write_matrix(&self, title: &str, a1: &str, values: &[Vec<String>]) -> Result<()>;
    async fn clear_cell(&self, title: &str, a1: &str) -> Result<()>;
}

/// REST client for the Sheets v4 API.
pub struct SheetsClient {
    client: reqwest::Client,
    spreadsheet_id: String,
    access_token: String,
}

impl SheetsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("adwatch/0.1.0")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            spreadsheet_id: config.spreadsheet.spreadsheet_id()?,
            access_token: config.auth.access_token.clone(),
        })
    }

    fn values_url(&self, title: &str, a1: &str) -> String {
        format!(
            "{SHEETS_API_BASE}/{}/values/{}",
            self.spreadsheet_id,
            full_range(title, a1)
        )
    }

    async fn metadata(&self) -> Result<SpreadsheetMeta> {
        let url = format!(
            "{SHEETS_API_BASE}/{}?fields=sheets.properties,namedRanges",
            self.spreadsheet_id
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .context("Spreadsheet metadata request failed")?;
        let response = ensure_ok(response, "Spreadsheet metadata request").await?;
        response
            .json()
            .await
            .context("Failed to decode spreadsheet metadata")
    }

    async fn sheet_id(&self, title: &str) -> Result<i64> {
        let meta = self.metadata().await?;
        meta.sheets
            .iter()
            .find(|sheet| sheet.properties.title == title)
            .map(|sheet| sheet.properties.sheet_id)
            .with_context(|| format!("No sheet named {title} in the spreadsheet"))
    }
}

impl SheetStore for SheetsClient {
    async fn sheet_exists(&self, title: &str) -> Result<bool> {
        let meta = self.metadata().await?;
        Ok(meta
            .sheets
            .iter()
            .any(|sheet| sheet.properties.title == title))
    }

    async fn duplicate_sheet(&self, source_title: &str, new_title: &str) -> Result<()> {
        let source_sheet_id = self.sheet_id(source_title).await?;
        let url = format!("{SHEETS_API_BASE}/{}:batchUpdate", self.spreadsheet_id);
        let body = serde_json::json!({
            "requests": [{
                "duplicateSheet": {
                    "sourceSheetId": source_sheet_id,
                    "insertSheetIndex": 1,
                    "newSheetName": new_title,
                }
            }]
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .context("Sheet duplication request failed")?;
        ensure_ok(response, "Sheet duplication").await?;
        Ok(())
    }

    async fn named_ranges(&self, title: &str) -> Result<Vec<NamedRange>> {
        let meta = self.metadata().await?;
        let sheet_id = meta
            .sheets
            .iter()
            .find(|sheet| sheet.properties.title == title)
            .map(|sheet| sheet.properties.sheet_id)
            .with_context(|| format!("No sheet named {title} in the spreadsheet"))?;

        meta.named_ranges
            .iter()
            .filter(|range| range.range.sheet_id.unwrap_or(0) == sheet_id)
            .map(|range| {
                Ok(NamedRange {
                    name: range.name.clone(),
                    a1: grid_to_a1(&range.range)
                        .with_context(|| format!("Named range {} is unbounded", range.name))?,
                })
            })
            .collect()
    }

    async fn read_cell(&self, title: &str, a1: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.values_url(title, a1))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .context("Cell read request failed")?;
        let response = ensure_ok(response, "Cell read").await?;

        let values: ValueRange = response.json().await.context("Failed to decode cell value")?;
        Ok(values
            .values
            .into_iter()
            .flatten()
            .next()
            .filter(|value| !value.is_empty()))
    }

    async fn write_cell(&self, title: &str, a1: &str, value: &str) -> Result<()> {
        self.write_matrix(title, a1, &[vec![value.to_string()]]).await
    }

    async fn write_matrix(&self, title: &str, a1: &str, values: &[Vec<String>]) -> Result<()> {
        let url = format!(
            "{}?valueInputOption=USER_ENTERED",
            self.values_url(title, a1)
        );
        let body = serde_json::json!({ "values": values });

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .context("Cell write request failed")?;
        ensure_ok(response, "Cell write").await?;
        Ok(())
    }

    async fn clear_cell(&self, title: &str, a1: &str) -> Result<()> {
        let url = format!("{}:clear", self.values_url(title, a1));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .context("Cell clear request failed")?;
        ensure_ok(response, "Cell clear").await?;
        Ok(())
    }
}

async fn ensure_ok(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let detail = response.text().await.unwrap_or_default();
    anyhow::bail!("{what} failed with {status}: {detail}")
}

/// Sheet titles are quoted so account names with spaces stay one range.
fn full_range(title: &str, a1: &str) -> String {
    format!("'{}'!{}", title.replace('\'', "''"), a1)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SpreadsheetMeta {
    sheets: Vec<Sheet>,
    named_ranges: Vec<ApiNamedRange>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiNamedRange {
    name: String,
    range: GridRange,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GridRange {
    sheet_id: Option<i64>,
    start_row_index: Option<i64>,
    end_row_index: Option<i64>,
    start_column_index: Option<i64>,
    end_column_index: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ValueRange {
    values: Vec<Vec<String>>,
}

/// Convert a half-open grid range from the metadata response into A1
/// notation, collapsing single cells to a bare coordinate.
fn grid_to_a1(range: &GridRange) -> Result<String> {
    let start_row = range.start_row_index.context("missing start row")?;
    let start_col = range.start_column_index.context("missing start column")?;
    let end_row = range.end_row_index.unwrap_or(start_row + 1);
    let end_col = range.end_column_index.unwrap_or(start_col + 1);

    let start = format!("{}{}", column_letters(start_col), start_row + 1);
    if end_row - start_row <= 1 && end_col - start_col <= 1 {
        Ok(start)
    } else {
        Ok(format!("{start}:{}{end_row}", column_letters(end_col - 1)))
    }
}

fn column_letters(index: i64) -> String {
    let mut n = index + 1;
    let mut letters = String::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.insert(0, (b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters
}
