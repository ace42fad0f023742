use crate::ads::query::{self, normalize_customer_id};
use crate::config::Config;
use crate::models::{AccountInfo, AdRow};
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;

const ADS_API_BASE: &str = "https://googleads.googleapis.com";

/// Read-only access to the Google Ads reporting API.
///
/// The pipeline is generic over this trait so tests can run against an
/// in-memory implementation instead of the network.
pub trait AdsApi {
    /// Run a GAQL report query and return the hour-segmented rows.
    async fn search_rows(&self, customer_id: &str, gaql: &str) -> Result<Vec<AdRow>>;

    /// Fetch name, currency and time zone for one account.
    async fn account_info(&self, customer_id: &str) -> Result<AccountInfo>;

    /// Enumerate client account ids under the configured manager account.
    async fn list_client_accounts(&self) -> Result<Vec<String>>;
}

/// REST client for `googleAds:search`, paged.
pub struct GoogleAdsClient {
    client: reqwest::Client,
    api_version: String,
    developer_token: String,
    access_token: String,
    login_customer_id: String,
}

impl GoogleAdsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("adwatch/0.1.0")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_version: config.ads.api_version.clone(),
            developer_token: config.auth.developer_token.clone(),
            access_token: config.auth.access_token.clone(),
            login_customer_id: normalize_customer_id(&config.auth.login_customer_id),
        })
    }

    async fn search(&self, customer_id: &str, gaql: &str) -> Result<Vec<SearchRow>> {
        let customer_id = normalize_customer_id(customer_id);
        let url = format!(
            "{ADS_API_BASE}/{}/customers/{}/googleAds:search",
            self.api_version, customer_id
        );

        let mut rows = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut body = serde_json::json!({ "query": gaql });
            if let Some(token) = &page_token {
                body["pageToken"] = Value::String(token.clone());
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.access_token)
                .header("developer-token", &self.developer_token)
                .header("login-customer-id", &self.login_customer_id)
                .json(&body)
                .send()
                .await
                .with_context(|| format!("Google Ads request for account {customer_id} failed"))?;

            if !response.status().is_success() {
                let status = response.status();
                let detail = response.text().await.unwrap_or_default();
                anyhow::bail!("Google Ads query for account {customer_id} failed with {status}: {detail}");
            }

            let page: SearchResponse = response
                .json()
                .await
                .context("Failed to decode Google Ads search response")?;
            rows.extend(page.results);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(rows)
    }
}

impl AdsApi for GoogleAdsClient {
    async fn search_rows(&self, customer_id: &str, gaql: &str) -> Result<Vec<AdRow>> {
        let rows = self.search(customer_id, gaql).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                // Rows without an hour segment carry no usable data.
                let hour = row.segments.hour? as u32;
                Some(AdRow {
                    hour,
                    impressions: row.metrics.impressions.unwrap_or(0.0),
                    clicks: row.metrics.clicks.unwrap_or(0.0),
                    conversions: row.metrics.conversions.unwrap_or(0.0),
                    cost_micros: row.metrics.cost_micros.unwrap_or(0.0),
                })
            })
            .collect())
    }

    async fn account_info(&self, customer_id: &str) -> Result<AccountInfo> {
        let rows = self.search(customer_id, query::ACCOUNT_INFO_QUERY).await?;
        let row = rows
            .into_iter()
            .next()
            .with_context(|| format!("Customer query for account {customer_id} returned no rows"))?;

        Ok(AccountInfo {
            id: customer_id.to_string(),
            name: row.customer.descriptive_name.unwrap_or_default(),
            currency_code: row.customer.currency_code.unwrap_or_else(|| "USD".to_string()),
            time_zone: row
                .customer
                .time_zone
                .with_context(|| format!("Account {customer_id} has no time zone"))?,
        })
    }

    async fn list_client_accounts(&self) -> Result<Vec<String>> {
        let rows = self
            .search(&self.login_customer_id, query::CLIENT_ACCOUNTS_QUERY)
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.customer_client.id)
            .collect())
    }
}

// The REST API encodes proto int64 fields as JSON strings, so every
// numeric field is decoded through a string-or-number helper.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SearchResponse {
    results: Vec<SearchRow>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SearchRow {
    segments: Segments,
    metrics: Metrics,
    customer: Customer,
    customer_client: CustomerClient,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Segments {
    #[serde(deserialize_with = "flex_f64")]
    hour: Option<f64>,
    #[allow(dead_code)]
    day_of_week: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Metrics {
    #[serde(deserialize_with = "flex_f64")]
    clicks: Option<f64>,
    #[serde(deserialize_with = "flex_f64")]
    impressions: Option<f64>,
    #[serde(deserialize_with = "flex_f64")]
    conversions: Option<f64>,
    #[serde(deserialize_with = "flex_f64")]
    cost_micros: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Customer {
    descriptive_name: Option<String>,
    currency_code: Option<String>,
    time_zone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CustomerClient {
    #[serde(deserialize_with = "flex_string")]
    id: Option<String>,
    #[allow(dead_code)]
    descriptive_name: Option<String>,
}

fn flex_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a number or numeric string, got {other}"
        ))),
    }
}

fn flex_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_search_response_with_string_int64() {
        let json = r#"{
            "results": [
                {
                    "segments": {"hour": 5, "dayOfWeek": "MONDAY"},
                    "metrics": {
                        "clicks": "12",
                        "impressions": "345",
                        "conversions": 1.5,
                        "costMicros": "2500000"
                    }
                }
            ],
            "nextPageToken": "abc"
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.next_page_token.as_deref(), Some("abc"));

        let row = &response.results[0];
        assert_eq!(row.segments.hour, Some(5.0));
        assert_eq!(row.metrics.clicks, Some(12.0));
        assert_eq!(row.metrics.impressions, Some(345.0));
        assert_eq!(row.metrics.conversions, Some(1.5));
        assert_eq!(row.metrics.cost_micros, Some(2_500_000.0));
    }

    #[test]
    fn test_decode_customer_client_numeric_id() {
        let json = r#"{
            "results": [
                {"customerClient": {"id": 1234567890, "descriptiveName": "Client A"}},
                {"customerClient": {"id": "456", "descriptiveName": "Client B"}}
            ]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results[0].customer_client.id.as_deref(), Some("1234567890"));
        assert_eq!(response.results[1].customer_client.id.as_deref(), Some("456"));
    }

    #[test]
    fn test_decode_empty_response() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.results.is_empty());
        assert!(response.next_page_token.is_none());
    }
}
