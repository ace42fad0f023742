use crate::pipeline::RunOutcome;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Trait for items that can be displayed as tables or JSON
pub trait OutputFormat {
    fn to_table(&self) -> String;
    fn to_json(&self) -> Result<String, serde_json::Error>;
}

/// Row for the end-of-run account summary table
#[derive(Tabled, Serialize, Debug)]
pub struct AccountRunRow {
    #[tabled(rename = "Account")]
    pub account: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Alerts")]
    pub alerts: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl AccountRunRow {
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        Self {
            account: outcome.account_id.clone(),
            name: outcome.account_name.clone(),
            alerts: outcome.alerts.len().to_string(),
            status: if outcome.evaluated {
                "checked".to_string()
            } else {
                "no data".to_string()
            },
        }
    }

    pub fn failed(account_id: &str, error: &anyhow::Error) -> Self {
        Self {
            account: account_id.to_string(),
            name: String::new(),
            alerts: "-".to_string(),
            status: format!("failed: {error:#}"),
        }
    }
}

impl OutputFormat for Vec<AccountRunRow> {
    fn to_table(&self) -> String {
        if self.is_empty() {
            return "No accounts processed.".to_string();
        }
        Table::new(self).to_string()
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
