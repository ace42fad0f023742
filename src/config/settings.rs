use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default value shipped in the config template; refuses to run until
/// replaced with the real dashboard spreadsheet.
pub const PLACEHOLDER_SPREADSHEET_URL: &str = "YOUR_SPREADSHEET_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub auth: AuthConfig,
    pub ads: AdsConfig,
    pub spreadsheet: SpreadsheetConfig,
    pub accounts: AccountsConfig,
    pub email: Option<EmailConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub developer_token: String,
    pub access_token: String,
    /// Manager (MCC) account the credentials are scoped to.
    pub login_customer_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdsConfig {
    pub api_version: String,
    /// Basic reporting stats lag behind real time by about this much.
    pub report_lag_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadsheetConfig {
    pub url: String,
    pub template_sheet: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// Customer ids to process; empty means every enabled client
    /// account under the manager.
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_relay: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth: AuthConfig::default(),
            ads: AdsConfig {
                api_version: "v16".to_string(),
                report_lag_hours: 3,
            },
            spreadsheet: SpreadsheetConfig {
                url: PLACEHOLDER_SPREADSHEET_URL.to_string(),
                template_sheet: "templateSheet".to_string(),
            },
            accounts: AccountsConfig::default(),
            email: None,
        }
    }
}

impl SpreadsheetConfig {
    /// Extract the document id from a full Sheets URL; a bare id (no
    /// slashes) is also accepted.
    pub fn spreadsheet_id(&self) -> Result<String> {
        let id = match self.url.split_once("/d/") {
            Some((_, rest)) => rest.split(['/', '?', '#']).next().unwrap_or(""),
            None if !self.url.contains('/') => self.url.as_str(),
            None => "",
        };

        if id.is_empty() {
            anyhow::bail!("Unrecognized spreadsheet URL: {}", self.url);
        }
        Ok(id.to_string())
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::default_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = self.to_commented_toml()?;

        fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home.join(".config").join("adwatch").join("config.toml"))
    }

    /// Checks that must pass before any account run is attempted.
    /// Per-account settings (thresholds, notify address) live in the
    /// spreadsheet and are validated per sheet instead.
    pub fn validate(&self) -> Result<()> {
        if self.spreadsheet.url == PLACEHOLDER_SPREADSHEET_URL {
            anyhow::bail!(
                "Please specify a valid spreadsheet URL in spreadsheet.url. \
                 Copy the dashboard template and paste its URL into the config."
            );
        }
        self.spreadsheet.spreadsheet_id()?;

        if self.auth.developer_token.is_empty() {
            anyhow::bail!("auth.developer_token is not set");
        }
        if self.auth.access_token.is_empty() {
            anyhow::bail!("auth.access_token is not set");
        }
        if self.auth.login_customer_id.is_empty() {
            anyhow::bail!("auth.login_customer_id is not set");
        }
        if !(0..24).contains(&self.ads.report_lag_hours) {
            anyhow::bail!("ads.report_lag_hours must be between 0 and 23");
        }
        Ok(())
    }

    /// Generate TOML configuration with comments explaining all options
    pub fn to_commented_toml(&self) -> Result<String> {
        let mut output = String::new();

        output.push_str("# adwatch Configuration File\n");
        output.push_str("# Google Ads Account Anomaly Watcher - Configuration Options\n");
        output.push_str("#\n");
        output.push_str("# Per-account thresholds, the lookback window and the notification\n");
        output.push_str("# address live in the dashboard spreadsheet, not in this file.\n");
        output.push_str("\n");

        output.push_str("[auth]\n");
        output.push_str("# Google Ads API developer token\n");
        output.push_str(&format!("developer_token = \"{}\"\n", self.auth.developer_token));
        output.push_str("# OAuth2 access token with Ads and Sheets scopes\n");
        output.push_str(&format!("access_token = \"{}\"\n", self.auth.access_token));
        output.push_str("# Manager (MCC) account the token is scoped to, e.g. 123-456-7890\n");
        output.push_str(&format!("login_customer_id = \"{}\"\n", self.auth.login_customer_id));
        output.push_str("\n");

        output.push_str("[ads]\n");
        output.push_str("# Google Ads API version used for report queries\n");
        output.push_str(&format!("api_version = \"{}\"\n", self.ads.api_version));
        output.push_str("# Reporting stats are usually complete with no more than this delay;\n");
        output.push_str("# the hour cutoff for today's window is now minus this many hours\n");
        output.push_str(&format!("report_lag_hours = {}\n", self.ads.report_lag_hours));
        output.push_str("\n");

        output.push_str("[spreadsheet]\n");
        output.push_str("# URL of your copy of the dashboard template spreadsheet\n");
        output.push_str(&format!("url = \"{}\"\n", self.spreadsheet.url));
        output.push_str("# Sheet cloned for each account on its first run\n");
        output.push_str(&format!("template_sheet = \"{}\"\n", self.spreadsheet.template_sheet));
        output.push_str("\n");

        output.push_str("[accounts]\n");
        output.push_str("# Customer ids to process, e.g. [\"123-123-1234\", \"456-456-4567\"]\n");
        output.push_str("# Leave empty to process every enabled client account under the manager\n");
        let ids = self
            .accounts
            .ids
            .iter()
            .map(|id| format!("\"{id}\""))
            .collect::<Vec<_>>()
            .join(", ");
        output.push_str(&format!("ids = [{ids}]\n"));
        output.push_str("\n");

        match &self.email {
            Some(email) => {
                output.push_str("[email]\n");
                output.push_str("# SMTP settings used to deliver alert emails\n");
                output.push_str(&format!("smtp_relay = \"{}\"\n", email.smtp_relay));
                output.push_str(&format!("smtp_username = \"{}\"\n", email.smtp_username));
                output.push_str(&format!("smtp_password = \"{}\"\n", email.smtp_password));
                output.push_str(&format!("from = \"{}\"\n", email.from));
            }
            None => {
                output.push_str("# Uncomment to deliver alert emails over SMTP. Without this\n");
                output.push_str("# section alerts are still recorded in the spreadsheet.\n");
                output.push_str("# [email]\n");
                output.push_str("# smtp_relay = \"smtp.example.com\"\n");
                output.push_str("# smtp_username = \"alerts@example.com\"\n");
                output.push_str("# smtp_password = \"...\"\n");
                output.push_str("# from = \"adwatch <alerts@example.com>\"\n");
            }
        }

        Ok(output)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "auth.developer_token" => self.auth.developer_token = value.to_string(),
            "auth.access_token" => self.auth.access_token = value.to_string(),
            "auth.login_customer_id" => self.auth.login_customer_id = value.to_string(),
            "ads.api_version" => self.ads.api_version = value.to_string(),
            "ads.report_lag_hours" => {
                let hours: i64 = value
                    .parse()
                    .with_context(|| format!("Invalid hours value: {}", value))?;
                if !(0..24).contains(&hours) {
                    anyhow::bail!("Report lag must be between 0 and 23 hours");
                }
                self.ads.report_lag_hours = hours;
            }
            "spreadsheet.url" => self.spreadsheet.url = value.to_string(),
            "spreadsheet.template_sheet" => self.spreadsheet.template_sheet = value.to_string(),
            "accounts.ids" => {
                self.accounts.ids = value
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "email.smtp_relay" => {
                self.email.get_or_insert_with(EmailConfig::default).smtp_relay = value.to_string();
            }
            "email.smtp_username" => {
                self.email.get_or_insert_with(EmailConfig::default).smtp_username =
                    value.to_string();
            }
            "email.smtp_password" => {
                self.email.get_or_insert_with(EmailConfig::default).smtp_password =
                    value.to_string();
            }
            "email.from" => {
                self.email.get_or_insert_with(EmailConfig::default).from = value.to_string();
            }
            _ => anyhow::bail!("Unknown configuration key: {}", key),
        }
        Ok(())
    }
}
