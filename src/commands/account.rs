use crate::ads::GoogleAdsClient;
use crate::alerts::SmtpMailer;
use crate::config::Config;
use crate::output::{AccountRunRow, OutputFormat};
use crate::pipeline::process_account;
use crate::sheets::SheetsClient;
use anyhow::Result;
use chrono::Utc;

/// Process a single account. Unlike the full run, a failure here
/// propagates so the exit code reflects it.
pub async fn handle_account_command(
    config: &Config,
    customer_id: &str,
    json_output: bool,
) -> Result<()> {
    config.validate()?;

    let ads = GoogleAdsClient::new(config)?;
    let sheets = SheetsClient::new(config)?;
    let mailer = config
        .email
        .as_ref()
        .map(SmtpMailer::from_config)
        .transpose()?;

    let outcome =
        process_account(&ads, &sheets, mailer.as_ref(), config, customer_id, Utc::now()).await?;

    let rows = vec![AccountRunRow::from_outcome(&outcome)];
    if json_output {
        println!("{}", rows.to_json()?);
    } else {
        println!("{}", rows.to_table());
    }

    Ok(())
}
