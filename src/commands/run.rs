use crate::ads::{AdsApi, GoogleAdsClient};
use crate::alerts::{Mailer, SmtpMailer};
use crate::config::Config;
use crate::output::{AccountRunRow, OutputFormat};
use crate::pipeline::process_account;
use crate::sheets::client::SheetStore;
use crate::sheets::SheetsClient;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

/// Driver loop: enumerate the accounts to process (the configured list,
/// or every managed account when it is empty) and run each one
/// independently. A failing account is reported and does not stop the
/// rest; every account still gets a summary row.
pub async fn run_accounts<A, S, M>(
    ads: &A,
    sheets: &S,
    mailer: Option<&M>,
    config: &Config,
    now_utc: DateTime<Utc>,
    verbose: bool,
) -> Result<Vec<AccountRunRow>>
where
    A: AdsApi,
    S: SheetStore,
    M: Mailer,
{
    let account_ids = if config.accounts.ids.is_empty() {
        ads.list_client_accounts()
            .await
            .context("Failed to enumerate managed accounts")?
    } else {
        config.accounts.ids.clone()
    };

    if verbose && !account_ids.is_empty() {
        println!("Accounts to process: {}", account_ids.join(", "));
    }

    let mut rows = Vec::with_capacity(account_ids.len());
    for account_id in &account_ids {
        match process_account(ads, sheets, mailer, config, account_id, now_utc).await {
            Ok(outcome) => rows.push(AccountRunRow::from_outcome(&outcome)),
            Err(e) => {
                eprintln!("Error: account {account_id}: {e:#}");
                rows.push(AccountRunRow::failed(account_id, &e));
            }
        }
    }

    Ok(rows)
}

/// Process every configured account (or every managed account when the
/// configured list is empty).
pub async fn handle_run_command(config: &Config, json_output: bool, verbose: bool) -> Result<()> {
    config.validate()?;

    let ads = GoogleAdsClient::new(config)?;
    let sheets = SheetsClient::new(config)?;
    let mailer = config
        .email
        .as_ref()
        .map(SmtpMailer::from_config)
        .transpose()?;

    let rows = run_accounts(&ads, &sheets, mailer.as_ref(), config, Utc::now(), verbose).await?;

    if rows.is_empty() {
        if json_output {
            println!(r#"{{"status": "success", "message": "No accounts to process"}}"#);
        } else {
            println!("No accounts to process.");
        }
        return Ok(());
    }

    if json_output {
        println!("{}", rows.to_json()?);
    } else {
        println!("{}", rows.to_table());
    }

    Ok(())
}
