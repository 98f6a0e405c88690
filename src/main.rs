//! Sheet Price Sync - updates card prices in a Google Sheets collection tracker
//!
//! Runs once over the whole sheet and exits non-zero on the first error.

use clap::Parser;
use sheet_price_sync::config::{
    CHANNEL_BURST, DEFAULT_TIMEOUT_SECS, SCRYFALL_INTERVAL, SHEETS_INTERVAL, USER_AGENT,
};
use sheet_price_sync::{
    auth, RateLimitedClient, RateLimiter, Result, ScryfallClient, SheetsClient,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Update Scryfall prices in a Google Sheets card collection
#[derive(Parser, Debug)]
#[command(name = "sheet_price_sync")]
#[command(version, about, long_about = None)]
struct Args {
    /// Spreadsheet key: the KEY in docs.google.com/spreadsheets/d/KEY/edit
    #[arg(long)]
    sheetkey: String,

    /// Sheet to operate on (default: the first sheet)
    #[arg(long, default_value = "")]
    sheetname: String,

    /// Path of the Google OAuth client credentials JSON file
    #[arg(long, default_value = "creds.json")]
    creds: PathBuf,

    /// Path of the OAuth token file
    #[arg(long, default_value = "token.json")]
    token: PathBuf,

    /// Auth code, if needed to obtain an OAuth token
    #[arg(long)]
    authcode: Option<String>,

    /// Per-request timeout in seconds, including time spent waiting for the rate limiter
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=sheet_price_sync=debug
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting sheet_price_sync...");

    if let Err(e) = run(args).await {
        log::error!("Sync failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let timeout = Duration::from_secs(args.timeout_secs);
    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?;

    let access_token =
        auth::authorize(&http, &args.creds, &args.token, args.authcode.as_deref()).await?;

    // One limiter per remote service; they never share state.
    let card_limiter = Arc::new(RateLimiter::new(SCRYFALL_INTERVAL, CHANNEL_BURST));
    let sheet_limiter = Arc::new(RateLimiter::new(SHEETS_INTERVAL, CHANNEL_BURST));

    let scryfall = ScryfallClient::new(
        RateLimitedClient::new(card_limiter, Some(http.clone())).with_timeout(timeout),
    );
    let sheet = SheetsClient::new(
        RateLimitedClient::new(sheet_limiter, Some(http)).with_timeout(timeout),
        access_token,
        args.sheetkey,
        args.sheetname,
    );

    log::info!(
        "Updating sheet {:?}",
        if sheet.sheet_name().is_empty() {
            "(first sheet)"
        } else {
            sheet.sheet_name()
        }
    );
    sheet_price_sync::run(&sheet, &scryfall, chrono::Utc::now()).await?;
    log::info!("Sync completed successfully.");
    Ok(())
}
