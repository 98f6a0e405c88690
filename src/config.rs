//! Fixed endpoints and limits

use std::time::Duration;

/// Scryfall API root
pub const SCRYFALL_BASE_URL: &str = "https://api.scryfall.com";

/// Exact-name card lookup, relative to [`SCRYFALL_BASE_URL`]
pub const NAMED_CARD_PATH: &str = "/cards/named";

/// Google Sheets API root
pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

/// OAuth scope needed to read and write spreadsheet values
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Scryfall asks for no more than ten requests per second.
pub const SCRYFALL_INTERVAL: Duration = Duration::from_millis(100);

/// Google Sheets quota is roughly one request per second per user.
pub const SHEETS_INTERVAL: Duration = Duration::from_secs(1);

/// Burst size for both channels
pub const CHANNEL_BURST: u32 = 1;

/// Scryfall asks that the same card is not re-requested more than once a day.
pub const FRESHNESS_WINDOW_HOURS: i64 = 24;

/// Columns fetched when reading a sheet
pub const READ_COLUMNS: &str = "A:ZZ";

/// Default per-request timeout, also bounding rate-limiter waits
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const USER_AGENT: &str = "D2D-Automations-SheetPriceSync/1.0";
