//! Sheet Price Sync - MTG collection price updater
//!
//! Reads a Google Sheets collection tracker, looks each card up on Scryfall and writes
//! the current USD price and a last-updated timestamp back to the sheet. Both remote APIs
//! are reached through their own rate-limited channel.

pub mod auth;
pub mod cell;
pub mod config;
pub mod driver;
pub mod error;
pub mod rate_limit;
pub mod row;
pub mod scryfall;
pub mod sheets;

#[cfg(test)]
mod testing;

pub use driver::{run, RunSummary};
pub use error::{Error, Result};
pub use rate_limit::{RateLimitedClient, RateLimiter};
pub use row::{ColumnMap, RowOutcome, RowPlan, RowProcessor};
pub use scryfall::{PriceQuote, PriceSource, Prices, ScryfallClient};
pub use sheets::{CellStore, Row, SheetsClient};
