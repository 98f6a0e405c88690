//! Per-row price update
//!
//! Each data row goes through the same sequence, and the first step that applies ends it:
//! 1. skip if the last-updated timestamp is less than a day old
//! 2. skip if there is no card name
//! 3. look the card up (set code narrows the match when present)
//! 4. write the foil or standard price, then the new last-updated timestamp
//!
//! Steps 1-2 are pure ([`RowProcessor::plan`]); only steps 3-4 touch the network.

use crate::cell::cell_name;
use crate::error::{Error, Result, ResultExt};
use crate::scryfall::{PriceQuote, PriceSource};
use crate::sheets::{CellStore, Row};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::HashMap;

pub const CARD_NAME: &str = "Card name";
pub const SET_CODE: &str = "Set code";
pub const FOIL: &str = "Foil";
pub const LAST_UPDATED: &str = "Last updated";
pub const PRICE: &str = "Price";

/// Zero-based indices of the recognized columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub card_name: usize,
    pub set_code: usize,
    pub foil: usize,
    pub last_updated: usize,
    pub price: usize,
}

impl ColumnMap {
    /// Map headings (case-insensitive) to column indices. Fails on the first missing
    /// heading, in the order card name, set code, foil, last updated, price.
    pub fn from_header(header: &[Value]) -> Result<Self> {
        let headings: HashMap<String, usize> = header
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell.as_str().map(|h| (h.trim().to_lowercase(), i)))
            .collect();

        let find = |heading: &'static str| {
            headings
                .get(&heading.to_lowercase())
                .copied()
                .ok_or(Error::MissingColumn(heading))
        };

        Ok(Self {
            card_name: find(CARD_NAME)?,
            set_code: find(SET_CODE)?,
            foil: find(FOIL)?,
            last_updated: find(LAST_UPDATED)?,
            price: find(PRICE)?,
        })
    }
}

/// Why a row was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Updated within the freshness window
    Fresh,
    /// No usable card name
    NoCardName,
}

/// A card to look up for one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRequest {
    pub row: usize,
    pub card_name: String,
    pub set_code: Option<String>,
    pub foil: bool,
}

/// What to do with a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowPlan {
    Skip(SkipReason),
    Lookup(CardRequest),
}

/// A single-cell write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub cell: String,
    pub value: String,
}

/// How a processed row ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Skipped(SkipReason),
    /// Scryfall has no such card; nothing was written
    NotFound,
    /// Price and timestamp written
    Updated { price: String },
}

fn cell(row: &[Value], index: usize) -> Option<&Value> {
    row.get(index)
}

/// Non-blank text in a cell
fn text(row: &[Value], index: usize) -> Option<&str> {
    cell(row, index)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Interpret a foil cell: checkboxes, numbers and common yes-words count as foil.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "y" | "1" | "x" | "foil"
        ),
        _ => false,
    }
}

/// Current moment in the last-updated cell format.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Updates one row at a time against injected price and storage services
pub struct RowProcessor<'a> {
    columns: ColumnMap,
    prices: &'a dyn PriceSource,
    store: &'a dyn CellStore,
    fresh_after: DateTime<Utc>,
}

impl<'a> RowProcessor<'a> {
    /// Rows updated after `fresh_after` are skipped.
    pub fn new(
        columns: ColumnMap,
        prices: &'a dyn PriceSource,
        store: &'a dyn CellStore,
        fresh_after: DateTime<Utc>,
    ) -> Self {
        Self {
            columns,
            prices,
            store,
            fresh_after,
        }
    }

    pub fn columns(&self) -> ColumnMap {
        self.columns
    }

    /// Decide what to do with row `row_index` without any I/O.
    pub fn plan(&self, row_index: usize, row: &[Value]) -> RowPlan {
        let last_updated = text(row, self.columns.last_updated)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok());
        if let Some(when) = last_updated {
            if when.with_timezone(&Utc) > self.fresh_after {
                return RowPlan::Skip(SkipReason::Fresh);
            }
        }

        let Some(card_name) = text(row, self.columns.card_name) else {
            return RowPlan::Skip(SkipReason::NoCardName);
        };

        RowPlan::Lookup(CardRequest {
            row: row_index,
            card_name: card_name.to_string(),
            set_code: text(row, self.columns.set_code).map(str::to_string),
            foil: is_truthy(cell(row, self.columns.foil)),
        })
    }

    /// The writes for a looked-up card, price first. A missing price is written as an
    /// empty cell.
    pub fn updates(
        &self,
        request: &CardRequest,
        quote: &PriceQuote,
        now: DateTime<Utc>,
    ) -> [CellUpdate; 2] {
        let price = quote.prices.usd_for(request.foil).unwrap_or_default();
        [
            CellUpdate {
                cell: cell_name(request.row, self.columns.price),
                value: price.to_string(),
            },
            CellUpdate {
                cell: cell_name(request.row, self.columns.last_updated),
                value: timestamp(now),
            },
        ]
    }

    /// Plan, look up and write one row.
    pub async fn process(&self, row_index: usize, row: &Row) -> Result<RowOutcome> {
        let request = match self.plan(row_index, row) {
            RowPlan::Skip(reason) => {
                log::debug!("Row {}: skipped ({:?})", row_index + 1, reason);
                return Ok(RowOutcome::Skipped(reason));
            }
            RowPlan::Lookup(request) => request,
        };

        let quote = match self
            .prices
            .lookup(&request.card_name, request.set_code.as_deref())
            .await
        {
            Ok(quote) => quote,
            Err(Error::CardNotFound { details, .. }) => {
                log::warn!(
                    "Row {}: {:?} not found on Scryfall ({})",
                    row_index + 1,
                    request.card_name,
                    details
                );
                return Ok(RowOutcome::NotFound);
            }
            Err(e) => {
                return Err(e.context(format!("querying price for {:?}", request.card_name)))
            }
        };

        let [price, updated] = self.updates(&request, &quote, Utc::now());
        self.store
            .write_cell(&price.cell, &price.value)
            .await
            .context(format!("setting price in cell {}", price.cell))?;
        self.store
            .write_cell(&updated.cell, &updated.value)
            .await
            .context(format!("setting last-updated time in cell {}", updated.cell))?;

        log::info!(
            "Row {}: {} ({}){} = {:?}",
            row_index + 1,
            quote.name,
            quote.set_name,
            if request.foil { " foil" } else { "" },
            price.value
        );
        Ok(RowOutcome::Updated { price: price.value })
    }
}

#[cfg(test)]
#[path = "row_tests.rs"]
mod tests;
