//! In-memory price source and cell store for unit tests

use crate::error::{Error, Result};
use crate::scryfall::{PriceQuote, PriceSource, Prices};
use crate::sheets::{CellStore, Row};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

pub fn quote(name: &str, usd: Option<&str>, usd_foil: Option<&str>) -> PriceQuote {
    PriceQuote {
        name: name.to_string(),
        set_name: "Test Set".to_string(),
        prices: Prices {
            usd: usd.map(str::to_string),
            usd_foil: usd_foil.map(str::to_string),
            usd_etched: None,
        },
    }
}

/// Answers from a fixed table; unknown names are not found.
#[derive(Default)]
pub struct FakePrices {
    quotes: HashMap<String, PriceQuote>,
    failing: Option<String>,
    pub calls: Mutex<Vec<(String, Option<String>)>>,
}

impl FakePrices {
    pub fn with(mut self, quote: PriceQuote) -> Self {
        self.quotes.insert(quote.name.clone(), quote);
        self
    }

    /// Lookups of this name fail with a transport-style error.
    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing = Some(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSource for FakePrices {
    async fn lookup(&self, card_name: &str, set_code: Option<&str>) -> Result<PriceQuote> {
        self.calls
            .lock()
            .unwrap()
            .push((card_name.to_string(), set_code.map(str::to_string)));
        if self.failing.as_deref() == Some(card_name) {
            return Err(Error::HttpStatus(reqwest::StatusCode::BAD_GATEWAY));
        }
        self.quotes
            .get(card_name)
            .cloned()
            .ok_or_else(|| Error::CardNotFound {
                name: card_name.to_string(),
                details: "no such card".to_string(),
            })
    }
}

/// Serves fixed rows and records writes in order.
#[derive(Default)]
pub struct FakeStore {
    rows: Vec<Row>,
    reject_cell: Option<String>,
    pub writes: Mutex<Vec<(String, String)>>,
}

impl FakeStore {
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Writes to this cell are rejected.
    pub fn rejecting(mut self, cell: &str) -> Self {
        self.reject_cell = Some(cell.to_string());
        self
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CellStore for FakeStore {
    async fn read_rows(&self) -> Result<Vec<Row>> {
        Ok(self.rows.clone())
    }

    async fn write_cell(&self, cell: &str, value: &str) -> Result<()> {
        if self.reject_cell.as_deref() == Some(cell) {
            return Err(Error::ApiResponse {
                code: "INVALID_ARGUMENT".to_string(),
                details: format!("cannot write {cell}"),
            });
        }
        self.writes
            .lock()
            .unwrap()
            .push((cell.to_string(), value.to_string()));
        Ok(())
    }
}
