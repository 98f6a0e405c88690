//! Scryfall API client for exact-name price lookups
//!
//! All requests go through the pricing channel's [`RateLimitedClient`].

use crate::config::{NAMED_CARD_PATH, SCRYFALL_BASE_URL, USER_AGENT};
use crate::error::{Error, Result};
use crate::rate_limit::RateLimitedClient;
use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;

/// The part of a Scryfall card object needed for pricing.
/// The full object is described at <https://scryfall.com/docs/api/cards>.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PriceQuote {
    pub name: String,
    pub set_name: String,
    #[serde(default)]
    pub prices: Prices,
}

/// Quoted prices as decimal strings; `None` when there is no listing
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Prices {
    #[serde(default)]
    pub usd: Option<String>,
    #[serde(default)]
    pub usd_foil: Option<String>,
    #[serde(default)]
    pub usd_etched: Option<String>,
}

impl Prices {
    /// The foil or standard USD price.
    pub fn usd_for(&self, foil: bool) -> Option<&str> {
        if foil {
            self.usd_foil.as_deref()
        } else {
            self.usd.as_deref()
        }
    }
}

/// Scryfall API error response
#[derive(Debug, Deserialize)]
struct ScryfallError {
    code: String,
    #[serde(default)]
    details: String,
}

/// Anything that can quote a card's price
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn lookup(&self, card_name: &str, set_code: Option<&str>) -> Result<PriceQuote>;
}

/// Rate-limited client for the `/cards/named` endpoint
#[derive(Debug, Clone)]
pub struct ScryfallClient {
    http: RateLimitedClient,
    base_url: String,
}

impl ScryfallClient {
    pub fn new(http: RateLimitedClient) -> Self {
        Self::with_base_url(http, SCRYFALL_BASE_URL)
    }

    /// Client against another API root (a mock server in tests).
    pub fn with_base_url(http: RateLimitedClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn named_card_request(
        &self,
        card_name: &str,
        set_code: Option<&str>,
    ) -> Result<reqwest::Request> {
        let url = format!("{}{}", self.base_url, NAMED_CARD_PATH);
        let mut query = vec![("exact", card_name)];
        if let Some(set_code) = set_code {
            query.push(("set", set_code));
        }
        Ok(self
            .http
            .request(reqwest::Method::GET, &url)
            .query(&query)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/json")
            .build()?)
    }
}

#[async_trait]
impl PriceSource for ScryfallClient {
    async fn lookup(&self, card_name: &str, set_code: Option<&str>) -> Result<PriceQuote> {
        let request = self.named_card_request(card_name, set_code)?;
        log::debug!("Looking up {:?} (set {:?}) on Scryfall", card_name, set_code);

        let response = self.http.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        match serde_json::from_str::<ScryfallError>(&body) {
            Ok(error) if error.code == "not_found" => Err(Error::CardNotFound {
                name: card_name.to_string(),
                details: error.details,
            }),
            Ok(error) => Err(Error::ApiResponse {
                code: error.code,
                details: error.details,
            }),
            Err(_) => Err(Error::HttpStatus(status)),
        }
    }
}

#[cfg(test)]
#[path = "scryfall_tests.rs"]
mod tests;
