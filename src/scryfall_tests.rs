//! Tests for the Scryfall price lookup client.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{PriceQuote, PriceSource, Prices, ScryfallClient};
use crate::error::Error;
use crate::rate_limit::{RateLimitedClient, RateLimiter};

fn client_for(mock_server: &MockServer) -> ScryfallClient {
    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(1), 1));
    ScryfallClient::with_base_url(RateLimitedClient::new(limiter, None), mock_server.uri())
}

/// Helper: a trimmed-down Scryfall card object.
fn card_json(name: &str, usd: Option<&str>, usd_foil: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "object": "card",
        "id": "test-uuid-123",
        "name": name,
        "set": "ddj",
        "set_name": "Duel Decks: Izzet vs. Golgari",
        "rarity": "uncommon",
        "prices": { "usd": usd, "usd_foil": usd_foil, "usd_etched": null, "eur": "0.20" }
    })
}

fn not_found_json() -> serde_json::Value {
    serde_json::json!({
        "object": "error",
        "code": "not_found",
        "status": 404,
        "details": "No cards found matching “Giant Kiler”"
    })
}

// ── lookup ───────────────────────────────────────────────────────────

#[tokio::test]
async fn lookup_sends_exact_name() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .and(query_param("exact", "Giant Killer"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(card_json("Giant Killer", Some("0.25"), None)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let quote = client_for(&mock_server)
        .lookup("Giant Killer", None)
        .await
        .unwrap();
    assert_eq!(quote.name, "Giant Killer");
    assert_eq!(quote.prices.usd.as_deref(), Some("0.25"));

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("exact=Giant+Killer"));
}

#[tokio::test]
async fn lookup_adds_set_code_when_given() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .and(query_param("exact", "Lightning Bolt"))
        .and(query_param("set", "lea"))
        .respond_with(ResponseTemplate::new(200).set_body_json(card_json(
            "Lightning Bolt",
            Some("450.00"),
            None,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let quote = client_for(&mock_server)
        .lookup("Lightning Bolt", Some("lea"))
        .await
        .unwrap();
    assert_eq!(quote.prices.usd.as_deref(), Some("450.00"));
}

#[tokio::test]
async fn lookup_sends_good_citizen_headers() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .and(header("Accept", "application/json"))
        .and(header("User-Agent", crate::config::USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(card_json("Opt", None, None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    client_for(&mock_server).lookup("Opt", None).await.unwrap();
}

#[tokio::test]
async fn lookup_decodes_all_prices() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Sol Ring",
            "set_name": "Commander Masters",
            "prices": { "usd": "1.10", "usd_foil": "3.25", "usd_etched": "9.99" }
        })))
        .mount(&mock_server)
        .await;

    let quote = client_for(&mock_server).lookup("Sol Ring", None).await.unwrap();
    assert_eq!(
        quote,
        PriceQuote {
            name: "Sol Ring".to_string(),
            set_name: "Commander Masters".to_string(),
            prices: Prices {
                usd: Some("1.10".to_string()),
                usd_foil: Some("3.25".to_string()),
                usd_etched: Some("9.99".to_string()),
            },
        }
    );
}

#[tokio::test]
async fn lookup_not_found_is_card_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found_json()))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).lookup("Giant Kiler", None).await;
    match result {
        Err(Error::CardNotFound { name, details }) => {
            assert_eq!(name, "Giant Kiler");
            assert!(details.contains("No cards found"));
        }
        other => panic!("Expected Error::CardNotFound, got: {other:?}"),
    }
}

#[tokio::test]
async fn lookup_other_api_errors_keep_code() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "object": "error",
            "code": "bad_request",
            "status": 400,
            "details": "You must provide an exact or fuzzy parameter"
        })))
        .mount(&mock_server)
        .await;

    match client_for(&mock_server).lookup("", None).await {
        Err(Error::ApiResponse { code, .. }) => assert_eq!(code, "bad_request"),
        other => panic!("Expected Error::ApiResponse, got: {other:?}"),
    }
}

#[tokio::test]
async fn lookup_unreadable_error_body_is_http_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&mock_server)
        .await;

    match client_for(&mock_server).lookup("Opt", None).await {
        Err(Error::HttpStatus(status)) => {
            assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE)
        }
        other => panic!("Expected Error::HttpStatus, got: {other:?}"),
    }
}

#[tokio::test]
async fn lookup_malformed_body_is_parse_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"name\": "))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).lookup("Opt", None).await;
    assert!(matches!(result, Err(Error::Parse(_))));
}

#[tokio::test]
async fn lookup_wrong_shape_is_parse_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([1, 2, 3])))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).lookup("Opt", None).await;
    assert!(matches!(result, Err(Error::Parse(_))));
}

#[tokio::test]
async fn lookup_unreachable_server_is_network_error() {
    // Nothing listens on the discard port.
    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(1), 1));
    let client =
        ScryfallClient::with_base_url(RateLimitedClient::new(limiter, None), "http://127.0.0.1:9");

    let result = client.lookup("Opt", None).await;
    assert!(matches!(result, Err(Error::Network(_))));
}

// ── PriceQuote decoding ──────────────────────────────────────────────

#[test]
fn missing_prices_object_decodes_empty() {
    let quote: PriceQuote =
        serde_json::from_str(r#"{ "name": "Test Card", "set_name": "Test Set" }"#).unwrap();
    assert_eq!(quote.prices, Prices::default());
}

#[test]
fn null_prices_decode_as_none() {
    let quote: PriceQuote = serde_json::from_str(
        r#"{ "name": "Test", "set_name": "Set", "prices": { "usd": null, "usd_foil": "2.00" } }"#,
    )
    .unwrap();
    assert!(quote.prices.usd.is_none());
    assert_eq!(quote.prices.usd_foil.as_deref(), Some("2.00"));
    assert!(quote.prices.usd_etched.is_none());
}

#[test]
fn usd_for_picks_foil_or_standard() {
    let prices = Prices {
        usd: Some("0.25".to_string()),
        usd_foil: Some("1.50".to_string()),
        usd_etched: None,
    };
    assert_eq!(prices.usd_for(false), Some("0.25"));
    assert_eq!(prices.usd_for(true), Some("1.50"));
    assert_eq!(Prices::default().usd_for(true), None);
}

#[test]
fn default_base_url_is_scryfall() {
    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(100), 1));
    let client = ScryfallClient::new(RateLimitedClient::new(limiter, None));
    assert_eq!(client.base_url(), "https://api.scryfall.com");
}
