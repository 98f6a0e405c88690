//! OAuth access for the Sheets API
//!
//! Uses the installed-application flow: the operator visits a consent URL once, passes
//! the resulting code with `--authcode`, and the token (with its refresh token) is kept in
//! the token file for later runs.

use crate::config::SHEETS_SCOPE;
use crate::error::{Error, Result, ResultExt};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Client secrets file as downloaded from the Google Cloud console
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl ClientSecrets {
    /// Load and validate a credentials file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            Error::Io {
                path: path.to_path_buf(),
                source,
            }
            .context(format!("reading credentials from {}", path.display()))
        })?;
        let file: CredentialsFile = serde_json::from_str(&content)
            .context(format!("parsing credentials in {}", path.display()))?;
        file.installed.or(file.web).ok_or_else(|| {
            Error::Config(format!(
                "{} has neither an \"installed\" nor a \"web\" section",
                path.display()
            ))
        })
    }

    fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or("urn:ietf:wg:oauth:2.0:oob")
    }

    /// URL where the operator grants access and receives an auth code.
    pub fn consent_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline",
            self.auth_uri,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(self.redirect_uri()),
            urlencoding::encode(SHEETS_SCOPE)
        )
    }
}

/// Stored OAuth token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Token {
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(Error::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let token = serde_json::from_str(&content)
            .context(format!("parsing OAuth token in {}", path.display()))?;
        Ok(Some(token))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Saved OAuth token to {}", path.display());
        Ok(())
    }

    /// Tokens without an expiry are assumed valid.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .is_some_and(|expiry| expiry <= now + Duration::seconds(EXPIRY_MARGIN_SECS))
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: String,
}

async fn request_token(
    http: &reqwest::Client,
    secrets: &ClientSecrets,
    params: &[(&str, &str)],
    previous_refresh: Option<String>,
) -> Result<Token> {
    let response = http.post(&secrets.token_uri).form(params).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(match serde_json::from_str::<TokenError>(&body) {
            Ok(e) => Error::ApiResponse {
                code: e.error,
                details: e.error_description,
            },
            Err(_) => Error::HttpStatus(status),
        });
    }

    let granted: TokenResponse = serde_json::from_str(&body)?;
    Ok(Token {
        access_token: granted.access_token,
        // Refresh responses usually omit the refresh token; keep the old one.
        refresh_token: granted.refresh_token.or(previous_refresh),
        token_type: granted.token_type.unwrap_or_else(default_token_type),
        expiry: granted
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs)),
    })
}

/// Exchange a one-time auth code for a token.
pub async fn exchange_code(
    http: &reqwest::Client,
    secrets: &ClientSecrets,
    code: &str,
) -> Result<Token> {
    log::info!("Exchanging auth code for an OAuth token");
    request_token(
        http,
        secrets,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("redirect_uri", secrets.redirect_uri()),
        ],
        None,
    )
    .await
}

/// Get a fresh access token using a refresh token.
pub async fn refresh(
    http: &reqwest::Client,
    secrets: &ClientSecrets,
    refresh_token: &str,
) -> Result<Token> {
    log::info!("Refreshing OAuth token");
    request_token(
        http,
        secrets,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
        ],
        Some(refresh_token.to_string()),
    )
    .await
}

/// Produce a usable access token, refreshing or exchanging as needed and keeping the
/// token file up to date.
pub async fn authorize(
    http: &reqwest::Client,
    creds_path: &Path,
    token_path: &Path,
    authcode: Option<&str>,
) -> Result<String> {
    let secrets = ClientSecrets::load(creds_path)?;

    if let Some(token) = Token::load(token_path)? {
        if !token.is_expired(Utc::now()) {
            log::debug!("Using OAuth token from {}", token_path.display());
            return Ok(token.access_token);
        }
        if let Some(refresh_token) = token.refresh_token.as_deref() {
            let token = refresh(http, &secrets, refresh_token)
                .await
                .context("refreshing OAuth token")?;
            token.save(token_path)?;
            return Ok(token.access_token);
        }
        log::warn!(
            "OAuth token in {} expired and cannot be refreshed",
            token_path.display()
        );
    }

    match authcode.filter(|code| !code.trim().is_empty()) {
        Some(code) => {
            let token = exchange_code(http, &secrets, code.trim())
                .await
                .context("exchanging auth code")?;
            token.save(token_path)?;
            Ok(token.access_token)
        }
        None => Err(Error::Config(format!(
            "no usable OAuth token in {}; visit {} and rerun with --authcode <code>",
            token_path.display(),
            secrets.consent_url()
        ))),
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
