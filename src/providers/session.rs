// Backend session management
//
// Holds the authenticated session shared by the Google-backed providers.
// The token is loaded lazily from disk on first use, refreshed when
// expired, and reused for the process lifetime. The interactive consent
// flow is external; this module only turns persisted credential material
// into a ready session or a described authentication error.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::ProviderError;

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Tokens expiring within this window are refreshed eagerly
const EXPIRY_SLACK_SECS: i64 = 60;

/// Persisted token file shape (written by the external authorization flow)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expiry: DateTime<Utc>,
}

/// Response from the OAuth token endpoint on refresh
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: i64,
}

/// Lazily-established, process-lifetime session for Google backends
pub struct GoogleSession {
    token_path: PathBuf,
    token_url: String,
    http: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl GoogleSession {
    pub fn new(token_path: PathBuf) -> Self {
        Self::with_token_url(token_path, GOOGLE_TOKEN_URL.to_string())
    }

    /// Override the token endpoint (tests point this at a local server)
    pub fn with_token_url(token_path: PathBuf, token_url: String) -> Self {
        Self {
            token_path,
            token_url,
            http: Client::new(),
            cached: Mutex::new(None),
        }
    }

    /// Return a usable access token, establishing the session if needed.
    pub async fn ensure_ready(&self) -> Result<String, ProviderError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expiry > Utc::now() + Duration::seconds(EXPIRY_SLACK_SECS) {
                return Ok(token.access_token.clone());
            }
            debug!("Cached access token expired, re-establishing session");
        }

        let stored = self.load_stored()?;

        let fresh = match stored.expiry {
            Some(expiry) if expiry <= Utc::now() + Duration::seconds(EXPIRY_SLACK_SECS) => {
                self.refresh(&stored).await?
            }
            // No expiry recorded: trust the stored token as-is
            _ => CachedToken {
                access_token: stored.access_token.clone(),
                expiry: stored.expiry.unwrap_or_else(|| Utc::now() + Duration::hours(1)),
            },
        };

        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    fn load_stored(&self) -> Result<StoredToken, ProviderError> {
        if !self.token_path.exists() {
            return Err(ProviderError::Auth(format!(
                "token file not found at {}; complete the authorization flow first",
                self.token_path.display()
            )));
        }

        let contents = std::fs::read_to_string(&self.token_path).map_err(|e| {
            ProviderError::Auth(format!(
                "could not read token file {}: {}",
                self.token_path.display(),
                e
            ))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            ProviderError::Auth(format!(
                "token file {} is corrupt: {}",
                self.token_path.display(),
                e
            ))
        })
    }

    async fn refresh(&self, stored: &StoredToken) -> Result<CachedToken, ProviderError> {
        let (refresh_token, client_id, client_secret) = match (
            stored.refresh_token.as_deref(),
            stored.client_id.as_deref(),
            stored.client_secret.as_deref(),
        ) {
            (Some(r), Some(i), Some(s)) => (r, i, s),
            _ => {
                return Err(ProviderError::Auth(
                    "access token expired and the token file has no refresh credentials; \
                     re-run the authorization flow"
                        .to_string(),
                ))
            }
        };

        info!("Refreshing expired access token");

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Auth(format!("token refresh request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Auth(format!(
                "token refresh rejected ({}): {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Auth(format!("malformed token refresh response: {}", e)))?;

        let expiry = Utc::now() + Duration::seconds(refreshed.expires_in);

        // Persist the rotated token so the next process start skips the refresh
        let updated = StoredToken {
            access_token: refreshed.access_token.clone(),
            expiry: Some(expiry),
            ..stored.clone()
        };
        match serde_json::to_string_pretty(&updated) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.token_path, json) {
                    warn!("Could not persist refreshed token: {}", e);
                }
            }
            Err(e) => warn!("Could not serialize refreshed token: {}", e),
        }

        Ok(CachedToken {
            access_token: refreshed.access_token,
            expiry,
        })
    }
}
