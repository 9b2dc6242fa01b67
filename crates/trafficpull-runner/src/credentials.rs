use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use trafficpull_core::config::CredentialSource;

/// Read-only access to reporting data.
pub const ANALYTICS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/analytics.readonly";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertions are valid for one hour, the longest the token endpoint accepts.
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the cached token expires.
const REFRESH_MARGIN_SECS: i64 = 60;

/// The fields of a service-account JSON key file this client needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("service account key is not valid JSON")
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading service account key {path}"))?;
        Self::from_json(&raw)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

pub fn build_claims(key: &ServiceAccountKey, now: DateTime<Utc>) -> Claims {
    Claims {
        iss: key.client_email.clone(),
        scope: ANALYTICS_READONLY_SCOPE.to_string(),
        aud: key.token_uri.clone(),
        exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
        iat: now.timestamp(),
    }
}

/// Sign the token-exchange assertion with the key's RSA private key.
pub fn encode_assertion(key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<String> {
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| anyhow!("service account private key: {e}"))?;
    encode(&Header::new(Algorithm::RS256), &build_claims(key, now), &signing_key)
        .map_err(|e| anyhow!("encode_assertion: {e}"))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Hands out bearer tokens for the reporting API.
pub enum TokenProvider {
    /// A token issued elsewhere; used as-is for the whole run.
    Static(String),
    /// Exchanged from a signed assertion and cached until shortly before expiry.
    ServiceAccount {
        key: ServiceAccountKey,
        http: Client,
        cache: Mutex<Option<CachedToken>>,
    },
}

impl TokenProvider {
    pub fn service_account(key: ServiceAccountKey, http: Client) -> Self {
        Self::ServiceAccount {
            key,
            http,
            cache: Mutex::new(None),
        }
    }

    pub fn from_source(source: &CredentialSource, http: Client) -> Result<Self> {
        match source {
            CredentialSource::AccessToken(token) => Ok(Self::Static(token.clone())),
            CredentialSource::ServiceAccountKey(path) => {
                let key = ServiceAccountKey::from_file(path)?;
                info!(client_email = %key.client_email, "using service account credentials");
                Ok(Self::service_account(key, http))
            }
        }
    }

    pub async fn access_token(&self) -> Result<String> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::ServiceAccount { key, http, cache } => {
                let mut cached = cache.lock().await;
                let now = Utc::now();
                if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
                    return Ok(token.value.clone());
                }
                let token = exchange(http, key, now).await?;
                let value = token.value.clone();
                *cached = Some(token);
                Ok(value)
            }
        }
    }
}

async fn exchange(http: &Client, key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<CachedToken> {
    let assertion = encode_assertion(key, now)?;
    let body = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("grant_type", JWT_BEARER_GRANT)
        .append_pair("assertion", &assertion)
        .finish();

    let resp = http
        .post(&key.token_uri)
        .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await
        .with_context(|| format!("token request to {}", key.token_uri))?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(anyhow!("token endpoint returned {status}: {text}"));
    }

    let token: TokenResponse = resp.json().await.context("token response")?;
    debug!(expires_in = token.expires_in, "access token refreshed");
    Ok(CachedToken {
        value: token.access_token,
        expires_at: now + Duration::seconds(token.expires_in),
    })
}
