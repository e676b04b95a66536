//! Service account authentication with domain-wide delegation.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::DEFAULT_TOKEN_URI;
use crate::error::{AuditError, Result};
use crate::models::{ServiceAccountCredentials, TokenResponse};

/// OAuth scope family. Each API is called with a token for exactly one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Read-only user listing.
    Directory,
    /// Read-only file metadata for per-user audits.
    Audit,
    /// Read-only access for shared drive enumeration.
    SharedDrives,
    /// Full Drive access for rewriting permissions.
    Lockdown,
    /// Spreadsheet creation and writes.
    Sheets,
}

impl Scope {
    pub fn urls(self) -> &'static [&'static str] {
        match self {
            Scope::Directory => &["https://www.googleapis.com/auth/admin.directory.user.readonly"],
            Scope::Audit => &["https://www.googleapis.com/auth/drive.metadata.readonly"],
            Scope::SharedDrives => &["https://www.googleapis.com/auth/drive.readonly"],
            Scope::Lockdown => &["https://www.googleapis.com/auth/drive"],
            Scope::Sheets => &[
                "https://www.googleapis.com/auth/spreadsheets",
                "https://www.googleapis.com/auth/drive.file",
            ],
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Directory => "directory",
            Scope::Audit => "audit",
            Scope::SharedDrives => "shared-drives",
            Scope::Lockdown => "lockdown",
            Scope::Sheets => "sheets",
        };
        f.write_str(name)
    }
}

/// JWT claims for a delegated service account assertion.
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,   // Issuer (service account email)
    sub: String,   // Impersonated user
    scope: String, // Space-separated OAuth scopes
    aud: String,   // Audience (token endpoint)
    exp: u64,      // Expiration time
    iat: u64,      // Issued at
}

/// Cached access token with expiration.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: SystemTime,
}

/// Issues access tokens for a service account impersonating domain users.
#[derive(Clone)]
pub struct Authenticator {
    credentials: Arc<ServiceAccountCredentials>,
    token_uri: String,
    client: Client,
    cached_tokens: Arc<RwLock<HashMap<(String, Scope), CachedToken>>>,
}

impl Authenticator {
    /// Create a new authenticator from a service account JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(AuditError::CredentialsFile)?;
        let credentials: ServiceAccountCredentials = serde_json::from_str(&content)?;
        Ok(Self::new(credentials))
    }

    /// Create a new authenticator from credentials.
    pub fn new(credentials: ServiceAccountCredentials) -> Self {
        let token_uri = credentials
            .token_uri
            .clone()
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());
        Self {
            credentials: Arc::new(credentials),
            token_uri,
            client: Client::new(),
            cached_tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Exchange tokens at a different endpoint than the key file names.
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    pub fn service_account_email(&self) -> &str {
        &self.credentials.client_email
    }

    /// Get a valid access token for `subject` in the given scope family,
    /// refreshing if necessary.
    pub async fn access_token(&self, subject: &str, scope: Scope) -> Result<String> {
        let key = (subject.to_string(), scope);

        // Check if we have a valid cached token
        {
            let cached = self.cached_tokens.read().await;
            if let Some(token) = cached.get(&key) {
                // Add 60 second buffer before expiration
                let buffer = Duration::from_secs(60);
                if token.expires_at > SystemTime::now() + buffer {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let new_token = self.request_token(subject, scope).await?;

        {
            let mut cached = self.cached_tokens.write().await;
            cached.insert(key, new_token.clone());
        }

        Ok(new_token.access_token)
    }

    /// Request a delegated token using a JWT assertion.
    async fn request_token(&self, subject: &str, scope: Scope) -> Result<CachedToken> {
        debug!(subject, %scope, "requesting delegated access token");

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AuditError::Auth(format!("system clock before Unix epoch: {}", e)))?
            .as_secs();

        let claims = Claims {
            iss: self.credentials.client_email.clone(),
            sub: subject.to_string(),
            scope: scope.urls().join(" "),
            aud: self.token_uri.clone(),
            iat: now,
            exp: now + 3600, // 1 hour
        };

        let header = Header::new(Algorithm::RS256);
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())?;
        let jwt = encode(&header, &claims, &key)?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", &jwt),
        ];

        let response = self
            .client
            .post(&self.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuditError::Auth(format!(
                "delegation for {} ({}) rejected with status {}: {}",
                subject, scope, status, body
            )));
        }

        let token_response: TokenResponse = response.json().await?;

        let expires_at = SystemTime::now() + Duration::from_secs(token_response.expires_in);

        Ok(CachedToken {
            access_token: token_response.access_token,
            expires_at,
        })
    }
}
