//! Error types for the drive_audit crate.

use thiserror::Error;

/// Errors that can occur while auditing a Google Workspace domain.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to read credentials file: {0}")]
    CredentialsFile(#[source] std::io::Error),

    #[error("Failed to parse credentials JSON: {0}")]
    CredentialsParse(#[from] serde_json::Error),

    #[error("JWT encoding error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("{api} is not enabled{}", activation_url.as_ref().map(|u| format!(". Enable it here: {}", u)).unwrap_or_default())]
    ApiUnavailable {
        api: String,
        activation_url: Option<String>,
    },

    #[error("Failed to fetch public files for {source_name}: {cause}")]
    SourceFetch {
        source_name: String,
        #[source]
        cause: Box<AuditError>,
    },

    #[error("Failed to write {report} report: {cause}")]
    ReportWrite {
        report: String,
        #[source]
        cause: Box<AuditError>,
    },

    #[error("Invalid template: {0}")]
    Template(String),

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuditError {
    /// Wrap an error raised while fetching one user's or shared drive's files.
    pub fn source_fetch(source_name: impl Into<String>, cause: AuditError) -> Self {
        AuditError::SourceFetch {
            source_name: source_name.into(),
            cause: Box::new(cause),
        }
    }

    /// Wrap an error raised while writing a report artifact.
    pub fn report_write(report: impl Into<String>, cause: AuditError) -> Self {
        AuditError::ReportWrite {
            report: report.into(),
            cause: Box::new(cause),
        }
    }

    /// HTTP status of the underlying API failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuditError::Api { status, .. } => Some(*status),
            AuditError::Http(e) => e.status().map(|s| s.as_u16()),
            AuditError::SourceFetch { cause, .. } | AuditError::ReportWrite { cause, .. } => {
                cause.status()
            }
            _ => None,
        }
    }
}

/// Result type alias for AuditError.
pub type Result<T> = std::result::Result<T, AuditError>;
