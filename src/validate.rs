//! API reachability checks run before any enumeration.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{AuditError, Result};
use crate::workspace::Workspace;

/// Console URL Google embeds in "API has not been used / is disabled" errors.
static ACTIVATION_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https://console\.(?:developers|cloud)\.google\.com[^\s'"]*"#)
        .expect("Invalid activation URL regex")
});

/// Extract the API activation link from an error message.
///
/// Returns `None` when the message carries no such link.
///
/// ```
/// use drive_audit::validate::parse_activation_url;
///
/// let msg = "Drive API has not been used in project 42 before or it is disabled. \
///            Enable it by visiting https://console.developers.google.com/apis/api/drive.googleapis.com/overview?project=42 then retry.";
/// assert_eq!(
///     parse_activation_url(msg).as_deref(),
///     Some("https://console.developers.google.com/apis/api/drive.googleapis.com/overview?project=42")
/// );
/// assert_eq!(parse_activation_url("Request had insufficient authentication scopes."), None);
/// ```
pub fn parse_activation_url(message: &str) -> Option<String> {
    ACTIVATION_URL_REGEX
        .find(message)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ')']).to_string())
}

/// An API the audit needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredApi {
    Directory,
    Drive,
    Sheets,
}

impl fmt::Display for RequiredApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequiredApi::Directory => "Admin SDK Directory API",
            RequiredApi::Drive => "Google Drive API",
            RequiredApi::Sheets => "Google Sheets API",
        };
        f.write_str(name)
    }
}

/// APIs to probe for a run; Sheets only when a spreadsheet was requested.
pub fn required_apis(use_sheets: bool) -> Vec<RequiredApi> {
    let mut apis = vec![RequiredApi::Directory, RequiredApi::Drive];
    if use_sheets {
        apis.push(RequiredApi::Sheets);
    }
    apis
}

/// Map a probe failure to `ApiUnavailable` when the error names an
/// activation URL; other failures are returned unchanged.
pub fn classify_failure(api: RequiredApi, error: AuditError) -> AuditError {
    let url = match &error {
        AuditError::Api { message, .. } | AuditError::Auth(message) => {
            parse_activation_url(message)
        }
        _ => None,
    };
    match url {
        Some(activation_url) => AuditError::ApiUnavailable {
            api: api.to_string(),
            activation_url: Some(activation_url),
        },
        None => error,
    }
}

/// Probe one API.
pub async fn check_api<W: Workspace>(workspace: &W, api: RequiredApi) -> Result<()> {
    debug!(%api, "testing API");
    let result = match api {
        RequiredApi::Directory => workspace.probe_directory().await,
        RequiredApi::Drive => workspace.probe_drive().await,
        RequiredApi::Sheets => workspace.probe_sheets().await,
    };
    match result {
        Ok(()) => {
            debug!(%api, "API test passed");
            Ok(())
        }
        Err(e) => Err(classify_failure(api, e)),
    }
}
