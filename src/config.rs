//! Settings resolution.
//!
//! Settings come from `drive_audit.toml` (or the file named by `--settings`)
//! and are overridden by CLI flags and environment variables. Precedence:
//! CLI/env > settings file > defaults.
//!
//! ```toml
//! domain = "example.com"
//! admin_username = "admin"
//! service_account_file = "service-account.json"
//! lockdown_grace_days = 30
//!
//! [endpoints]
//! token = "https://oauth2.googleapis.com/token"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AuditError, Result};

/// Default settings file name, looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "drive_audit.toml";

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_DIRECTORY_API: &str = "https://admin.googleapis.com/admin/directory/v1";
pub const DEFAULT_DRIVE_API: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_SHEETS_API: &str = "https://sheets.googleapis.com/v4";

const DEFAULT_LOCKDOWN_GRACE_DAYS: i64 = 30;

/// Upper bound on the lockdown grace period, roughly a century.
pub const MAX_LOCKDOWN_GRACE_DAYS: i64 = 36_500;

/// Raw contents of the settings file. Every field is optional here.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsFile {
    pub domain: Option<String>,
    pub admin_username: Option<String>,
    pub service_account_file: Option<PathBuf>,
    pub lockdown_grace_days: Option<i64>,
    #[serde(default)]
    pub endpoints: EndpointsFile,
}

#[derive(Debug, Default, Deserialize)]
pub struct EndpointsFile {
    pub token: Option<String>,
    pub directory: Option<String>,
    pub drive: Option<String>,
    pub sheets: Option<String>,
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct SettingsOverrides {
    pub settings_file: Option<PathBuf>,
    pub domain: Option<String>,
    pub admin_username: Option<String>,
    pub service_account_file: Option<PathBuf>,
}

/// Base URLs of the Google APIs the tool talks to.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    /// Token endpoint override. `None` defers to the key file's `token_uri`.
    pub token: Option<String>,
    pub directory: String,
    pub drive: String,
    pub sheets: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            token: None,
            directory: DEFAULT_DIRECTORY_API.to_string(),
            drive: DEFAULT_DRIVE_API.to_string(),
            sheets: DEFAULT_SHEETS_API.to_string(),
        }
    }
}

impl Endpoints {
    /// Point every API, including the token endpoint, at one base URL.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            token: Some(format!("{}/token", base)),
            directory: format!("{}/admin/directory/v1", base),
            drive: format!("{}/drive/v3", base),
            sheets: format!("{}/v4", base),
        }
    }
}

/// Fully-resolved settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub domain: String,
    /// Fully qualified administrator address.
    pub admin_email: String,
    pub service_account_file: PathBuf,
    pub lockdown_grace_days: i64,
    pub endpoints: Endpoints,
}

impl Settings {
    /// Merge the settings file (if present) with overrides.
    ///
    /// A missing default settings file is not an error; a missing file that
    /// was named explicitly is.
    pub fn resolve(overrides: SettingsOverrides) -> Result<Self> {
        let file = match &overrides.settings_file {
            Some(path) => load_settings_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_SETTINGS_FILE);
                if default_path.exists() {
                    load_settings_file(default_path)?
                } else {
                    SettingsFile::default()
                }
            }
        };
        Self::merge(file, overrides)
    }

    /// Apply overrides on top of an already-parsed settings file.
    pub fn merge(file: SettingsFile, overrides: SettingsOverrides) -> Result<Self> {
        let domain = overrides
            .domain
            .or(file.domain)
            .map(|d| d.trim().trim_start_matches('@').to_string())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| AuditError::Settings("domain is not configured".to_string()))?;

        let admin = overrides
            .admin_username
            .or(file.admin_username)
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                AuditError::Settings("admin username is not configured".to_string())
            })?;

        let service_account_file = overrides
            .service_account_file
            .or(file.service_account_file)
            .ok_or_else(|| {
                AuditError::Settings("service account file is not configured".to_string())
            })?;

        let lockdown_grace_days = file
            .lockdown_grace_days
            .unwrap_or(DEFAULT_LOCKDOWN_GRACE_DAYS);
        if !(0..=MAX_LOCKDOWN_GRACE_DAYS).contains(&lockdown_grace_days) {
            return Err(AuditError::Settings(format!(
                "lockdown_grace_days must be between 0 and {} (got {})",
                MAX_LOCKDOWN_GRACE_DAYS, lockdown_grace_days
            )));
        }

        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            token: file.endpoints.token,
            directory: file.endpoints.directory.unwrap_or(defaults.directory),
            drive: file.endpoints.drive.unwrap_or(defaults.drive),
            sheets: file.endpoints.sheets.unwrap_or(defaults.sheets),
        };

        Ok(Self {
            admin_email: qualify_admin(&admin, &domain),
            domain,
            service_account_file,
            lockdown_grace_days,
            endpoints,
        })
    }

    /// Whether an address belongs to the configured domain.
    pub fn is_domain_email(&self, email: &str) -> bool {
        email
            .rsplit_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.eq_ignore_ascii_case(&self.domain))
    }
}

fn load_settings_file(path: &Path) -> Result<SettingsFile> {
    let content = fs::read_to_string(path).map_err(|e| {
        AuditError::Settings(format!("cannot read {}: {}", path.display(), e))
    })?;
    toml::from_str(&content)
        .map_err(|e| AuditError::Settings(format!("cannot parse {}: {}", path.display(), e)))
}

/// `admin` becomes `admin@<domain>`; full addresses are kept as-is.
fn qualify_admin(admin: &str, domain: &str) -> String {
    if admin.contains('@') {
        admin.to_string()
    } else {
        format!("{}@{}", admin, domain)
    }
}
