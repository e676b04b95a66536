//! drive_audit - Find publicly shared Google Drive files across a Workspace domain.
//!
//! This library provides functionality to:
//! - Confirm the Directory, Drive and Sheets APIs are enabled for the service account
//! - List every user and shared drive in the domain
//! - Find files shared with "anyone with the link" per user and per shared drive
//! - Report them on the console, as per-user HTML pages and as a spreadsheet
//! - Restrict stale public files to the domain (lockdown)
//!
//! # Example
//!
//! ```no_run
//! use drive_audit::audit::{AuditOptions, Auditor, RunOutcome};
//! use drive_audit::config::{Settings, SettingsOverrides};
//! use drive_audit::{ErrorLog, GoogleWorkspace};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::resolve(SettingsOverrides::default())?;
//!     let workspace = GoogleWorkspace::from_settings(&settings)?;
//!     let auditor = Auditor::new(
//!         workspace,
//!         &settings.domain,
//!         AuditOptions::default(),
//!         ErrorLog::default(),
//!     );
//!
//!     let outcome = auditor.run(&mut std::io::stdout()).await?;
//!     std::process::exit(outcome.exit_code());
//! }
//! ```

pub mod audit;
pub mod auth;
pub mod client;
pub mod config;
pub mod directory;
pub mod drive;
pub mod error;
pub mod error_log;
pub mod lockdown;
pub mod logging;
pub mod models;
pub mod report;
pub mod sheets;
pub mod validate;
pub mod workspace;

// Re-exports for convenience
pub use audit::{AuditOptions, AuditScope, Auditor, RunOutcome};
pub use auth::{Authenticator, Scope};
pub use config::Settings;
pub use error::{AuditError, Result};
pub use error_log::ErrorLog;
pub use models::{FileRecord, ReportIndex, SharedDriveRecord, Source, UserRecord};
pub use validate::parse_activation_url;
pub use workspace::{GoogleWorkspace, Workspace};
