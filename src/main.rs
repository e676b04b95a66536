//! drive_audit CLI - Audit Google Drive files for public sharing across a domain.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};

use drive_audit::audit::{AuditOptions, AuditScope, Auditor};
use drive_audit::config::{Settings, SettingsOverrides};
use drive_audit::logging::init_tracing;
use drive_audit::report::html::DEFAULT_TEMPLATE_FILE;
use drive_audit::report::Field;
use drive_audit::{ErrorLog, GoogleWorkspace};

/// Audit Google Drive files for public sharing across your domain.
#[derive(Parser)]
#[command(name = "drive_audit")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Examples:\n  drive_audit\n  drive_audit -f name link\n  drive_audit -f name link id modified --no-html")]
struct Cli {
    /// Output fields: name (file name), link (sharing URL), id (file ID), modified (last modified date).
    #[arg(long, short = 'f', value_enum, num_args = 1.., action = ArgAction::Append, default_values_t = [CliField::Name], value_name = "FIELD")]
    fields: Vec<CliField>,

    /// Console output only, skip HTML report generation.
    #[arg(long)]
    no_html: bool,

    /// Create a spreadsheet report with a tab for each user.
    #[arg(long)]
    sheets: bool,

    /// Audit shared drives only, skip individual user files.
    #[arg(long, conflicts_with = "skip_shared_drives")]
    shared_drives_only: bool,

    /// Audit user files only, skip shared drives.
    #[arg(long)]
    skip_shared_drives: bool,

    /// Enable debug logging and full error traces.
    #[arg(long)]
    debug: bool,

    /// Settings file (TOML). Defaults to drive_audit.toml when present.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Path to service account JSON credentials file.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Workspace domain to audit.
    #[arg(long, env = "DRIVE_AUDIT_DOMAIN")]
    domain: Option<String>,

    /// Administrator to impersonate (bare username or full address).
    #[arg(long, env = "DRIVE_AUDIT_ADMIN")]
    admin: Option<String>,

    /// HTML template for per-user pages.
    #[arg(long, default_value = DEFAULT_TEMPLATE_FILE, value_name = "FILE")]
    template: PathBuf,

    /// File errors are appended to.
    #[arg(long, default_value = drive_audit::error_log::DEFAULT_ERROR_LOG, value_name = "FILE")]
    error_log: PathBuf,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum CliField {
    Name,
    Link,
    Id,
    Modified,
}

impl From<CliField> for Field {
    fn from(value: CliField) -> Self {
        match value {
            CliField::Name => Field::Name,
            CliField::Link => Field::Link,
            CliField::Id => Field::Id,
            CliField::Modified => Field::Modified,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let settings = Settings::resolve(SettingsOverrides {
        settings_file: cli.settings.clone(),
        domain: cli.domain.clone(),
        admin_username: cli.admin.clone(),
        service_account_file: cli.credentials.clone(),
    })
    .context("Failed to resolve settings")?;

    let workspace = GoogleWorkspace::from_settings(&settings).with_context(|| {
        format!(
            "Failed to load credentials from {:?}",
            settings.service_account_file
        )
    })?;

    let scope = if cli.shared_drives_only {
        AuditScope::SharedDrivesOnly
    } else if cli.skip_shared_drives {
        AuditScope::UsersOnly
    } else {
        AuditScope::All
    };

    let options = AuditOptions {
        fields: cli.fields.into_iter().map(Field::from).collect(),
        scope,
        html_template: (!cli.no_html).then_some(cli.template),
        output_parent: PathBuf::from("."),
        sheets: cli.sheets,
        debug: cli.debug,
    };

    let auditor = Auditor::new(workspace, &settings.domain, options, ErrorLog::new(&cli.error_log));
    let mut stdout = std::io::stdout();
    let outcome = auditor.run(&mut stdout).await.context("Audit failed")?;

    Ok(ExitCode::from(outcome.exit_code() as u8))
}
