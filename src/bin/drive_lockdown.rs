//! drive_lockdown CLI - Restrict a user's stale public files to the domain.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use drive_audit::config::{Settings, SettingsOverrides};
use drive_audit::lockdown::{Lockdown, LockdownOptions};
use drive_audit::logging::init_tracing;
use drive_audit::{ErrorLog, GoogleWorkspace};

/// Replace "anyone with the link" sharing on a user's files that have not
/// been modified within the grace period with domain-only sharing.
#[derive(Parser)]
#[command(name = "drive_lockdown")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address of the user whose files are locked down.
    email: String,

    /// Apply the changes. Without this flag the run is a dry run.
    #[arg(long)]
    commit: bool,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,

    /// Settings file (TOML). Defaults to drive_audit.toml when present.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Path to service account JSON credentials file.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Workspace domain.
    #[arg(long, env = "DRIVE_AUDIT_DOMAIN")]
    domain: Option<String>,

    /// Administrator username.
    #[arg(long, env = "DRIVE_AUDIT_ADMIN")]
    admin: Option<String>,

    /// File errors are appended to.
    #[arg(long, default_value = drive_audit::error_log::DEFAULT_ERROR_LOG, value_name = "FILE")]
    error_log: PathBuf,
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

    if !settings.is_domain_email(&cli.email) {
        eprintln!("usage:\n  drive_lockdown email@{} [--commit]", settings.domain);
        return Ok(ExitCode::FAILURE);
    }

    let workspace = GoogleWorkspace::from_settings(&settings).with_context(|| {
        format!(
            "Failed to load credentials from {:?}",
            settings.service_account_file
        )
    })?;

    let lockdown = Lockdown::new(
        workspace.drive().clone(),
        LockdownOptions {
            domain: settings.domain.clone(),
            grace_days: settings.lockdown_grace_days,
            commit: cli.commit,
            output_parent: PathBuf::from("."),
        },
        ErrorLog::new(&cli.error_log),
    );

    let mut stdout = std::io::stdout();
    let summary = lockdown
        .run(&cli.email, &mut stdout)
        .await
        .with_context(|| format!("Lockdown failed for {}", cli.email))?;

    Ok(if summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
