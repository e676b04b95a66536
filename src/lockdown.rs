//! Replace "anyone with the link" sharing on a user's stale files with an
//! equivalent domain-only grant.
//!
//! Files modified within the grace period are left alone. Without `commit`
//! the run only reports what it would change.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, Utc};
use tracing::{debug, warn};

use crate::drive::DriveClient;
use crate::error::{AuditError, Result};
use crate::error_log::ErrorLog;
use crate::models::{FileRecord, Permission};

/// Role shown for files whose public grant could not be found.
pub const UNKNOWN_ROLE: &str = "unknown";

/// Drive calls needed by a lockdown run.
#[allow(async_fn_in_trait)]
pub trait PermissionStore {
    async fn user_public_files(&self, email: &str) -> Result<Vec<FileRecord>>;

    async fn restrict_to_domain(
        &self,
        owner_email: &str,
        file_id: &str,
        role: &str,
        domain: &str,
    ) -> Result<Permission>;
}

impl PermissionStore for DriveClient {
    async fn user_public_files(&self, email: &str) -> Result<Vec<FileRecord>> {
        DriveClient::user_public_files(self, email).await
    }

    async fn restrict_to_domain(
        &self,
        owner_email: &str,
        file_id: &str,
        role: &str,
        domain: &str,
    ) -> Result<Permission> {
        DriveClient::restrict_to_domain(self, owner_email, file_id, role, domain).await
    }
}

/// Latest modification time a file may have and still be locked down.
pub fn cutoff(now: DateTime<Utc>, grace_days: i64) -> Result<DateTime<Utc>> {
    TimeDelta::try_days(grace_days)
        .and_then(|grace| now.checked_sub_signed(grace))
        .ok_or_else(|| {
            AuditError::Settings(format!(
                "lockdown grace period of {} days is out of range",
                grace_days
            ))
        })
}

/// Keep files last modified before `cutoff`. Files without a parseable
/// modification time are kept.
pub fn filter_unmodified_since(files: Vec<FileRecord>, cutoff: DateTime<Utc>) -> Vec<FileRecord> {
    files
        .into_iter()
        .filter(|f| {
            f.modified_time
                .as_deref()
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map_or(true, |t| t.with_timezone(&Utc) < cutoff)
        })
        .collect()
}

/// `out-ld-<user>-at-<domain>-YYYYMMDD-HHMMSS.tsv`
pub fn report_file_name(email: &str, started: NaiveDateTime) -> String {
    format!(
        "out-ld-{}-{}.tsv",
        email.replace('@', "-at-"),
        started.format("%Y%m%d-%H%M%S")
    )
}

#[derive(Debug, Clone)]
pub struct LockdownOptions {
    pub domain: String,
    pub grace_days: i64,
    /// Apply changes; otherwise only report.
    pub commit: bool,
    pub output_parent: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LockdownSummary {
    pub public_files: usize,
    pub candidates: usize,
    pub restricted: usize,
    pub failed: usize,
    pub report_path: PathBuf,
}

/// Runs a lockdown for one user.
pub struct Lockdown<S> {
    store: S,
    options: LockdownOptions,
    error_log: ErrorLog,
}

impl<S: PermissionStore> Lockdown<S> {
    pub fn new(store: S, options: LockdownOptions, error_log: ErrorLog) -> Self {
        Self {
            store,
            options,
            error_log,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run(&self, email: &str, out: &mut impl Write) -> Result<LockdownSummary> {
        self.run_at(email, out, Utc::now(), Local::now().naive_local())
            .await
    }

    pub async fn run_at(
        &self,
        email: &str,
        out: &mut impl Write,
        now: DateTime<Utc>,
        started: NaiveDateTime,
    ) -> Result<LockdownSummary> {
        let cutoff = cutoff(now, self.options.grace_days)?;
        writeln!(out, "Last modified cutoff will be: {}", cutoff.to_rfc3339())?;

        writeln!(out, "Getting public files for {}...", email)?;
        let public_files = self.store.user_public_files(email).await?;
        let public_count = public_files.len();
        writeln!(out, "    {} public files found", public_count)?;

        let candidates = filter_unmodified_since(public_files, cutoff);
        writeln!(
            out,
            "    {} public files modified since cutoff",
            public_count - candidates.len()
        )?;
        writeln!(out, "    {} remaining public files found", candidates.len())?;
        if !self.options.commit {
            writeln!(out, "Dry run: no sharing settings will be changed.")?;
        }

        let report_path = self
            .options
            .output_parent
            .join(report_file_name(email, started));
        let mut report = File::create(&report_path)?;

        let mut restricted = 0;
        let mut failed = 0;
        for file in &candidates {
            let role = file.public_role().unwrap_or(UNKNOWN_ROLE);
            let line = format!("{}\t{}\t{}", role, file.web_view_link, file.name);
            writeln!(out, "{}", line)?;
            writeln!(report, "{}", line)?;

            if !self.options.commit {
                continue;
            }
            if file.public_role().is_none() {
                // Usually inherited from a public parent folder.
                debug!(file = %file.id, "no direct public permission, leaving unchanged");
                continue;
            }

            match self
                .store
                .restrict_to_domain(email, &file.id, role, &self.options.domain)
                .await
            {
                Ok(_) => restricted += 1,
                Err(e) => {
                    failed += 1;
                    warn!(file = %file.id, error = %e, "could not restrict file");
                    writeln!(out, "    Could not restrict {}: {}", file.name, e)?;
                    self.record_failure(out, file, &e)?;
                }
            }
        }
        report.flush()?;

        writeln!(out, "Report written to: {}", report_path.display())?;
        if self.options.commit {
            writeln!(out, "{} files restricted to {}, {} failed", restricted, self.options.domain, failed)?;
        }

        Ok(LockdownSummary {
            public_files: public_count,
            candidates: candidates.len(),
            restricted,
            failed,
            report_path,
        })
    }

    fn record_failure(&self, out: &mut impl Write, file: &FileRecord, error: &AuditError) -> Result<()> {
        if let Err(e) = self
            .error_log
            .record(&format!("Restricting sharing on file: {}", file.id), error)
        {
            writeln!(out, "Failed to log error: {}", e)?;
        }
        Ok(())
    }
}
