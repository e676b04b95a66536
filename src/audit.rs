//! The audit run: validate, enumerate, fetch, report.

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::error::{AuditError, Result};
use crate::error_log::{format_chain, ErrorLog};
use crate::models::{FileRecord, ReportIndex, Source};
use crate::report::{format_file_line, Field, HtmlReportWriter, SpreadsheetReport, Template};
use crate::validate::{check_api, required_apis};
use crate::workspace::Workspace;

/// Which file spaces a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditScope {
    /// Shared drives, then every user.
    #[default]
    All,
    /// Shared drives only; users are never enumerated.
    SharedDrivesOnly,
    /// Users only; shared drives are never enumerated.
    UsersOnly,
}

impl AuditScope {
    pub fn includes_shared_drives(self) -> bool {
        !matches!(self, AuditScope::UsersOnly)
    }

    pub fn includes_users(self) -> bool {
        !matches!(self, AuditScope::SharedDrivesOnly)
    }
}

/// Per-run options.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Console columns.
    pub fields: Vec<Field>,
    pub scope: AuditScope,
    /// HTML template; `None` disables the HTML pages.
    pub html_template: Option<PathBuf>,
    /// Directory in which the run's `out-*` directory is created.
    pub output_parent: PathBuf,
    pub sheets: bool,
    /// Print full error chains on the console.
    pub debug: bool,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            fields: vec![Field::Name],
            scope: AuditScope::All,
            html_template: Some(PathBuf::from(crate::report::html::DEFAULT_TEMPLATE_FILE)),
            output_parent: PathBuf::from("."),
            sheets: false,
            debug: false,
        }
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunSummary {
    pub total_files: usize,
    pub html_dir: Option<PathBuf>,
    pub spreadsheet_url: Option<String>,
    /// Sources (or whole phases) skipped because of an error.
    pub failures: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// A required API could not be reached; nothing was enumerated.
    ValidationFailed,
    Completed(RunSummary),
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::ValidationFailed => 1,
            RunOutcome::Completed(_) => 0,
        }
    }
}

/// Runs one audit against a [`Workspace`].
pub struct Auditor<W> {
    workspace: W,
    domain: String,
    options: AuditOptions,
    error_log: ErrorLog,
}

impl<W: Workspace> Auditor<W> {
    pub fn new(workspace: W, domain: &str, options: AuditOptions, error_log: ErrorLog) -> Self {
        Self {
            workspace,
            domain: domain.to_string(),
            options,
            error_log,
        }
    }

    pub fn workspace(&self) -> &W {
        &self.workspace
    }

    pub async fn run(&self, out: &mut impl Write) -> Result<RunOutcome> {
        self.run_at(out, Local::now().naive_local()).await
    }

    /// Run with an explicit start time, used for the output directory and
    /// report titles.
    pub async fn run_at(&self, out: &mut impl Write, started: NaiveDateTime) -> Result<RunOutcome> {
        if !self.validate_apis(out).await? {
            return Ok(RunOutcome::ValidationFailed);
        }

        let html = match &self.options.html_template {
            Some(path) => {
                let template = Template::from_file(path)?;
                Some(HtmlReportWriter::create(
                    template,
                    &self.options.output_parent,
                    started,
                    &self.domain,
                )?)
            }
            None => None,
        };

        let mut index = ReportIndex::new();
        let mut summary = RunSummary::default();

        if self.options.scope.includes_shared_drives() {
            self.audit_shared_drives(out, &mut index, html.as_ref(), &mut summary)
                .await?;
        }

        if self.options.scope.includes_users() {
            self.audit_users(out, &mut index, html.as_ref(), &mut summary)
                .await?;
        } else {
            writeln!(out, "\nSkipping user auditing (shared drives only mode)")?;
        }

        summary.total_files = index.total_files();
        if self.options.scope == AuditScope::SharedDrivesOnly {
            writeln!(out, "\nTotal shared drive files found: {}", summary.total_files)?;
        } else {
            writeln!(out, "\nTotal publicly shared files found: {}", summary.total_files)?;
        }

        if self.options.sheets {
            writeln!(out, "Creating spreadsheet report...")?;
            let report = SpreadsheetReport::build(&index, &self.domain, started);
            match self.workspace.publish_spreadsheet(&report).await {
                Ok(url) => {
                    writeln!(out, "Spreadsheet report created: {}", url)?;
                    summary.spreadsheet_url = Some(url);
                }
                Err(e) => {
                    let err = AuditError::report_write("spreadsheet", e);
                    self.handle_error(out, "Creating spreadsheet report", &err, "")?;
                    summary.failures += 1;
                }
            }
        }

        if let Some(writer) = &html {
            if self.options.scope == AuditScope::SharedDrivesOnly {
                writeln!(out, "HTML report for shared drives generated in: {}", writer.out_dir().display())?;
            } else {
                writeln!(out, "HTML reports generated in: {}", writer.out_dir().display())?;
            }
            summary.html_dir = Some(writer.out_dir().to_path_buf());
        }
        writeln!(out, "done.")?;

        info!(total = summary.total_files, failures = summary.failures, "audit finished");
        Ok(RunOutcome::Completed(summary))
    }

    /// Probe every required API, reporting each failure. True when all pass.
    async fn validate_apis(&self, out: &mut impl Write) -> Result<bool> {
        writeln!(out, "Validating Google APIs...")?;

        let mut all_good = true;
        for api in required_apis(self.options.sheets) {
            if let Err(e) = check_api(&self.workspace, api).await {
                all_good = false;
                self.log_error(out, &format!("{} test", api), &e)?;
                match &e {
                    AuditError::ApiUnavailable {
                        activation_url: Some(url),
                        ..
                    } => {
                        writeln!(out, "ERROR: {} is not enabled.", api)?;
                        writeln!(out, "Enable it here: {}", url)?;
                    }
                    _ => writeln!(out, "ERROR: {} test failed: {}", api, e)?,
                }
                self.print_trace(out, &e, "")?;
            }
        }

        if !all_good {
            writeln!(
                out,
                "\nPlease enable the required APIs using the links above, then re-run the audit."
            )?;
            return Ok(false);
        }

        writeln!(out, "All required APIs are enabled.")?;
        Ok(true)
    }

    async fn audit_shared_drives(
        &self,
        out: &mut impl Write,
        index: &mut ReportIndex,
        html: Option<&HtmlReportWriter>,
        summary: &mut RunSummary,
    ) -> Result<()> {
        writeln!(out, "\nAuditing shared drives...")?;

        let drives = match self.workspace.list_shared_drives().await {
            Ok(drives) => drives,
            Err(e) => {
                writeln!(out, "Error processing shared drives: {}", e)?;
                self.handle_error(out, "Listing shared drives", &e, "")?;
                summary.failures += 1;
                return Ok(());
            }
        };

        let mut bucket: Vec<FileRecord> = Vec::new();
        for drive in &drives {
            writeln!(out, "\nShared Drive: {}", drive.name)?;
            match self.workspace.shared_drive_public_files(drive).await {
                Ok(files) => {
                    self.print_files(out, &files)?;
                    bucket.extend(files);
                }
                Err(e) => {
                    let err = AuditError::source_fetch(&drive.name, e);
                    writeln!(out, "    Error accessing shared drive: {}", err)?;
                    self.handle_error(
                        out,
                        &format!("Accessing shared drive: {}", drive.name),
                        &err,
                        "    ",
                    )?;
                    summary.failures += 1;
                }
            }
        }

        let count = bucket.len();
        if let Some(writer) = html {
            if !bucket.is_empty() {
                self.write_page(out, writer, &Source::SharedDrives, &bucket, summary)?;
            }
        }
        index.record(Source::SharedDrives, bucket);

        writeln!(out, "\nTotal shared drive files: {}", count)?;
        Ok(())
    }

    async fn audit_users(
        &self,
        out: &mut impl Write,
        index: &mut ReportIndex,
        html: Option<&HtmlReportWriter>,
        summary: &mut RunSummary,
    ) -> Result<()> {
        writeln!(out, "\nAuditing user files...")?;

        let users = match self.workspace.list_users().await {
            Ok(users) => users,
            Err(e) => {
                writeln!(out, "Error listing domain users: {}", e)?;
                self.handle_error(out, "Listing domain users", &e, "")?;
                summary.failures += 1;
                return Ok(());
            }
        };
        debug!(count = users.len(), "auditing users");

        for user in &users {
            let email = &user.primary_email;
            writeln!(out, "\n{}:", email)?;

            let files = match self.workspace.user_public_files(email).await {
                Ok(files) => files,
                Err(e) => {
                    let err = AuditError::source_fetch(email, e);
                    writeln!(out, "    Error accessing user's files: {}", err)?;
                    self.handle_error(
                        out,
                        &format!("Accessing files for user: {}", email),
                        &err,
                        "    ",
                    )?;
                    summary.failures += 1;
                    continue;
                }
            };

            self.print_files(out, &files)?;
            let source = Source::user(user);
            if let Some(writer) = html {
                if !files.is_empty() {
                    self.write_page(out, writer, &source, &files, summary)?;
                }
            }
            index.record(source, files);
        }
        Ok(())
    }

    fn print_files(&self, out: &mut impl Write, files: &[FileRecord]) -> Result<()> {
        if files.is_empty() {
            writeln!(out, "    No publicly shared files found")?;
        }
        for file in files {
            writeln!(out, "    {}", format_file_line(file, &self.options.fields))?;
        }
        Ok(())
    }

    fn write_page(
        &self,
        out: &mut impl Write,
        writer: &HtmlReportWriter,
        source: &Source,
        files: &[FileRecord],
        summary: &mut RunSummary,
    ) -> Result<()> {
        if let Err(e) = writer.write_page(source, files) {
            let err = AuditError::report_write("HTML", e);
            writeln!(out, "    Error writing HTML report: {}", err)?;
            self.handle_error(
                out,
                &format!("Writing HTML report for {}", source.label()),
                &err,
                "    ",
            )?;
            summary.failures += 1;
        }
        Ok(())
    }

    /// Log a handled error: error log, tracing, and the trace in debug mode.
    fn handle_error(
        &self,
        out: &mut impl Write,
        context: &str,
        error: &AuditError,
        indent: &str,
    ) -> Result<()> {
        warn!(context, status = ?error.status(), error = %error, "skipping after error");
        self.log_error(out, context, error)?;
        self.print_trace(out, error, indent)
    }

    fn log_error(&self, out: &mut impl Write, context: &str, error: &dyn Error) -> Result<()> {
        match self.error_log.record(context, error) {
            Ok(()) => writeln!(out, "Error logged to: {}", self.error_log.path().display())?,
            Err(e) => writeln!(out, "Failed to log error: {}", e)?,
        }
        Ok(())
    }

    fn print_trace(&self, out: &mut impl Write, error: &dyn Error, indent: &str) -> Result<()> {
        if self.options.debug {
            writeln!(out, "{}DEBUG: Full trace:", indent)?;
            for line in format_chain(error).lines() {
                writeln!(out, "{}{}", indent, line)?;
            }
        }
        Ok(())
    }
}
