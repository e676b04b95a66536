//! The set of Google Workspace calls the audit depends on.

use std::path::Path;

use crate::auth::Authenticator;
use crate::client::ApiClient;
use crate::config::Settings;
use crate::directory::DirectoryClient;
use crate::drive::DriveClient;
use crate::error::Result;
use crate::models::{FileRecord, SharedDriveRecord, UserRecord};
use crate::report::SpreadsheetReport;
use crate::sheets::SheetsClient;

/// Every external call made by [`Auditor`](crate::audit::Auditor).
///
/// Implemented by [`GoogleWorkspace`] for real runs and by in-memory doubles
/// in tests.
#[allow(async_fn_in_trait)]
pub trait Workspace {
    async fn probe_directory(&self) -> Result<()>;
    async fn probe_drive(&self) -> Result<()>;
    async fn probe_sheets(&self) -> Result<()>;

    async fn list_users(&self) -> Result<Vec<UserRecord>>;
    async fn list_shared_drives(&self) -> Result<Vec<SharedDriveRecord>>;

    async fn user_public_files(&self, email: &str) -> Result<Vec<FileRecord>>;
    async fn shared_drive_public_files(
        &self,
        drive: &SharedDriveRecord,
    ) -> Result<Vec<FileRecord>>;

    /// Create the report spreadsheet and return its URL.
    async fn publish_spreadsheet(&self, report: &SpreadsheetReport) -> Result<String>;
}

/// Live implementation backed by the Directory, Drive and Sheets APIs.
#[derive(Clone)]
pub struct GoogleWorkspace {
    directory: DirectoryClient,
    drive: DriveClient,
    sheets: SheetsClient,
}

impl GoogleWorkspace {
    pub fn new(auth: Authenticator, settings: &Settings) -> Self {
        let auth = match &settings.endpoints.token {
            Some(uri) => auth.with_token_uri(uri.clone()),
            None => auth,
        };
        let api = ApiClient::new(auth);
        let endpoints = &settings.endpoints;
        Self {
            directory: DirectoryClient::new(
                api.clone(),
                &endpoints.directory,
                &settings.domain,
                &settings.admin_email,
            ),
            drive: DriveClient::new(api.clone(), &endpoints.drive, &settings.admin_email),
            sheets: SheetsClient::new(api, &endpoints.sheets, &settings.admin_email),
        }
    }

    /// Load the service account key named in the settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let auth = Authenticator::from_file(Path::new(&settings.service_account_file))?;
        Ok(Self::new(auth, settings))
    }

    pub fn drive(&self) -> &DriveClient {
        &self.drive
    }
}

impl Workspace for GoogleWorkspace {
    async fn probe_directory(&self) -> Result<()> {
        self.directory.probe().await
    }

    async fn probe_drive(&self) -> Result<()> {
        self.drive.probe().await
    }

    async fn probe_sheets(&self) -> Result<()> {
        self.sheets.probe().await
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        self.directory.list_users().await
    }

    async fn list_shared_drives(&self) -> Result<Vec<SharedDriveRecord>> {
        self.drive.list_shared_drives().await
    }

    async fn user_public_files(&self, email: &str) -> Result<Vec<FileRecord>> {
        self.drive.user_public_files(email).await
    }

    async fn shared_drive_public_files(
        &self,
        drive: &SharedDriveRecord,
    ) -> Result<Vec<FileRecord>> {
        self.drive.shared_drive_public_files(drive).await
    }

    async fn publish_spreadsheet(&self, report: &SpreadsheetReport) -> Result<String> {
        self.sheets.publish(report).await
    }
}
