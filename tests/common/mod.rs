#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use drive_audit::config::{Endpoints, Settings};
use drive_audit::models::ServiceAccountCredentials;
use drive_audit::report::SpreadsheetReport;
use drive_audit::{AuditError, Authenticator, FileRecord, GoogleWorkspace, Result, SharedDriveRecord, UserRecord, Workspace};
use mockito::{Mock, ServerGuard};
use serde_json::json;

/// Throwaway RSA key used only to sign test assertions.
pub const TEST_PRIVATE_KEY: &str = include_str!("../fixtures/test_service_account.pem");

pub const SERVICE_ACCOUNT: &str = "audit@test-project.iam.gserviceaccount.com";

pub fn credentials() -> ServiceAccountCredentials {
    ServiceAccountCredentials {
        client_email: SERVICE_ACCOUNT.to_string(),
        private_key: TEST_PRIVATE_KEY.to_string(),
        token_uri: None,
    }
}

/// Write a service account key file into `dir`.
pub fn write_credentials_file(dir: &Path) -> PathBuf {
    let path = dir.join("service-account.json");
    let body = json!({
        "type": "service_account",
        "client_email": SERVICE_ACCOUNT,
        "private_key": TEST_PRIVATE_KEY,
    });
    std::fs::write(&path, body.to_string()).unwrap();
    path
}

pub fn settings(base_url: &str) -> Settings {
    Settings {
        domain: "example.com".to_string(),
        admin_email: "admin@example.com".to_string(),
        service_account_file: PathBuf::from("unused.json"),
        lockdown_grace_days: 30,
        endpoints: Endpoints::with_base(base_url),
    }
}

pub fn workspace(server: &ServerGuard) -> GoogleWorkspace {
    GoogleWorkspace::new(Authenticator::new(credentials()), &settings(&server.url()))
}

/// Token endpoint that hands out `test-token` to any assertion.
pub async fn mock_token(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"access_token": "test-token", "token_type": "Bearer", "expires_in": 3600})
                .to_string(),
        )
        .create_async()
        .await
}

pub fn file(id: &str, name: &str, modified: Option<&str>) -> FileRecord {
    FileRecord {
        id: id.to_string(),
        name: name.to_string(),
        web_view_link: format!("https://drive.google.com/file/d/{}/view", id),
        modified_time: modified.map(str::to_string),
        permissions: Vec::new(),
        is_shared_drive_file: false,
        shared_drive_name: None,
    }
}

pub fn user(email: &str, display_name: &str) -> UserRecord {
    UserRecord {
        primary_email: email.to_string(),
        display_name: display_name.to_string(),
    }
}

/// In-memory workspace that records every call made against it.
#[derive(Default)]
pub struct FakeWorkspace {
    /// API name -> failure message returned by its probe.
    pub probe_failures: HashMap<&'static str, String>,
    pub users: Vec<UserRecord>,
    pub users_failure: Option<String>,
    pub drives: Vec<SharedDriveRecord>,
    pub drives_failure: Option<String>,
    /// Email or drive id -> files, or a failure message.
    pub files: HashMap<String, std::result::Result<Vec<FileRecord>, String>>,
    pub publish_failure: Option<String>,
    pub calls: RefCell<Vec<String>>,
    pub published: RefCell<Vec<SpreadsheetReport>>,
}

impl FakeWorkspace {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls.borrow().iter().any(|c| c.starts_with(prefix))
    }

    fn log(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn probe(&self, api: &'static str) -> Result<()> {
        self.log(format!("probe_{}", api));
        match self.probe_failures.get(api) {
            Some(message) => Err(AuditError::Api {
                status: 403,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn files_for(&self, key: &str) -> Result<Vec<FileRecord>> {
        match self.files.get(key) {
            Some(Ok(files)) => Ok(files.clone()),
            Some(Err(message)) => Err(AuditError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

impl Workspace for FakeWorkspace {
    async fn probe_directory(&self) -> Result<()> {
        self.probe("directory")
    }

    async fn probe_drive(&self) -> Result<()> {
        self.probe("drive")
    }

    async fn probe_sheets(&self) -> Result<()> {
        self.probe("sheets")
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        self.log("list_users".to_string());
        match &self.users_failure {
            Some(message) => Err(AuditError::Api {
                status: 403,
                message: message.clone(),
            }),
            None => Ok(self.users.clone()),
        }
    }

    async fn list_shared_drives(&self) -> Result<Vec<SharedDriveRecord>> {
        self.log("list_shared_drives".to_string());
        match &self.drives_failure {
            Some(message) => Err(AuditError::Api {
                status: 403,
                message: message.clone(),
            }),
            None => Ok(self.drives.clone()),
        }
    }

    async fn user_public_files(&self, email: &str) -> Result<Vec<FileRecord>> {
        self.log(format!("user_public_files:{}", email));
        self.files_for(email)
    }

    async fn shared_drive_public_files(
        &self,
        drive: &SharedDriveRecord,
    ) -> Result<Vec<FileRecord>> {
        self.log(format!("shared_drive_public_files:{}", drive.id));
        self.files_for(&drive.id)
            .map(|files| files.into_iter().map(|f| f.in_shared_drive(&drive.name)).collect())
    }

    async fn publish_spreadsheet(&self, report: &SpreadsheetReport) -> Result<String> {
        self.log("publish_spreadsheet".to_string());
        self.published.borrow_mut().push(report.clone());
        match &self.publish_failure {
            Some(message) => Err(AuditError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok("https://docs.google.com/spreadsheets/d/report".to_string()),
        }
    }
}
