//! Data models for Google API responses and the in-memory audit index.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Permission id Google uses for "anyone with the link" grants.
pub const PUBLIC_PERMISSION_ID: &str = "anyoneWithLink";

/// Permission id Google uses for "anyone can find" grants.
pub const DISCOVERABLE_PERMISSION_ID: &str = "anyoneCanFind";

/// A publicly shared file found by the audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub web_view_link: String,
    #[serde(default)]
    pub modified_time: Option<String>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    /// Set by the finder for files that live in a shared drive.
    #[serde(skip)]
    pub is_shared_drive_file: bool,
    #[serde(skip)]
    pub shared_drive_name: Option<String>,
}

impl FileRecord {
    /// Tag the record as belonging to the named shared drive.
    pub fn in_shared_drive(mut self, drive_name: &str) -> Self {
        self.is_shared_drive_file = true;
        self.shared_drive_name = Some(drive_name.to_string());
        self
    }

    /// Role granted by the "anyone with the link" permission, if present.
    pub fn public_role(&self) -> Option<&str> {
        self.permissions
            .iter()
            .find(|p| p.id == PUBLIC_PERMISSION_ID)
            .and_then(|p| p.role.as_deref())
    }
}

/// A single permission entry on a Drive file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub id: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// A user account in the domain.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub primary_email: String,
    pub display_name: String,
}

/// A shared drive in the domain.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SharedDriveRecord {
    pub id: String,
    pub name: String,
}

/// Where a list of public files was found.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    User { email: String, display_name: String },
    /// All shared drives, reported as one bucket.
    SharedDrives,
}

impl Source {
    pub fn user(user: &UserRecord) -> Self {
        Source::User {
            email: user.primary_email.clone(),
            display_name: user.display_name.clone(),
        }
    }

    /// Human-facing label: the user's email or "Shared Drives".
    pub fn label(&self) -> &str {
        match self {
            Source::User { email, .. } => email,
            Source::SharedDrives => "Shared Drives",
        }
    }
}

/// Public files grouped by source, in discovery order.
#[derive(Debug, Default, Clone)]
pub struct ReportIndex {
    entries: Vec<(Source, Vec<FileRecord>)>,
    positions: HashMap<Source, usize>,
}

impl ReportIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the files found for a source. Recording the same source again
    /// appends to its existing list.
    pub fn record(&mut self, source: Source, files: Vec<FileRecord>) {
        match self.positions.get(&source) {
            Some(&i) => self.entries[i].1.extend(files),
            None => {
                self.positions.insert(source.clone(), self.entries.len());
                self.entries.push((source, files));
            }
        }
    }

    pub fn get(&self, source: &Source) -> Option<&[FileRecord]> {
        self.positions
            .get(source)
            .map(|&i| self.entries[i].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Source, &[FileRecord])> {
        self.entries.iter().map(|(s, f)| (s, f.as_slice()))
    }

    /// Sources with at least one public file.
    pub fn non_empty(&self) -> impl Iterator<Item = (&Source, &[FileRecord])> {
        self.iter().filter(|(_, files)| !files.is_empty())
    }

    pub fn total_files(&self) -> usize {
        self.entries.iter().map(|(_, files)| files.len()).sum()
    }

    pub fn users_with_files(&self) -> usize {
        self.non_empty()
            .filter(|(s, _)| matches!(s, Source::User { .. }))
            .count()
    }

    pub fn shared_drive_files(&self) -> usize {
        self.get(&Source::SharedDrives).map_or(0, |f| f.len())
    }
}

/// Response from the Drive files.list API endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Response from the Drive drives.list API endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveListResponse {
    #[serde(default)]
    pub drives: Vec<SharedDriveRecord>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// User name block from the Directory API.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserName {
    pub given_name: Option<String>,
    pub full_name: Option<String>,
}

/// User resource from the Directory API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    pub primary_email: String,
    #[serde(default)]
    pub name: UserName,
}

impl From<DirectoryUser> for UserRecord {
    fn from(user: DirectoryUser) -> Self {
        let display_name = user
            .name
            .given_name
            .or(user.name.full_name)
            .unwrap_or_else(|| user.primary_email.clone());
        UserRecord {
            primary_email: user.primary_email,
            display_name,
        }
    }
}

/// Response from the Directory users.list API endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    #[serde(default)]
    pub users: Vec<DirectoryUser>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Response from spreadsheets.create.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetCreated {
    pub spreadsheet_id: String,
    pub spreadsheet_url: String,
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}

/// Service account credentials from JSON file.
#[derive(Debug, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: Option<String>,
}

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: u64,
}
