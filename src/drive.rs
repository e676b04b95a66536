//! Google Drive API client: public-file queries, shared drives and
//! permission rewrites.

use serde_json::json;
use tracing::debug;

use crate::auth::Scope;
use crate::client::ApiClient;
use crate::error::Result;
use crate::models::{
    DriveListResponse, FileListResponse, FileRecord, Permission, SharedDriveRecord,
    DISCOVERABLE_PERMISSION_ID, PUBLIC_PERMISSION_ID,
};

/// Fields requested for every public-file listing.
const FILE_FIELDS: &str =
    "nextPageToken, files(id, name, webViewLink, modifiedTime, permissions(id, role, type))";

/// Drive query matching files anyone can open, optionally restricted to an owner.
pub fn public_files_query(owner: Option<&str>) -> String {
    let visibility = format!(
        "(visibility='{}' or visibility='{}')",
        PUBLIC_PERMISSION_ID, DISCOVERABLE_PERMISSION_ID
    );
    match owner {
        Some(email) => format!("'{}' in owners and {}", escape_query(email), visibility),
        None => visibility,
    }
}

fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Client for the Drive v3 API.
#[derive(Clone)]
pub struct DriveClient {
    api: ApiClient,
    base_url: String,
    admin_email: String,
}

impl DriveClient {
    pub fn new(api: ApiClient, base_url: &str, admin_email: &str) -> Self {
        Self {
            api,
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_email: admin_email.to_string(),
        }
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.base_url)
    }

    /// Public files owned by `email`, queried while impersonating that user.
    pub async fn user_public_files(&self, email: &str) -> Result<Vec<FileRecord>> {
        let query = public_files_query(Some(email));
        let files = self
            .api
            .get_paginated::<FileListResponse>(
                &self.files_url(),
                email,
                Scope::Audit,
                &[("q", query.as_str()), ("pageSize", "1000"), ("fields", FILE_FIELDS)],
            )
            .await?;
        debug!(email, count = files.len(), "fetched user public files");
        Ok(files)
    }

    /// Every shared drive in the domain, listed with admin access.
    pub async fn list_shared_drives(&self) -> Result<Vec<SharedDriveRecord>> {
        let drives = self
            .api
            .get_paginated::<DriveListResponse>(
                &format!("{}/drives", self.base_url),
                &self.admin_email,
                Scope::SharedDrives,
                &[
                    ("useDomainAdminAccess", "true"),
                    ("pageSize", "100"),
                    ("fields", "nextPageToken, drives(id, name)"),
                ],
            )
            .await?;
        debug!(count = drives.len(), "listed shared drives");
        Ok(drives)
    }

    /// Public files resident in one shared drive, tagged with the drive name.
    pub async fn shared_drive_public_files(
        &self,
        drive: &SharedDriveRecord,
    ) -> Result<Vec<FileRecord>> {
        let query = public_files_query(None);
        let files = self
            .api
            .get_paginated::<FileListResponse>(
                &self.files_url(),
                &self.admin_email,
                Scope::SharedDrives,
                &[
                    ("q", query.as_str()),
                    ("corpora", "drive"),
                    ("driveId", drive.id.as_str()),
                    ("includeItemsFromAllDrives", "true"),
                    ("supportsAllDrives", "true"),
                    ("pageSize", "1000"),
                    ("fields", FILE_FIELDS),
                ],
            )
            .await?;
        debug!(drive = %drive.name, count = files.len(), "fetched shared drive public files");
        Ok(files
            .into_iter()
            .map(|f| f.in_shared_drive(&drive.name))
            .collect())
    }

    /// Smallest possible call that proves the API is enabled and delegated.
    pub async fn probe(&self) -> Result<()> {
        let _: FileListResponse = self
            .api
            .get_json(
                &self.files_url(),
                &self.admin_email,
                Scope::Audit,
                &[("q", "'me' in owners"), ("pageSize", "1")],
            )
            .await?;
        Ok(())
    }

    /// Replace the "anyone with the link" grant on a file with a domain grant
    /// of the same role, acting as the file's owner.
    pub async fn restrict_to_domain(
        &self,
        owner_email: &str,
        file_id: &str,
        role: &str,
        domain: &str,
    ) -> Result<Permission> {
        let permissions_url = format!("{}/files/{}/permissions", self.base_url, file_id);

        self.api
            .delete(
                &format!("{}/{}", permissions_url, PUBLIC_PERMISSION_ID),
                owner_email,
                Scope::Lockdown,
                &[("supportsAllDrives", "true")],
            )
            .await?;

        let replacement = json!({
            "role": role,
            "type": "domain",
            "domain": domain,
        });
        self.api
            .post_json(
                &permissions_url,
                owner_email,
                Scope::Lockdown,
                &[("supportsAllDrives", "true"), ("fields", "id, role, type")],
                &replacement,
            )
            .await
    }
}
