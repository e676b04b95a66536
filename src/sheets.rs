//! Google Sheets API client.

use serde_json::Value;
use tracing::debug;

use crate::auth::Scope;
use crate::client::ApiClient;
use crate::error::{AuditError, Result};
use crate::models::SpreadsheetCreated;
use crate::report::SpreadsheetReport;

/// Spreadsheet id used by the reachability probe. It never exists, so an
/// enabled API answers 404.
const PROBE_SPREADSHEET_ID: &str = "drive-audit-api-probe";

/// Creates and fills report spreadsheets in the administrator's Drive.
#[derive(Clone)]
pub struct SheetsClient {
    api: ApiClient,
    base_url: String,
    admin_email: String,
}

impl SheetsClient {
    pub fn new(api: ApiClient, base_url: &str, admin_email: &str) -> Self {
        Self {
            api,
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_email: admin_email.to_string(),
        }
    }

    /// Create the spreadsheet with all its tabs, then write every range in a
    /// single batch update. Returns the spreadsheet URL.
    pub async fn publish(&self, report: &SpreadsheetReport) -> Result<String> {
        let created: SpreadsheetCreated = self
            .api
            .post_json(
                &format!("{}/spreadsheets", self.base_url),
                &self.admin_email,
                Scope::Sheets,
                &[],
                &report.create_request(),
            )
            .await?;
        debug!(id = %created.spreadsheet_id, tabs = report.tabs.len(), "created spreadsheet");

        let _: Value = self
            .api
            .post_json(
                &format!(
                    "{}/spreadsheets/{}/values:batchUpdate",
                    self.base_url, created.spreadsheet_id
                ),
                &self.admin_email,
                Scope::Sheets,
                &[],
                &report.values_request(),
            )
            .await?;

        Ok(created.spreadsheet_url)
    }

    /// Look up a spreadsheet that does not exist. A 404 proves the API is
    /// enabled without creating anything.
    pub async fn probe(&self) -> Result<()> {
        let result: Result<Value> = self
            .api
            .get_json(
                &format!("{}/spreadsheets/{}", self.base_url, PROBE_SPREADSHEET_ID),
                &self.admin_email,
                Scope::Sheets,
                &[("fields", "spreadsheetId")],
            )
            .await;
        match result {
            Ok(_) | Err(AuditError::Api { status: 404, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
