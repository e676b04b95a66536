//! Consolidated spreadsheet report: a Dashboard tab plus one tab per source.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde_json::{json, Value};

use crate::models::{ReportIndex, Source};
use crate::report::console::MISSING_VALUE;

pub const DASHBOARD_TAB: &str = "Dashboard";
pub const SHARED_DRIVES_TAB: &str = "Shared Drives";

/// Longest tab title derived from a user's email.
pub const MAX_TAB_TITLE_CHARS: usize = 30;

const REPORT_HEADING: &str = "Drive Audit Report";

/// One tab and the rows written into it starting at A1.
#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    pub title: String,
    pub rows: Vec<Vec<String>>,
}

/// Everything needed to create and fill the report spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadsheetReport {
    pub title: String,
    /// Dashboard first, then one tab per non-empty source in discovery order.
    pub tabs: Vec<Tab>,
}

/// Hands out tab titles, keeping them unique within one spreadsheet.
#[derive(Debug)]
struct TabTitles {
    /// Lowercased titles already handed out.
    taken: HashSet<String>,
}

impl TabTitles {
    fn new() -> Self {
        Self {
            taken: [DASHBOARD_TAB, SHARED_DRIVES_TAB]
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
        }
    }

    /// Sheets compares tab names case-insensitively, beyond ASCII too.
    fn is_taken(&self, title: &str) -> bool {
        self.taken.contains(&title.to_lowercase())
    }

    /// Title for a user: the email's local part, at most 30 characters,
    /// with a ` (n)` suffix on collision.
    fn for_user(&mut self, email: &str) -> String {
        let local = email.split('@').next().unwrap_or(email);
        let base: String = local.chars().take(MAX_TAB_TITLE_CHARS).collect();

        let mut title = base.clone();
        let mut n = 2;
        while title.is_empty() || self.is_taken(&title) {
            let suffix = format!(" ({})", n);
            let keep = MAX_TAB_TITLE_CHARS - suffix.chars().count();
            title = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
            n += 1;
        }
        self.taken.insert(title.to_lowercase());
        title
    }
}

impl SpreadsheetReport {
    /// Lay out the report for `index`. Pure: no API calls.
    pub fn build(index: &ReportIndex, domain: &str, audited_at: NaiveDateTime) -> Self {
        let stamp = audited_at.format("%Y-%m-%d %H:%M:%S").to_string();
        let mut titles = TabTitles::new();
        let mut summary = Vec::new();
        let mut source_tabs = Vec::new();

        for (source, files) in index.non_empty() {
            let (title, label, shared) = match source {
                Source::SharedDrives => {
                    (SHARED_DRIVES_TAB.to_string(), SHARED_DRIVES_TAB.to_string(), true)
                }
                Source::User { email, .. } => (titles.for_user(email), email.clone(), false),
            };

            let mut header = vec![
                "File Name".to_string(),
                "Share Link".to_string(),
                "File ID".to_string(),
                "Modified Time".to_string(),
            ];
            if shared {
                header.push("Shared Drive".to_string());
            }

            let mut rows = vec![header];
            for file in files {
                let mut row = vec![
                    file.name.clone(),
                    file.web_view_link.clone(),
                    file.id.clone(),
                    file.modified_time
                        .clone()
                        .unwrap_or_else(|| MISSING_VALUE.to_string()),
                ];
                if shared {
                    row.push(
                        file.shared_drive_name
                            .clone()
                            .unwrap_or_else(|| MISSING_VALUE.to_string()),
                    );
                }
                rows.push(row);
            }

            summary.push(vec![label, files.len().to_string(), title.clone()]);
            source_tabs.push(Tab { title, rows });
        }

        let mut dashboard = vec![
            vec![REPORT_HEADING.to_string()],
            vec![String::new()],
            vec!["Audit Date:".to_string(), stamp.clone()],
            vec!["Domain:".to_string(), domain.to_string()],
            vec!["Total Public Files:".to_string(), index.total_files().to_string()],
            vec![
                "Users with Public Files:".to_string(),
                index.users_with_files().to_string(),
            ],
            vec![
                "Shared Drive Public Files:".to_string(),
                index.shared_drive_files().to_string(),
            ],
            vec![String::new()],
            vec!["Summary:".to_string()],
            vec![
                "Source".to_string(),
                "Files Count".to_string(),
                "Sheet Tab".to_string(),
            ],
        ];
        dashboard.extend(summary);

        let mut tabs = vec![Tab {
            title: DASHBOARD_TAB.to_string(),
            rows: dashboard,
        }];
        tabs.extend(source_tabs);

        Self {
            title: format!("{} - {}", REPORT_HEADING, stamp),
            tabs,
        }
    }

    /// Body for `spreadsheets.create`, declaring every tab up front.
    pub fn create_request(&self) -> Value {
        let sheets: Vec<Value> = self
            .tabs
            .iter()
            .map(|tab| json!({ "properties": { "title": tab.title } }))
            .collect();
        json!({
            "properties": { "title": self.title },
            "sheets": sheets,
        })
    }

    /// Body for `values:batchUpdate`, writing every tab in one call.
    pub fn values_request(&self) -> Value {
        let data: Vec<Value> = self
            .tabs
            .iter()
            .map(|tab| json!({ "range": a1_range(&tab.title), "values": tab.rows }))
            .collect();
        json!({
            "valueInputOption": "RAW",
            "data": data,
        })
    }
}

/// `'<title>'!A1`, with embedded quotes doubled.
pub fn a1_range(title: &str) -> String {
    format!("'{}'!A1", title.replace('\'', "''"))
}
