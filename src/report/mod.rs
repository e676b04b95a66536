//! Report sinks. Each consumes the same [`ReportIndex`](crate::models::ReportIndex)
//! and none of them depends on the others.

pub mod console;
pub mod html;
pub mod spreadsheet;

pub use console::{format_file_line, Field};
pub use html::{HtmlReportWriter, Template};
pub use spreadsheet::SpreadsheetReport;
