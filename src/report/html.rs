//! Per-source HTML pages rendered from a notification template.
//!
//! The template uses `{name}`, `{result_elem}` and `{email}` placeholders;
//! `{{` and `}}` stand for literal braces so that inline CSS survives.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::{AuditError, Result};
use crate::models::{FileRecord, Source};

/// Default template file name, looked up in the working directory.
pub const DEFAULT_TEMPLATE_FILE: &str = "email_template.html";

/// File name of the page for the shared drive bucket.
pub const SHARED_DRIVES_PAGE: &str = "shared-drives.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Name,
    ResultElem,
    Email,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field(Placeholder),
}

/// A parsed page template.
#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| {
            AuditError::Template(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&source)
    }

    /// Parse template text, rejecting unknown placeholders and stray braces.
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut key = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => key.push(ch),
                            None => {
                                return Err(AuditError::Template(format!(
                                    "unterminated placeholder '{{{}'",
                                    key
                                )))
                            }
                        }
                    }
                    let field = match key.as_str() {
                        "name" => Placeholder::Name,
                        "result_elem" => Placeholder::ResultElem,
                        "email" => Placeholder::Email,
                        other => {
                            return Err(AuditError::Template(format!(
                                "unknown placeholder '{{{}}}'",
                                other
                            )))
                        }
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
                '}' => {
                    return Err(AuditError::Template(
                        "single '}' encountered; use '}}' for a literal brace".to_string(),
                    ))
                }
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Substitute the placeholders. Values are inserted verbatim.
    pub fn render(&self, name: &str, result_elem: &str, email: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(Placeholder::Name) => out.push_str(name),
                Segment::Field(Placeholder::ResultElem) => out.push_str(result_elem),
                Segment::Field(Placeholder::Email) => out.push_str(email),
            }
        }
        out
    }
}

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// One `<li>` per file; shared drive files name their drive.
pub fn result_items(files: &[FileRecord]) -> String {
    let mut out = String::new();
    for file in files {
        let link = escape_html(&file.web_view_link);
        let name = escape_html(&file.name);
        match (file.is_shared_drive_file, file.shared_drive_name.as_deref()) {
            (true, Some(drive)) => out.push_str(&format!(
                "<li><a href=\"{}\">{}</a> (Shared Drive: {})</li>\n",
                link,
                name,
                escape_html(drive)
            )),
            _ => out.push_str(&format!("<li><a href=\"{}\">{}</a></li>\n", link, name)),
        }
    }
    out
}

/// Output directory name for a run started at `started`.
pub fn output_dir_name(started: NaiveDateTime) -> String {
    format!("out-{}", started.format("%Y%m%d-%H%M%S"))
}

/// Page file name for a source.
pub fn page_file_name(source: &Source) -> String {
    match source {
        Source::User { email, .. } => format!("{}.html", email.replace(['/', '\\'], "_")),
        Source::SharedDrives => SHARED_DRIVES_PAGE.to_string(),
    }
}

/// Writes one HTML page per source into a run-stamped directory.
#[derive(Debug)]
pub struct HtmlReportWriter {
    template: Template,
    out_dir: PathBuf,
    domain: String,
}

impl HtmlReportWriter {
    /// Create `<parent>/out-YYYYMMDD-HHMMSS`. Fails if it already exists.
    pub fn create(
        template: Template,
        parent: &Path,
        started: NaiveDateTime,
        domain: &str,
    ) -> Result<Self> {
        let out_dir = parent.join(output_dir_name(started));
        fs::create_dir(&out_dir)?;
        debug!(dir = %out_dir.display(), "created HTML output directory");
        Ok(Self {
            template,
            out_dir,
            domain: domain.to_string(),
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Render and write the page for one source, returning its path.
    pub fn write_page(&self, source: &Source, files: &[FileRecord]) -> Result<PathBuf> {
        let items = result_items(files);
        let page = match source {
            Source::User {
                email,
                display_name,
            } => self
                .template
                .render(&escape_html(display_name), &items, &escape_html(email)),
            Source::SharedDrives => self.template.render(
                "Shared Drives",
                &items,
                &format!("shared-drives@{}", escape_html(&self.domain)),
            ),
        };

        let path = self.out_dir.join(page_file_name(source));
        fs::write(&path, page)?;
        debug!(path = %path.display(), "wrote HTML page");
        Ok(path)
    }
}
