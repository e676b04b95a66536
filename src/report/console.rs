//! Console line formatting.

use std::fmt;

use crate::models::FileRecord;

/// A column the operator can ask for on the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Name,
    Link,
    Id,
    Modified,
}

impl Field {
    /// Output order, independent of the order fields were requested in.
    pub const ALL: [Field; 4] = [Field::Name, Field::Link, Field::Id, Field::Modified];
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Name => "name",
            Field::Link => "link",
            Field::Id => "id",
            Field::Modified => "modified",
        };
        f.write_str(name)
    }
}

/// Placeholder for a missing modification time.
pub const MISSING_VALUE: &str = "N/A";

/// Name as shown in reports; shared drive files carry their drive name.
pub fn display_name(file: &FileRecord) -> String {
    match (file.is_shared_drive_file, file.shared_drive_name.as_deref()) {
        (true, Some(drive)) => format!("{} (Shared Drive: {})", file.name, drive),
        _ => file.name.clone(),
    }
}

/// Render one file as `" | "`-joined columns, in the fixed field order.
pub fn format_file_line(file: &FileRecord, fields: &[Field]) -> String {
    Field::ALL
        .iter()
        .filter(|f| fields.contains(f))
        .map(|f| match f {
            Field::Name => display_name(file),
            Field::Link => file.web_view_link.clone(),
            Field::Id => file.id.clone(),
            Field::Modified => file
                .modified_time
                .clone()
                .unwrap_or_else(|| MISSING_VALUE.to_string()),
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
