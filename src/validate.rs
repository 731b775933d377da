use crate::error::{AttendanceError, Result};
use crate::record::{StudentRow, REQUIRED_COLUMNS};

/// Only spreadsheet exports we can parse are accepted.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "csv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Excel,
    Csv,
}

/// Raw add/edit form input, every field still text.
#[derive(Debug, Clone, Default)]
pub struct StudentForm {
    pub name: String,
    pub attended: String,
    pub total_classes: String,
    pub parent_mobile: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidStudent {
    pub name: String,
    pub attended: u32,
    pub total_classes: u32,
    pub parent_mobile: u64,
}

impl ValidStudent {
    pub fn into_row(self) -> StudentRow {
        StudentRow::new(self.name, self.attended, self.total_classes, self.parent_mobile)
    }
}

/// Checks an add/edit form. The first failing field wins: name, mobile,
/// then the two counts, then their relation.
pub fn validate(form: &StudentForm) -> Result<ValidStudent> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(AttendanceError::EmptyField(
            "Student name is required.".to_string(),
        ));
    }

    let mobile = form.parent_mobile.trim();
    if !is_valid_mobile(mobile) {
        return Err(AttendanceError::InvalidMobile);
    }
    let parent_mobile = mobile
        .parse::<u64>()
        .map_err(|_| AttendanceError::InvalidMobile)?;

    let attended = parse_count(&form.attended, "attended")?;
    let total_classes = parse_count(&form.total_classes, "totalClasses")?;
    if attended > total_classes {
        return Err(AttendanceError::AttendedExceedsTotal {
            attended,
            total_classes,
        });
    }

    Ok(ValidStudent {
        name: name.to_string(),
        attended,
        total_classes,
        parent_mobile,
    })
}

pub fn is_valid_mobile(s: &str) -> bool {
    s.len() == 10 && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_count(raw: &str, field: &'static str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| AttendanceError::InvalidNumber { field })
}

pub fn check_file_type(filename: &str) -> Result<SheetFormat> {
    if filename.trim().is_empty() {
        return Err(AttendanceError::NoFile);
    }
    let ext = filename
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase());
    match ext {
        Some(e) if e == "csv" => Ok(SheetFormat::Csv),
        Some(e) if ALLOWED_EXTENSIONS.contains(&e.as_str()) => Ok(SheetFormat::Excel),
        _ => Err(AttendanceError::InvalidFileType {
            filename: filename.to_string(),
        }),
    }
}

/// Fails when any required column is absent from an uploaded header.
/// Header cells are compared after trimming; extra columns are allowed.
pub fn check_columns(header: &[String]) -> Result<()> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !header.iter().any(|h| h.trim() == **c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(AttendanceError::MissingColumns {
        required: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        missing,
    })
}

/// Lenient numeric coercion for uploaded cells: anything unparseable,
/// including blanks, becomes a missing cell.
pub fn coerce_numeric(cell: &str) -> Option<f64> {
    let t = cell.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}
