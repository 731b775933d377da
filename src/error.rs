use thiserror::Error;

/// Every failure the attendance core reports to its caller.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("student not found (id {index}, table has {len} rows)")]
    OutOfRange { index: usize, len: usize },

    #[error("Student record {index} has missing or non-numeric cells.")]
    MalformedRow { index: usize },

    #[error("{0}")]
    EmptyField(String),

    #[error("Parent mobile number must be exactly 10 digits.")]
    InvalidMobile,

    #[error("Attended and Total Classes must be valid positive numbers.")]
    InvalidNumber { field: &'static str },

    #[error("Attended classes cannot be greater than total classes.")]
    AttendedExceedsTotal { attended: u32, total_classes: u32 },

    #[error("Invalid file format. File must contain columns: {}", .required.join(", "))]
    MissingColumns {
        required: Vec<String>,
        missing: Vec<String>,
    },

    #[error("Invalid file type. Please upload an Excel file (.xlsx or .xls) or a .csv sheet.")]
    InvalidFileType { filename: String },

    #[error("No file selected. Please choose a spreadsheet file.")]
    NoFile,

    #[error("File is too large ({size} bytes, limit {limit} bytes).")]
    UploadTooLarge { size: u64, limit: u64 },

    #[error("Could not read the uploaded workbook: {0}")]
    UnreadableSheet(String),

    #[error("invalid backup bundle: {0}")]
    InvalidBundle(String),
}

impl AttendanceError {
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceError::Io(_) | AttendanceError::Sqlite(_) => "io_error",
            AttendanceError::OutOfRange { .. } => "out_of_range",
            AttendanceError::MalformedRow { .. } => "malformed_row",
            AttendanceError::EmptyField(_) => "empty_field",
            AttendanceError::InvalidMobile => "invalid_mobile",
            AttendanceError::InvalidNumber { .. } => "invalid_number",
            AttendanceError::AttendedExceedsTotal { .. } => "attended_exceeds_total",
            AttendanceError::MissingColumns { .. } => "missing_columns",
            AttendanceError::InvalidFileType { .. } => "invalid_file_type",
            AttendanceError::NoFile => "no_file",
            AttendanceError::UploadTooLarge { .. } => "upload_too_large",
            AttendanceError::UnreadableSheet(_) => "unreadable_sheet",
            AttendanceError::InvalidBundle(_) => "invalid_bundle",
        }
    }

    /// Structured context attached to the error envelope, when there is any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            AttendanceError::OutOfRange { index, len } => {
                Some(serde_json::json!({ "index": index, "len": len }))
            }
            AttendanceError::MalformedRow { index } => Some(serde_json::json!({ "index": index })),
            AttendanceError::InvalidNumber { field } => Some(serde_json::json!({ "field": field })),
            AttendanceError::AttendedExceedsTotal {
                attended,
                total_classes,
            } => Some(serde_json::json!({
                "attended": attended,
                "totalClasses": total_classes
            })),
            AttendanceError::MissingColumns { missing, .. } => {
                Some(serde_json::json!({ "missing": missing }))
            }
            AttendanceError::InvalidFileType { filename } => {
                Some(serde_json::json!({ "filename": filename }))
            }
            AttendanceError::UploadTooLarge { size, limit } => {
                Some(serde_json::json!({ "size": size, "limit": limit }))
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AttendanceError>;
