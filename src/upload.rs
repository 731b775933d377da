use crate::error::{AttendanceError, Result};
use crate::store::TableStore;
use crate::table;
use crate::validate::{check_file_type, SheetFormat};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub loaded: usize,
}

/// Replaces the whole table with the rows of an uploaded spreadsheet.
///
/// File name, size and header are checked before anything is written, so a
/// rejected upload leaves the stored table untouched. Cell contents are not
/// range checked.
pub fn import_table(store: &dyn TableStore, file: &Path, max_bytes: u64) -> Result<UploadSummary> {
    let filename = file
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let format = check_file_type(&filename)?;

    let size = std::fs::metadata(file)?.len();
    if size > max_bytes {
        return Err(AttendanceError::UploadTooLarge {
            size,
            limit: max_bytes,
        });
    }

    let rows = match format {
        SheetFormat::Excel => table::rows_from_workbook(file)?,
        SheetFormat::Csv => {
            let bytes = std::fs::read(file)?;
            table::rows_from_csv(&String::from_utf8_lossy(&bytes))?
        }
    };
    store.save(&rows)?;
    tracing::info!(file = %filename, rows = rows.len(), "replaced attendance table from upload");
    Ok(UploadSummary { loaded: rows.len() })
}
