use super::TableStore;
use crate::error::Result;
use crate::record::StudentRow;
use crate::table;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const TABLE_FILE: &str = "attendance.csv";

/// The attendance table as a spreadsheet file in the data directory.
pub struct CsvTableStore {
    path: PathBuf,
}

impl CsvTableStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(TABLE_FILE),
        }
    }
}

impl TableStore for CsvTableStore {
    fn load(&self) -> Result<Vec<StudentRow>> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }
        let bytes = std::fs::read(&self.path)?;
        let text = String::from_utf8_lossy(&bytes);
        // A stored table with a damaged header is treated like a foreign upload.
        table::rows_from_csv(&text)
    }

    fn save(&self, rows: &[StudentRow]) -> Result<()> {
        let csv = table::rows_to_csv(rows);
        let tmp = self
            .path
            .with_file_name(format!("{}.{}.saving", TABLE_FILE, Uuid::new_v4()));
        if let Err(e) = std::fs::write(&tmp, csv.as_bytes()) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::temp_dir;

    #[test]
    fn missing_file_loads_empty() {
        let dir = temp_dir("attendance-csv-empty");
        let store = CsvTableStore::new(&dir);
        assert!(store.load().expect("load").is_empty());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn save_load_roundtrip_keeps_order_and_cells() {
        let dir = temp_dir("attendance-csv-roundtrip");
        let store = CsvTableStore::new(&dir);
        let rows = vec![
            StudentRow::new("Asha", 30, 40, 9876543210),
            StudentRow {
                name: "Ravi".into(),
                attended: Some(50.0),
                total_classes: Some(40.0),
                parent_mobile: None,
            },
            StudentRow::new("Asha", 0, 0, 9876543210),
        ];
        store.save(&rows).expect("save");
        let loaded = store.load().expect("load");
        assert_eq!(loaded, rows);

        store.save(&loaded).expect("save again");
        assert_eq!(store.load().expect("reload"), rows);

        let leftovers = std::fs::read_dir(&dir)
            .expect("read dir")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".saving"))
            .count();
        assert_eq!(leftovers, 0);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn save_into_missing_directory_fails_with_io() {
        let dir = temp_dir("attendance-csv-gone");
        let store = CsvTableStore::new(&dir.join("nope"));
        let err = store.save(&[]).unwrap_err();
        assert_eq!(err.code(), "io_error");
        let _ = std::fs::remove_dir_all(dir);
    }
}
