mod csv;
mod sqlite;

pub use self::csv::CsvTableStore;
pub use self::sqlite::SqliteTableStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{AttendanceError, Result};
use crate::record::StudentRow;
use std::path::Path;

/// Whole-table persistence. Implementations never keep rows between calls:
/// every `load` reads storage afresh and every `save` replaces it entirely.
pub trait TableStore {
    /// Missing storage reads as an empty table.
    fn load(&self) -> Result<Vec<StudentRow>>;

    /// Replaces the stored table. Either every row lands or the previous
    /// table is left as it was.
    fn save(&self, rows: &[StudentRow]) -> Result<()>;

    /// File (or database) the table lives in.
    fn location(&self) -> &Path;
}

/// Opens the configured backend inside `config.data_dir`, creating the
/// directory when needed.
pub fn open_store(config: &StorageConfig) -> anyhow::Result<Box<dyn TableStore>> {
    std::fs::create_dir_all(&config.data_dir)?;
    let store: Box<dyn TableStore> = match config.backend {
        StorageBackend::Csv => Box::new(CsvTableStore::new(&config.data_dir)),
        StorageBackend::Sqlite => Box::new(SqliteTableStore::open(&config.data_dir)?),
    };
    tracing::info!(
        backend = ?config.backend,
        location = %store.location().display(),
        "opened attendance table"
    );
    Ok(store)
}

pub fn append(rows: &mut Vec<StudentRow>, row: StudentRow) -> usize {
    rows.push(row);
    rows.len() - 1
}

pub fn replace(rows: &mut [StudentRow], index: usize, row: StudentRow) -> Result<StudentRow> {
    let len = rows.len();
    let slot = rows
        .get_mut(index)
        .ok_or(AttendanceError::OutOfRange { index, len })?;
    Ok(std::mem::replace(slot, row))
}

/// Removes the row at `index`; every later row moves down one position.
pub fn remove_at(rows: &mut Vec<StudentRow>, index: usize) -> Result<StudentRow> {
    if index >= rows.len() {
        return Err(AttendanceError::OutOfRange {
            index,
            len: rows.len(),
        });
    }
    Ok(rows.remove(index))
}

pub fn get(rows: &[StudentRow], index: usize) -> Result<&StudentRow> {
    rows.get(index).ok_or(AttendanceError::OutOfRange {
        index,
        len: rows.len(),
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<StudentRow> {
        vec![
            StudentRow::new("A", 1, 2, 9000000001),
            StudentRow::new("B", 3, 4, 9000000002),
            StudentRow::new("C", 5, 6, 9000000003),
        ]
    }

    #[test]
    fn remove_shifts_later_positions_down() {
        let mut r = rows();
        let removed = remove_at(&mut r, 0).expect("remove");
        assert_eq!(removed.name, "A");
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].name, "B");
        assert_eq!(r[1].name, "C");

        let pos = append(&mut r, removed);
        assert_eq!(pos, 2);
        assert_ne!(r[0].name, "A");
    }

    #[test]
    fn out_of_range_positions_fail() {
        let mut r = rows();
        assert!(matches!(
            remove_at(&mut r, 3),
            Err(AttendanceError::OutOfRange { index: 3, len: 3 })
        ));
        assert!(matches!(
            replace(&mut r, 7, StudentRow::new("X", 0, 0, 9000000000)),
            Err(AttendanceError::OutOfRange { index: 7, len: 3 })
        ));
        assert!(get(&r, 3).is_err());
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn replace_keeps_position() {
        let mut r = rows();
        let old = replace(&mut r, 1, StudentRow::new("B2", 4, 4, 9000000002)).expect("replace");
        assert_eq!(old.name, "B");
        assert_eq!(r[1].name, "B2");
        assert_eq!(r.len(), 3);
    }
}
