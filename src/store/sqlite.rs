use super::TableStore;
use crate::error::Result;
use crate::record::StudentRow;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub const DB_FILE: &str = "attendance.sqlite3";

/// The attendance table held in a SQLite file. Row order is kept in an
/// explicit `position` column.
pub struct SqliteTableStore {
    path: PathBuf,
    conn: Connection,
}

impl SqliteTableStore {
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(DB_FILE);
        let conn = Connection::open(&path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS students(
                position INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                attended REAL,
                total_classes REAL,
                parent_mobile REAL
            )",
            [],
        )?;
        Ok(Self { path, conn })
    }
}

impl TableStore for SqliteTableStore {
    fn load(&self) -> Result<Vec<StudentRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, attended, total_classes, parent_mobile
             FROM students
             ORDER BY position",
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok(StudentRow {
                    name: r.get(0)?,
                    attended: r.get(1)?,
                    total_classes: r.get(2)?,
                    parent_mobile: r.get(3)?,
                })
            })
            .and_then(|it| it.collect::<std::result::Result<Vec<_>, _>>())?;
        Ok(rows)
    }

    fn save(&self, rows: &[StudentRow]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM students", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO students(position, name, attended, total_classes, parent_mobile)
                 VALUES(?, ?, ?, ?, ?)",
            )?;
            for (i, row) in rows.iter().enumerate() {
                insert.execute((
                    i as i64,
                    &row.name,
                    row.attended,
                    row.total_classes,
                    row.parent_mobile,
                ))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
