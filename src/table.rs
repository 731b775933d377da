use crate::error::{AttendanceError, Result};
use crate::record::{
    format_cell, StudentRow, COL_ATTENDED, COL_NAME, COL_PARENT_MOBILE, COL_TOTAL_CLASSES,
    REQUIRED_COLUMNS,
};
use crate::validate::{check_columns, coerce_numeric};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use std::path::Path;

/// Splits CSV text into records. A quote opens a quoted field only as the
/// first character of the field; quoted fields may contain commas, doubled
/// quotes and line breaks. Elsewhere a quote is a literal character. Blank
/// lines outside quotes are dropped.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    // The current field started with a quote.
    let mut quoted = false;
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let ch = chars[i];
        if in_quotes {
            if ch == '"' {
                if chars.get(i + 1) == Some(&'"') {
                    buf.push('"');
                    i += 2;
                    continue;
                }
                in_quotes = false;
            } else {
                buf.push(ch);
            }
            i += 1;
            continue;
        }
        match ch {
            '"' if buf.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
            }
            ',' => {
                fields.push(std::mem::take(&mut buf));
                quoted = false;
            }
            '\n' | '\r' => {
                if ch == '\r' && chars.get(i + 1) == Some(&'\n') {
                    i += 1;
                }
                fields.push(std::mem::take(&mut buf));
                push_record(&mut records, std::mem::take(&mut fields));
                quoted = false;
            }
            _ => buf.push(ch),
        }
        i += 1;
    }
    if !buf.is_empty() || !fields.is_empty() {
        fields.push(buf);
        push_record(&mut records, fields);
    }
    records
}

fn push_record(records: &mut Vec<Vec<String>>, fields: Vec<String>) {
    if fields.len() == 1 && fields[0].is_empty() {
        return;
    }
    records.push(fields);
}

pub fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Reads an attendance sheet. The header must name every required column
/// (any order, extra columns ignored); numeric cells are coerced leniently.
pub fn rows_from_csv(text: &str) -> Result<Vec<StudentRow>> {
    rows_from_records(parse_csv(text))
}

/// Reads the first worksheet of an Excel workbook (`.xlsx` or `.xls`).
/// The format is detected from the content, not the extension. Rows whose
/// cells are all blank are dropped; the rest map exactly like CSV records.
pub fn rows_from_workbook(path: &Path) -> Result<Vec<StudentRow>> {
    let bytes = std::fs::read(path)?;
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| AttendanceError::UnreadableSheet(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AttendanceError::UnreadableSheet("workbook has no worksheets".to_string()))?
        .map_err(|e| AttendanceError::UnreadableSheet(e.to_string()))?;

    let records: Vec<Vec<String>> = range
        .rows()
        .map(|cells| cells.iter().map(sheet_cell_text).collect::<Vec<String>>())
        .filter(|fields| fields.iter().any(|f| !f.trim().is_empty()))
        .collect();
    rows_from_records(records)
}

fn sheet_cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        // 30.0 reads back as "30", 9876543210.0 as "9876543210".
        Data::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}

fn rows_from_records(records: Vec<Vec<String>>) -> Result<Vec<StudentRow>> {
    let mut records = records.into_iter();
    let header = records.next().unwrap_or_default();
    check_columns(&header)?;

    let col = |name: &str| header.iter().position(|h| h.trim() == name);
    // check_columns guarantees all four are present.
    let (Some(name_col), Some(att_col), Some(tot_col), Some(mob_col)) = (
        col(COL_NAME),
        col(COL_ATTENDED),
        col(COL_TOTAL_CLASSES),
        col(COL_PARENT_MOBILE),
    ) else {
        return Ok(Vec::new());
    };

    Ok(records
        .map(|fields| StudentRow {
            name: cell(&fields, name_col).to_string(),
            attended: coerce_numeric(cell(&fields, att_col)),
            total_classes: coerce_numeric(cell(&fields, tot_col)),
            parent_mobile: coerce_numeric(cell(&fields, mob_col)),
        })
        .collect())
}

fn cell(fields: &[String], idx: usize) -> &str {
    fields.get(idx).map(String::as_str).unwrap_or("")
}

pub fn rows_to_csv(rows: &[StudentRow]) -> String {
    let mut csv = REQUIRED_COLUMNS
        .iter()
        .map(|c| csv_quote(c))
        .collect::<Vec<_>>()
        .join(",");
    csv.push('\n');
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{}\n",
            csv_quote(&row.name),
            format_cell(row.attended),
            format_cell(row.total_classes),
            format_cell(row.parent_mobile)
        ));
    }
    csv
}
