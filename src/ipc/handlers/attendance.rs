use crate::calc;
use crate::error::AttendanceError;
use crate::ipc::helpers::{with_store, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::notify;
use crate::record::AttendanceRecord;
use crate::store::TableStore;
use crate::upload;
use serde_json::json;
use std::path::PathBuf;

const EMPTY_NOTICE: &str = "No attendance data found. Please add students or upload a spreadsheet.";

fn attendance_list(store: &dyn TableStore) -> Result<serde_json::Value, HandlerErr> {
    let rows = store.load()?;
    let summary = calc::summarize(&rows);

    let mut students: Vec<serde_json::Value> = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let Some(rec) = AttendanceRecord::from_row(idx, row) else {
            tracing::warn!(row = idx, name = %row.name, "skipping malformed attendance row");
            continue;
        };
        let n = notify::compose(&rec);
        students.push(json!({
            "id": rec.id,
            "name": rec.name,
            "attended": rec.attended,
            "totalClasses": rec.total_classes,
            "parentMobile": rec.parent_mobile_str(),
            "percentage": n.percentage,
            "status": n.status,
            "whatsapp": n.link
        }));
    }

    let mut result = json!({
        "students": students,
        "totalStudents": summary.total_students,
        "eligibleCount": summary.eligible_count,
        "notEligibleCount": summary.not_eligible_count,
        "skippedRows": summary.skipped_rows
    });
    if rows.is_empty() {
        result["notice"] = json!(EMPTY_NOTICE);
    }
    Ok(result)
}

fn handle_attendance_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store, _| attendance_list(store))
}

fn handle_attendance_upload(state: &mut AppState, req: &Request) -> serde_json::Value {
    let max_bytes = state.config.upload.max_bytes;
    with_store(state, req, |store, params| {
        let path = params
            .get("path")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .ok_or(AttendanceError::NoFile)?;
        let summary = upload::import_table(store, &path, max_bytes)?;
        Ok(json!({
            "loaded": summary.loaded,
            "message": format!(
                "File uploaded successfully! {} student records loaded.",
                summary.loaded
            )
        }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.list" => Some(handle_attendance_list(state, req)),
        "attendance.upload" => Some(handle_attendance_upload(state, req)),
        _ => None,
    }
}
