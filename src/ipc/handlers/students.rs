use crate::calc;
use crate::error::AttendanceError;
use crate::ipc::helpers::{get_form_field, get_student_id, with_store, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::notify;
use crate::record::{AttendanceRecord, StudentRow};
use crate::store::{self, TableStore};
use crate::validate::{self, StudentForm};
use serde_json::json;

fn parse_form(params: &serde_json::Value) -> StudentForm {
    StudentForm {
        name: get_form_field(params, "name", ""),
        attended: get_form_field(params, "attended", "0"),
        total_classes: get_form_field(params, "totalClasses", "0"),
        parent_mobile: get_form_field(params, "parentMobile", ""),
    }
}

fn typed_record(rows: &[StudentRow], index: usize) -> Result<AttendanceRecord, HandlerErr> {
    let row = store::get(rows, index)?;
    AttendanceRecord::from_row(index, row).ok_or_else(|| AttendanceError::MalformedRow { index }.into())
}

fn students_list(store: &dyn TableStore) -> Result<serde_json::Value, HandlerErr> {
    let rows = store.load()?;
    let students: Vec<serde_json::Value> = rows
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| {
            let rec = AttendanceRecord::from_row(idx, row);
            if rec.is_none() {
                tracing::warn!(row = idx, name = %row.name, "skipping malformed attendance row");
            }
            rec
        })
        .map(|rec| {
            let s = calc::compute_record(&rec);
            json!({
                "id": rec.id,
                "name": rec.name,
                "attended": rec.attended,
                "totalClasses": rec.total_classes,
                "parentMobile": rec.parent_mobile_str(),
                "percentage": s.percentage,
                "status": s.status
            })
        })
        .collect();
    Ok(json!({ "students": students }))
}

fn students_get(store: &dyn TableStore, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_student_id(params)?;
    let rows = store.load()?;
    let rec = typed_record(&rows, student_id)?;
    Ok(json!({
        "student": {
            "id": rec.id,
            "name": rec.name,
            "attended": rec.attended,
            "totalClasses": rec.total_classes,
            "parentMobile": rec.parent_mobile_str()
        }
    }))
}

fn students_create(store: &dyn TableStore, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let valid = validate::validate(&parse_form(params))?;
    let name = valid.name.clone();

    let mut rows = store.load()?;
    let student_id = store::append(&mut rows, valid.into_row());
    store.save(&rows)?;

    tracing::info!(student_id, name = %name, "student added");
    Ok(json!({
        "studentId": student_id,
        "message": format!("Student \"{}\" added successfully!", name)
    }))
}

fn students_update(store: &dyn TableStore, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_student_id(params)?;
    let mut rows = store.load()?;
    store::get(&rows, student_id)?;

    let valid = validate::validate(&parse_form(params))?;
    let name = valid.name.clone();
    store::replace(&mut rows, student_id, valid.into_row())?;
    store.save(&rows)?;

    tracing::info!(student_id, name = %name, "student updated");
    Ok(json!({
        "studentId": student_id,
        "message": format!("Student \"{}\" updated successfully!", name)
    }))
}

fn students_delete(store: &dyn TableStore, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_student_id(params)?;
    let mut rows = store.load()?;
    let removed = store::remove_at(&mut rows, student_id)?;
    store.save(&rows)?;

    tracing::info!(student_id, name = %removed.name, remaining = rows.len(), "student deleted");
    Ok(json!({
        "deleted": student_id,
        "message": format!("Student \"{}\" deleted successfully!", removed.name)
    }))
}

fn students_notify(store: &dyn TableStore, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_student_id(params)?;
    let rows = store.load()?;
    let rec = typed_record(&rows, student_id)?;
    let n = notify::compose(&rec);
    Ok(json!({
        "link": n.link,
        "message": n.message,
        "status": n.status,
        "percentage": n.percentage
    }))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store, _| students_list(store))
}

fn handle_students_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, students_get)
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, students_create)
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, students_update)
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, students_delete)
}

fn handle_students_notify(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, students_notify)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        "students.notify" => Some(handle_students_notify(state, req)),
        _ => None,
    }
}
