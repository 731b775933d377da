use crate::error::AttendanceError;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::TableStore;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<AttendanceError> for HandlerErr {
    fn from(e: AttendanceError) -> Self {
        if e.code() == "io_error" {
            tracing::warn!(error = %e, "storage failure");
        }
        Self {
            code: e.code(),
            details: e.details(),
            message: e.to_string(),
        }
    }
}

impl From<anyhow::Error> for HandlerErr {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<AttendanceError>() {
            Ok(typed) => typed.into(),
            Err(other) => {
                tracing::warn!(error = %format!("{other:#}"), "operation failed");
                Self {
                    code: "io_error",
                    message: format!("{other:#}"),
                    details: None,
                }
            }
        }
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Form fields arrive as text or as JSON numbers; either is read as text.
/// A missing field reads as `default`.
pub fn get_form_field(params: &serde_json::Value, key: &str, default: &str) -> String {
    match params.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => default.to_string(),
    }
}

pub fn get_student_id(params: &serde_json::Value) -> Result<usize, HandlerErr> {
    let v = params
        .get("studentId")
        .ok_or_else(|| HandlerErr::bad_params("missing studentId"))?;
    let id = match v {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    id.map(|n| n as usize)
        .ok_or_else(|| HandlerErr::bad_params("studentId must be a non-negative integer"))
}

/// Runs `f` against the open table, or answers `no_workspace`.
pub fn with_store<F>(state: &AppState, req: &Request, f: F) -> serde_json::Value
where
    F: FnOnce(&dyn TableStore, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
{
    let Some(store) = state.store.as_deref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match f(store, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}
