use crate::backup;
use crate::ipc::helpers::{get_required_str, with_store};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_backup_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store, params| {
        let out_path = PathBuf::from(get_required_str(params, "outPath")?);
        let summary = backup::export_table_bundle(store, &out_path)?;
        Ok(json!({
            "bundleFormat": summary.bundle_format,
            "entryCount": summary.entry_count,
            "rows": summary.rows,
            "sha256": summary.sha256,
            "outPath": out_path.to_string_lossy()
        }))
    })
}

fn handle_backup_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store, params| {
        let in_path = PathBuf::from(get_required_str(params, "inPath")?);
        let summary = backup::import_table_bundle(store, &in_path)?;
        Ok(json!({
            "bundleFormatDetected": summary.bundle_format_detected,
            "rows": summary.rows
        }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.export" => Some(handle_backup_export(state, req)),
        "backup.import" => Some(handle_backup_import(state, req)),
        _ => None,
    }
}
