use crate::error::AttendanceError;
use crate::store::TableStore;
use crate::table;
use anyhow::Context;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const TABLE_ENTRY: &str = "table/attendance.csv";
pub const BUNDLE_FORMAT_V1: &str = "attendance-table-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub rows: usize,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub rows: usize,
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

pub fn export_table_bundle(store: &dyn TableStore, out_path: &Path) -> anyhow::Result<ExportSummary> {
    let rows = store.load()?;
    let csv = table::rows_to_csv(&rows);
    let checksum = sha256_hex(csv.as_bytes());

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "rows": rows.len(),
        "sha256": checksum,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(TABLE_ENTRY, opts)
        .context("failed to start table entry")?;
    zip.write_all(csv.as_bytes())
        .context("failed to write table entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    tracing::info!(path = %out_path.display(), rows = rows.len(), "exported attendance bundle");
    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 2,
        rows: rows.len(),
        sha256: checksum,
    })
}

/// Restores a bundle over the current table. Nothing is written unless the
/// manifest, checksum and header all check out.
pub fn import_table_bundle(store: &dyn TableStore, in_path: &Path) -> anyhow::Result<ImportSummary> {
    if !is_zip_file(in_path)? {
        return Err(AttendanceError::InvalidBundle("not a zip archive".to_string()).into());
    }

    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file)
        .map_err(|e| AttendanceError::InvalidBundle(format!("invalid zip archive: {e}")))?;

    let manifest_text = read_entry(&mut archive, MANIFEST_ENTRY)?;
    let manifest: serde_json::Value = serde_json::from_str(&manifest_text)
        .map_err(|e| AttendanceError::InvalidBundle(format!("manifest.json is invalid JSON: {e}")))?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(AttendanceError::InvalidBundle(format!("unsupported bundle format: {format}")).into());
    }

    let csv = read_entry(&mut archive, TABLE_ENTRY)?;
    let expected = manifest
        .get("sha256")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let actual = sha256_hex(csv.as_bytes());
    if !expected.eq_ignore_ascii_case(&actual) {
        return Err(AttendanceError::InvalidBundle(format!(
            "table checksum mismatch (manifest {expected}, actual {actual})"
        ))
        .into());
    }

    let rows = table::rows_from_csv(&csv)?;
    store.save(&rows)?;
    tracing::info!(path = %in_path.display(), rows = rows.len(), "restored attendance bundle");
    Ok(ImportSummary {
        bundle_format_detected: format.to_string(),
        rows: rows.len(),
    })
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> anyhow::Result<String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|_| AttendanceError::InvalidBundle(format!("bundle missing {name}")))?;
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .with_context(|| format!("failed to read {name}"))?;
    Ok(text)
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
