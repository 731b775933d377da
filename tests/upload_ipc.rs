use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar_with(data_dir: &Path, envs: &[(&str, &str)]) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_attendanced");
    let mut child = Command::new(exe)
        .current_dir(data_dir)
        .env("ATTENDANCE_STORAGE__DATA_DIR", data_dir)
        .envs(envs.iter().copied())
        .env_remove("ATTENDANCE_CONFIG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn attendanced");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn send(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = send(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn listing_names(list: &serde_json::Value) -> Vec<String> {
    list["students"]
        .as_array()
        .expect("students array")
        .iter()
        .map(|s| s["name"].as_str().unwrap_or("").to_string())
        .collect()
}

#[test]
fn upload_missing_column_leaves_table_unchanged() {
    let workspace = temp_dir("attendance-upload-missing");
    let (mut child, mut stdin, mut reader) = spawn_sidecar_with(&workspace, &[]);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.create",
        json!({ "name": "Asha", "attended": 30, "totalClasses": 40, "parentMobile": "9876543210" }),
    );
    let before = std::fs::read(workspace.join("attendance.csv")).expect("table before");

    let sheet = workspace.join("no-mobile.csv");
    std::fs::write(&sheet, "Name,Attended,Total Classes\nRavi,10,40\n").expect("write sheet");
    let value = send(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.upload",
        json!({ "path": sheet.to_string_lossy() }),
    );
    assert_eq!(value["ok"], false);
    assert_eq!(value["error"]["code"], "missing_columns");
    assert_eq!(value["error"]["details"]["missing"], json!(["ParentMobile"]));
    assert!(value["error"]["message"]
        .as_str()
        .unwrap_or("")
        .contains("Name, Attended, Total Classes, ParentMobile"));

    let wrong_type = workspace.join("sheet.pdf");
    std::fs::write(&wrong_type, "%PDF").expect("write pdf");
    let value = send(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.upload",
        json!({ "path": wrong_type.to_string_lossy() }),
    );
    assert_eq!(value["error"]["code"], "invalid_file_type");

    let value = send(&mut stdin, &mut reader, "4", "attendance.upload", json!({}));
    assert_eq!(value["error"]["code"], "no_file");

    let broken = workspace.join("sheet.xlsx");
    std::fs::write(&broken, "PK").expect("write xlsx");
    let value = send(
        &mut stdin,
        &mut reader,
        "5",
        "attendance.upload",
        json!({ "path": broken.to_string_lossy() }),
    );
    assert_eq!(value["error"]["code"], "unreadable_sheet");

    let after = std::fs::read(workspace.join("attendance.csv")).expect("table after");
    assert_eq!(before, after);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn uploaded_rows_are_lenient_and_bad_rows_are_skipped_on_read() {
    let workspace = temp_dir("attendance-upload-lenient");
    let (mut child, mut stdin, mut reader) = spawn_sidecar_with(&workspace, &[]);

    let sheet = workspace.join("class.csv");
    std::fs::write(
        &sheet,
        "Roll,Name,Total Classes,Attended,ParentMobile\n\
         1,Asha,40,30,9876543210\n\
         2,Ravi,40,50,12345\n\
         3,Meena,40,abc,9876543211\n\
         4,Kiran,0,0,9876543212\n",
    )
    .expect("write sheet");
    let uploaded = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.upload",
        json!({ "path": sheet.to_string_lossy() }),
    );
    assert_eq!(uploaded["loaded"], 4);
    assert_eq!(uploaded["message"], "File uploaded successfully! 4 student records loaded.");

    let listing = request_ok(&mut stdin, &mut reader, "2", "attendance.list", json!({}));
    assert_eq!(listing_names(&listing), vec!["Asha", "Ravi", "Kiran"]);
    assert_eq!(listing["totalStudents"], 4);
    assert_eq!(listing["eligibleCount"], 2);
    assert_eq!(listing["notEligibleCount"], 2);
    assert_eq!(listing["skippedRows"], 1);
    // Positional ids keep counting the skipped row.
    assert_eq!(listing["students"][2]["id"], 3);
    assert_eq!(listing["students"][1]["percentage"], 125.0);
    assert_eq!(listing["students"][2]["status"], "Not Eligible");

    let value = send(&mut stdin, &mut reader, "3", "students.notify", json!({ "studentId": 2 }));
    assert_eq!(value["error"]["code"], "malformed_row");

    let stored = std::fs::read_to_string(workspace.join("attendance.csv")).expect("table");
    assert!(stored.starts_with("Name,Attended,Total Classes,ParentMobile\n"));
    assert!(stored.contains("Meena,,40,9876543211\n"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn oversized_upload_is_rejected() {
    let workspace = temp_dir("attendance-upload-size");
    let (mut child, mut stdin, mut reader) =
        spawn_sidecar_with(&workspace, &[("ATTENDANCE_UPLOAD__MAX_BYTES", "64")]);

    let sheet = workspace.join("big.csv");
    let mut text = String::from("Name,Attended,Total Classes,ParentMobile\n");
    for i in 0..10 {
        text.push_str(&format!("Student {i},1,2,9876543210\n"));
    }
    std::fs::write(&sheet, text).expect("write sheet");
    let value = send(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.upload",
        json!({ "path": sheet.to_string_lossy() }),
    );
    assert_eq!(value["error"]["code"], "upload_too_large");
    assert_eq!(value["error"]["details"]["limit"], 64);
    assert!(!workspace.join("attendance.csv").exists());

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn stray_quote_in_a_name_does_not_swallow_later_rows() {
    let workspace = temp_dir("attendance-upload-quote");
    let (mut child, mut stdin, mut reader) = spawn_sidecar_with(&workspace, &[]);

    let sheet = workspace.join("class.csv");
    std::fs::write(
        &sheet,
        "Name,Attended,Total Classes,ParentMobile\n\
         O\"Brien,30,40,9876543210\n\
         Asha,30,40,9876543211\n\
         Ravi,10,40,9876543212\n",
    )
    .expect("write sheet");
    let uploaded = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.upload",
        json!({ "path": sheet.to_string_lossy() }),
    );
    assert_eq!(uploaded["loaded"], 3);

    let listing = request_ok(&mut stdin, &mut reader, "2", "attendance.list", json!({}));
    assert_eq!(listing_names(&listing), vec!["O\"Brien", "Asha", "Ravi"]);
    assert_eq!(listing["eligibleCount"], 2);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
