use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
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

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn result_of(value: &serde_json::Value) -> &serde_json::Value {
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "expected ok: {}",
        value
    );
    value.get("result").expect("result")
}

fn error_code(value: &serde_json::Value) -> &str {
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false));
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .expect("error code")
}

#[test]
fn roll_numbers_are_unique_at_create_but_not_on_edit() {
    let workspace = temp_dir("gradebook-crud-rolls");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = result_of(&resp);

    let created = request(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "name": "One", "rollNumber": "U-1", "class": "10A" }),
    );
    let _one = result_of(&created);
    let created = request(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({ "name": "Two", "rollNumber": "U-2", "class": "10A" }),
    );
    let two_id = result_of(&created)
        .get("studentId")
        .and_then(|v| v.as_str())
        .expect("studentId")
        .to_string();

    // Creating a third student with a taken roll is rejected...
    let clash = request(
        &mut stdin,
        &mut reader,
        "4",
        "students.create",
        json!({ "name": "Three", "rollNumber": "U-1", "class": "10A" }),
    );
    assert_eq!(error_code(&clash), "duplicate_roll_number");

    // ...but editing an existing student into a collision is allowed.
    let edited = request(
        &mut stdin,
        &mut reader,
        "5",
        "students.update",
        json!({
            "studentId": two_id,
            "patch": { "rollNumber": "U-1" }
        }),
    );
    let student = result_of(&edited).get("student").expect("student");
    assert_eq!(
        student.get("rollNumber").and_then(|v| v.as_str()),
        Some("U-1")
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn update_patches_fields_and_null_clears_optionals() {
    let workspace = temp_dir("gradebook-crud-patch");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = result_of(&resp);
    let created = request(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({
            "name": "Patch Me",
            "rollNumber": "P-1",
            "class": "10A",
            "email": "old@example.com"
        }),
    );
    let student_id = result_of(&created)
        .get("studentId")
        .and_then(|v| v.as_str())
        .expect("studentId")
        .to_string();

    let edited = request(
        &mut stdin,
        &mut reader,
        "3",
        "students.update",
        json!({
            "studentId": student_id,
            "patch": { "name": "Patched", "email": null, "class": "10B" }
        }),
    );
    let student = result_of(&edited).get("student").expect("student");
    assert_eq!(student.get("name").and_then(|v| v.as_str()), Some("Patched"));
    assert_eq!(student.get("class").and_then(|v| v.as_str()), Some("10B"));
    assert!(student.get("email").is_none() || student["email"].is_null());
    // Untouched fields survive the patch.
    assert_eq!(
        student.get("rollNumber").and_then(|v| v.as_str()),
        Some("P-1")
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn delete_removes_student_and_unknown_ids_are_not_found() {
    let workspace = temp_dir("gradebook-crud-delete");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = result_of(&resp);
    let created = request(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "name": "Short Lived", "rollNumber": "D-1", "class": "10A" }),
    );
    let student_id = result_of(&created)
        .get("studentId")
        .and_then(|v| v.as_str())
        .expect("studentId")
        .to_string();

    let deleted = request(
        &mut stdin,
        &mut reader,
        "3",
        "students.delete",
        json!({ "studentId": student_id }),
    );
    let _ = result_of(&deleted);

    let gone = request(
        &mut stdin,
        &mut reader,
        "4",
        "students.get",
        json!({ "studentId": student_id }),
    );
    assert_eq!(error_code(&gone), "not_found");
    let again = request(
        &mut stdin,
        &mut reader,
        "5",
        "students.delete",
        json!({ "studentId": student_id }),
    );
    assert_eq!(error_code(&again), "not_found");

    let listed = request(&mut stdin, &mut reader, "6", "students.list", json!({}));
    assert_eq!(
        result_of(&listed)
            .get("students")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(0)
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn mutations_require_a_selected_workspace() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "students.create",
        json!({ "name": "Nobody", "rollNumber": "N-1", "class": "10A" }),
    );
    assert_eq!(error_code(&resp), "no_workspace");

    drop(stdin);
    let _ = child.wait();
}
