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

fn request_ok(
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
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn create_student(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    name: &str,
    roll: &str,
) -> String {
    let created = request_ok(
        stdin,
        reader,
        id,
        "students.create",
        json!({ "name": name, "rollNumber": roll, "class": "10A" }),
    );
    created
        .get("studentId")
        .and_then(|v| v.as_str())
        .expect("studentId")
        .to_string()
}

fn add_subject(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    student_id: &str,
    name: &str,
    marks: f64,
    max: f64,
) {
    let _ = request_ok(
        stdin,
        reader,
        id,
        "subjects.add",
        json!({
            "studentId": student_id,
            "subjectName": name,
            "marks": marks,
            "maxMarks": max
        }),
    );
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn empty_roster_yields_zeroed_sentinel() {
    let workspace = temp_dir("gradebook-class-empty");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let analytics = request_ok(&mut stdin, &mut reader, "2", "analytics.classOpen", json!({}));

    assert_eq!(
        analytics.get("totalStudents").and_then(|v| v.as_u64()),
        Some(0)
    );
    assert_eq!(
        analytics.get("classAverage").and_then(|v| v.as_f64()),
        Some(0.0)
    );
    assert!(analytics.get("highestScorer").map(|v| v.is_null()).unwrap_or(false));
    assert!(analytics.get("lowestScorer").map(|v| v.is_null()).unwrap_or(false));
    assert_eq!(
        analytics
            .get("subjectAverages")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(0)
    );
    assert_eq!(
        analytics
            .get("gradeDistribution")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(0)
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn class_rows_average_scorers_subjects_and_distribution() {
    let workspace = temp_dir("gradebook-class-rows");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // Alice 90% (A+), Bob 75% across two subjects (B+), Carol no
    // subjects (0%, N/A). Subject averages mix Alice's and Bob's Math.
    let alice = create_student(&mut stdin, &mut reader, "2", "Alice", "C-1");
    let bob = create_student(&mut stdin, &mut reader, "3", "Bob", "C-2");
    let _carol = create_student(&mut stdin, &mut reader, "4", "Carol", "C-3");
    add_subject(&mut stdin, &mut reader, "5", &alice, "Math", 90.0, 100.0);
    add_subject(&mut stdin, &mut reader, "6", &bob, "Math", 70.0, 100.0);
    add_subject(&mut stdin, &mut reader, "7", &bob, "Science", 80.0, 100.0);

    let analytics = request_ok(&mut stdin, &mut reader, "8", "analytics.classOpen", json!({}));

    assert_eq!(
        analytics.get("totalStudents").and_then(|v| v.as_u64()),
        Some(3)
    );
    // (90 + 75 + 0) / 3. Carol counts even with no subjects.
    let avg = analytics
        .get("classAverage")
        .and_then(|v| v.as_f64())
        .expect("classAverage");
    assert!(approx(avg, 55.0), "classAverage {}", avg);

    let highest = analytics.get("highestScorer").expect("highestScorer");
    assert_eq!(highest.get("name").and_then(|v| v.as_str()), Some("Alice"));
    assert!(approx(
        highest.get("percentage").and_then(|v| v.as_f64()).unwrap(),
        90.0
    ));
    let lowest = analytics.get("lowestScorer").expect("lowestScorer");
    assert_eq!(lowest.get("name").and_then(|v| v.as_str()), Some("Carol"));
    assert!(approx(
        lowest.get("percentage").and_then(|v| v.as_f64()).unwrap(),
        0.0
    ));

    // First-seen order: Math before Science. Math averages Alice's 90
    // and Bob's 70 per-entry percentages.
    let subjects = analytics
        .get("subjectAverages")
        .and_then(|v| v.as_array())
        .expect("subjectAverages");
    assert_eq!(subjects.len(), 2);
    assert_eq!(
        subjects[0].get("subject").and_then(|v| v.as_str()),
        Some("Math")
    );
    assert!(approx(
        subjects[0].get("average").and_then(|v| v.as_f64()).unwrap(),
        80.0
    ));
    assert_eq!(
        subjects[1].get("subject").and_then(|v| v.as_str()),
        Some("Science")
    );
    assert!(approx(
        subjects[1].get("average").and_then(|v| v.as_f64()).unwrap(),
        80.0
    ));

    // Rank order with absent grades omitted: A+ (Alice), B+ (Bob),
    // N/A (Carol).
    let dist = analytics
        .get("gradeDistribution")
        .and_then(|v| v.as_array())
        .expect("gradeDistribution");
    let pairs: Vec<(String, u64)> = dist
        .iter()
        .map(|g| {
            (
                g.get("grade").and_then(|v| v.as_str()).unwrap().to_string(),
                g.get("count").and_then(|v| v.as_u64()).unwrap(),
            )
        })
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("A+".to_string(), 1),
            ("B+".to_string(), 1),
            ("N/A".to_string(), 1)
        ]
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn scorer_ties_resolve_to_first_in_roster_order() {
    let workspace = temp_dir("gradebook-class-ties");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // All three students sit at exactly 80%, so the first student wins
    // both endpoints.
    let first = create_student(&mut stdin, &mut reader, "2", "First", "T-1");
    let second = create_student(&mut stdin, &mut reader, "3", "Second", "T-2");
    let third = create_student(&mut stdin, &mut reader, "4", "Third", "T-3");
    add_subject(&mut stdin, &mut reader, "5", &first, "Math", 80.0, 100.0);
    add_subject(&mut stdin, &mut reader, "6", &second, "Math", 40.0, 50.0);
    add_subject(&mut stdin, &mut reader, "7", &third, "Math", 16.0, 20.0);

    let analytics = request_ok(&mut stdin, &mut reader, "8", "analytics.classOpen", json!({}));
    assert_eq!(
        analytics
            .get("highestScorer")
            .and_then(|v| v.get("name"))
            .and_then(|v| v.as_str()),
        Some("First")
    );
    assert_eq!(
        analytics
            .get("lowestScorer")
            .and_then(|v| v.get("name"))
            .and_then(|v| v.as_str()),
        Some("First")
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
