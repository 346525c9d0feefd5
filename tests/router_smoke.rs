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

fn spawn_daemon() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_schoold");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn schoold");
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
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("success").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("data").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("schoold-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_daemon();

    let _ = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));

    // Everything except health/auth needs a workspace first.
    let early = request(&mut stdin, &mut reader, "1b", "students.list", json!({}));
    assert_eq!(early["success"], false);
    assert_eq!(early["error"]["code"], "no_workspace");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let login = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "auth.login",
        json!({ "username": "admin", "password": "admin123" }),
    );
    let token = login["token"].as_str().expect("token").to_string();

    let class = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "classes.create",
        json!({ "name": "Grade 5", "section": "A", "capacity": 30 }),
    );
    let class_id = class["id"].as_str().expect("class id").to_string();
    let _ = request_ok(&mut stdin, &mut reader, "5", "classes.list", json!({}));

    let student = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.create",
        json!({
            "firstName": "Asha",
            "lastName": "Verma",
            "class": "Grade 5",
            "section": "A"
        }),
    );
    let student_id = student["id"].as_str().expect("student id").to_string();
    let _ = request_ok(&mut stdin, &mut reader, "7", "students.list", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "students.get",
        json!({ "id": student_id }),
    );

    let teacher = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "teachers.create",
        json!({ "firstName": "Meera", "lastName": "Nair" }),
    );
    let teacher_id = teacher["id"].as_str().expect("teacher id").to_string();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "teachers.addQualification",
        json!({ "id": teacher_id, "entry": { "title": "B.Ed" } }),
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "fees.create",
        json!({ "studentId": student_id }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "12", "fees.list", json!({}));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "13",
        "attendance.bulkCreate",
        json!({
            "token": token,
            "classId": class_id,
            "date": "2025-09-01",
            "entries": [{ "studentId": student_id, "status": "Present" }]
        }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "14",
        "attendance.list",
        json!({ "classId": class_id }),
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "15",
        "announcements.create",
        json!({ "title": "Sports day", "content": "Friday on the main field" }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "16", "announcements.list", json!({}));

    let exam = request_ok(
        &mut stdin,
        &mut reader,
        "17",
        "exams.create",
        json!({ "name": "Midterm", "class": "Grade 5", "date": "2025-10-01" }),
    );
    let exam_id = exam["id"].as_str().expect("exam id").to_string();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "18",
        "grades.create",
        json!({
            "studentId": student_id,
            "examId": exam_id,
            "subject": "Mathematics",
            "marks": 87
        }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "19",
        "grades.list",
        json!({ "studentId": student_id }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "20",
        "messages.create",
        json!({ "senderId": "admin", "recipientId": teacher_id, "content": "staff meeting at 4" }),
    );

    let _ = request_ok(&mut stdin, &mut reader, "21", "dashboard.stats", json!({}));

    let unknown = request(&mut stdin, &mut reader, "22", "nonsense.method", json!({}));
    assert_eq!(unknown["success"], false);
    assert_eq!(unknown["error"]["code"], "not_implemented");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn malformed_lines_get_a_parseable_error_reply() {
    let (mut child, mut stdin, mut reader) = spawn_daemon();

    // Unparseable input and schema violations whose error text carries
    // quotes and backticks must still produce a valid JSON envelope.
    for raw in ["{not json", "\"\\q\"", r#"{"id": 1, "method": "health"}"#] {
        writeln!(stdin, "{}", raw).expect("write raw line");
        stdin.flush().expect("flush raw line");

        let mut line = String::new();
        reader.read_line(&mut line).expect("read response line");
        let value: serde_json::Value =
            serde_json::from_str(line.trim()).unwrap_or_else(|e| panic!("{}: {}", e, line));
        assert_eq!(value["success"], false, "{}", raw);
        assert_eq!(value["status"], 400, "{}", raw);
        assert_eq!(value["error"]["code"], "bad_json", "{}", raw);
        assert!(value["error"]["message"].as_str().is_some(), "{}", raw);
    }

    drop(stdin);
    let _ = child.wait();
}
