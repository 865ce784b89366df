use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tasktracker-{nanos}-{file_name}"))
}

#[test]
fn import_replaces_the_whole_collection() {
    let exe = env!("CARGO_BIN_EXE_tasktracker");
    let store_path = temp_path("cli-import-store.json");
    let import_path = temp_path("cli-import-file.json");

    let existing = serde_json::json!([
        {
            "id": "task-old",
            "title": "stale task",
            "date": "2026-07-01",
            "status": "Completed",
            "createdAt": "2026-06-01T10:00:00Z"
        }
    ]);
    std::fs::write(&store_path, serde_json::to_string_pretty(&existing).unwrap()).unwrap();

    let incoming = serde_json::json!([
        {
            "id": "task-a",
            "title": "imported a",
            "date": "2026-08-01",
            "status": "Not Started",
            "createdAt": "2026-07-01T10:00:00Z"
        },
        {
            "id": "task-b",
            "title": "imported b",
            "date": "2026-08-02",
            "status": "Completed",
            "createdAt": "2026-07-01T10:00:00Z"
        }
    ]);
    std::fs::write(&import_path, serde_json::to_string_pretty(&incoming).unwrap()).unwrap();

    let output = Command::new(exe)
        .args(["import", import_path.to_str().unwrap()])
        .env("TASKTRACKER_STORE_PATH", &store_path)
        .output()
        .expect("failed to run import command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Imported 2 tasks"));

    let content = std::fs::read_to_string(&store_path).unwrap();
    std::fs::remove_file(&store_path).ok();
    std::fs::remove_file(&import_path).ok();

    let stored: serde_json::Value = serde_json::from_str(&content).unwrap();
    let tasks = stored.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["id"], "task-a");
    assert_eq!(tasks[1]["id"], "task-b");
}

#[test]
fn import_rejects_invalid_json() {
    let exe = env!("CARGO_BIN_EXE_tasktracker");
    let store_path = temp_path("cli-import-bad-store.json");
    let import_path = temp_path("cli-import-bad-file.json");
    std::fs::write(&import_path, "{ not an array ").unwrap();

    let output = Command::new(exe)
        .args(["import", import_path.to_str().unwrap()])
        .env("TASKTRACKER_STORE_PATH", &store_path)
        .output()
        .expect("failed to run import command");

    std::fs::remove_file(&import_path).ok();
    std::fs::remove_file(&store_path).ok();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_data"));
}

#[test]
fn import_rejects_missing_file() {
    let exe = env!("CARGO_BIN_EXE_tasktracker");
    let store_path = temp_path("cli-import-missing-store.json");
    let import_path = temp_path("cli-import-missing-file.json");

    let output = Command::new(exe)
        .args(["import", import_path.to_str().unwrap()])
        .env("TASKTRACKER_STORE_PATH", &store_path)
        .output()
        .expect("failed to run import command");

    std::fs::remove_file(&store_path).ok();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: io_error"));
}

#[test]
fn export_writes_collection_to_file() {
    let exe = env!("CARGO_BIN_EXE_tasktracker");
    let store_path = temp_path("cli-export-store.json");
    let export_path = temp_path("cli-export-file.json");

    let existing = serde_json::json!([
        {
            "id": "task-1",
            "title": "first",
            "date": "2026-08-01",
            "status": "Completed",
            "createdAt": "2026-07-01T10:00:00Z"
        },
        {
            "id": "task-2",
            "title": "second",
            "date": "2026-08-02",
            "status": "Not Started",
            "createdAt": "2026-07-01T10:00:00Z"
        }
    ]);
    std::fs::write(&store_path, serde_json::to_string_pretty(&existing).unwrap()).unwrap();

    let output = Command::new(exe)
        .args(["--json", "export", export_path.to_str().unwrap()])
        .env("TASKTRACKER_STORE_PATH", &store_path)
        .output()
        .expect("failed to run export command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("json output");
    assert_eq!(report["exported"], 2);

    let exported = std::fs::read_to_string(&export_path).unwrap();
    std::fs::remove_file(&store_path).ok();
    std::fs::remove_file(&export_path).ok();

    let parsed: serde_json::Value = serde_json::from_str(&exported).unwrap();
    let tasks = parsed.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["title"], "first");
}
