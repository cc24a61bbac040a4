//! Loader behaviour against real directories: file-safety guards, malformed
//! input, ordering and diagnostics.

use std::fs;
use std::path::Path;

use mc_core::task_store::{SkipReason, TaskStore, MAX_TASK_FILE_BYTES};
use mc_core::types::TaskStatus;

const NOW: i64 = 1_710_000_000_000;

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

fn skipped_reason<'a>(
    report: &'a mc_core::task_store::LoadReport,
    file: &str,
) -> Option<&'a SkipReason> {
    report
        .skipped
        .iter()
        .find(|s| s.file == file)
        .map(|s| &s.reason)
}

#[test]
fn missing_directory_yields_empty_report() {
    let dir = tempfile::tempdir().unwrap();
    let report = TaskStore::new(dir.path().join("nope")).load(NOW);
    assert!(report.tasks.is_empty());
    assert!(report.skipped.is_empty());
    assert!(!report.directory_found);
}

#[test]
fn path_to_regular_file_is_not_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "plain.json", "{}");
    let report = TaskStore::new(dir.path().join("plain.json")).load(NOW);
    assert!(report.tasks.is_empty());
    assert!(!report.directory_found);
}

#[test]
fn malformed_files_are_skipped_and_the_rest_load() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "good-1.json", r#"{"title":"one","created_at":"2024-01-01"}"#);
    write(dir.path(), "good-2.json", r#"{"title":"two","created_at":"2024-01-02"}"#);
    write(dir.path(), "broken.json", r#"{"title": "unterminated"#);
    write(dir.path(), "list.json", r#"[1, 2, 3]"#);
    write(dir.path(), "null.json", "null");

    let report = TaskStore::new(dir.path()).load(NOW);
    let ids: Vec<&str> = report.tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["good-2", "good-1"]);
    assert_eq!(report.skipped.len(), 3);
    assert!(matches!(
        skipped_reason(&report, "broken.json"),
        Some(SkipReason::MalformedJson(_))
    ));
    assert_eq!(skipped_reason(&report, "list.json"), Some(&SkipReason::NotAnObject));
    assert_eq!(skipped_reason(&report, "null.json"), Some(&SkipReason::NotAnObject));
    assert!(report.directory_found);
}

#[test]
fn only_json_files_directly_inside_are_read() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "task.json", "{}");
    write(dir.path(), "notes.txt", "{}");
    write(dir.path(), "task.json.bak", "{}");
    fs::create_dir(dir.path().join("nested")).unwrap();
    write(&dir.path().join("nested"), "deep.json", "{}");

    let report = TaskStore::new(dir.path()).load(NOW);
    assert_eq!(report.tasks.len(), 1);
    assert_eq!(report.tasks[0].id, "task");
}

#[test]
fn oversized_file_is_never_included() {
    let dir = tempfile::tempdir().unwrap();
    let padding = " ".repeat(MAX_TASK_FILE_BYTES as usize);
    write(dir.path(), "huge.json", &format!("{{\"title\":\"big\"}}{padding}"));
    write(
        dir.path(),
        "exact.json",
        &format!("{{}}{}", " ".repeat(MAX_TASK_FILE_BYTES as usize - 2)),
    );

    let report = TaskStore::new(dir.path()).load(NOW);
    let ids: Vec<&str> = report.tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["exact"]);
    assert!(matches!(
        skipped_reason(&report, "huge.json"),
        Some(SkipReason::Oversized { limit, .. }) if *limit == MAX_TASK_FILE_BYTES
    ));
}

#[test]
fn configurable_size_limit() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "small.json", r#"{"title":"this is more than ten bytes"}"#);
    let report = TaskStore::new(dir.path()).with_max_file_bytes(10).load(NOW);
    assert!(report.tasks.is_empty());
    assert_eq!(report.skipped.len(), 1);
}

#[test]
fn parent_escape_is_rejected_even_when_valid_json() {
    let outer = tempfile::tempdir().unwrap();
    let tasks = outer.path().join("tasks");
    fs::create_dir(&tasks).unwrap();
    write(outer.path(), "outside.json", r#"{"id":"secret"}"#);

    let store = TaskStore::new(&tasks);
    let root = tasks.canonicalize().unwrap();
    assert_eq!(
        store.load_file(&root, "../outside.json", NOW),
        Err(SkipReason::PathEscape)
    );
    assert!(store.load(NOW).tasks.iter().all(|t| t.id != "secret"));
}

#[cfg(unix)]
#[test]
fn symlink_escaping_the_directory_is_skipped() {
    let outer = tempfile::tempdir().unwrap();
    let tasks = outer.path().join("tasks");
    fs::create_dir(&tasks).unwrap();
    write(outer.path(), "outside.json", r#"{"id":"secret"}"#);
    write(&tasks, "real.json", r#"{"id":"real"}"#);
    std::os::unix::fs::symlink(outer.path().join("outside.json"), tasks.join("link.json")).unwrap();

    let report = TaskStore::new(&tasks).load(NOW);
    let ids: Vec<&str> = report.tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["real"]);
    assert_eq!(skipped_reason(&report, "link.json"), Some(&SkipReason::PathEscape));
}

#[test]
fn tasks_are_sorted_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.json", r#"{"created_at":"2024-02-01T00:00:00Z"}"#);
    write(dir.path(), "b.json", r#"{"created_at":"2024-03-01T00:00:00Z"}"#);
    write(dir.path(), "c.json", r#"{"created":"2023-11-15"}"#);
    write(dir.path(), "d.json", r#"{"created_at":"garbage"}"#);
    write(dir.path(), "e.json", r#"{"created_at":1706745600000}"#);

    let report = TaskStore::new(dir.path()).load(NOW);
    assert!(report
        .tasks
        .windows(2)
        .all(|w| w[0].created_at >= w[1].created_at));
    // Undated records take the load instant and therefore sort first.
    assert_eq!(report.tasks[0].id, "d");
    assert_eq!(report.tasks[0].created_at, NOW);
    assert_eq!(report.tasks.last().unwrap().id, "c");
}

#[test]
fn excluded_sidecar_files_are_not_tasks() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "task.json", r#"{"status":"active"}"#);
    write(dir.path(), "agents-status.json", r#"{"spark":"working"}"#);
    write(dir.path(), "feed-items.json", "[]");

    let report = TaskStore::new(dir.path())
        .excluding(["agents-status.json", "feed-items.json"])
        .load(NOW);
    assert_eq!(report.tasks.len(), 1);
    assert_eq!(report.tasks[0].status, TaskStatus::InProgress);
    assert!(report.skipped.is_empty());
}

#[test]
fn non_utf8_file_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bin.json"), [0xff, 0xfe, 0x7b, 0x7d]).unwrap();
    let report = TaskStore::new(dir.path()).load(NOW);
    assert!(report.tasks.is_empty());
    assert!(matches!(
        skipped_reason(&report, "bin.json"),
        Some(SkipReason::Unreadable(_))
    ));
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_file_name_is_reported() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ok.json", "{}");
    fs::write(dir.path().join(OsStr::from_bytes(b"bad\xff.json")), "{}").unwrap();
    fs::write(dir.path().join(OsStr::from_bytes(b"notes\xff.txt")), "{}").unwrap();

    let report = TaskStore::new(dir.path()).load(NOW);
    assert_eq!(report.tasks.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].file, "bad\u{fffd}.json");
    assert!(matches!(report.skipped[0].reason, SkipReason::Unreadable(_)));
}
