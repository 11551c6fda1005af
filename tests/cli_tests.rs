use assert_cmd::Command;
use freewrite::storage::DirectoryLock;
use predicates::prelude::*;
use serial_test::serial;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

// Helper function to set up a test Command instance against an isolated directory
fn set_up_command(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("freewrite").unwrap();
    cmd.env_clear()
        .env("HOME", home)
        .env("FREEWRITE_DIR", home.join("Freewrite"))
        .env("FREEWRITE_DEBOUNCE_MS", "50");
    cmd
}

fn entry_files(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".md"))
        .collect()
}

fn create_entry(home: &Path, text: &str) -> String {
    let output = set_up_command(home)
        .args(["new", text])
        .output()
        .unwrap();
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

#[test]
fn test_cli_help() {
    let temp = tempdir().unwrap();
    set_up_command(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("distraction-free"))
        .stdout(predicate::str::contains("export"));
}

#[test]
#[serial]
fn test_first_run_prints_welcome_entry() {
    let temp = tempdir().unwrap();

    set_up_command(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome to freewrite"));

    let files = entry_files(&temp.path().join("Freewrite"));
    assert_eq!(files.len(), 1);
}

#[test]
#[serial]
fn test_second_run_resumes_todays_entry() {
    let temp = tempdir().unwrap();

    set_up_command(temp.path()).arg("today").assert().success();
    set_up_command(temp.path())
        .arg("today")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome to freewrite"));

    assert_eq!(entry_files(&temp.path().join("Freewrite")).len(), 1);
}

#[test]
#[serial]
fn test_new_and_show() {
    let temp = tempdir().unwrap();
    let id = create_entry(temp.path(), "hello there");

    set_up_command(temp.path())
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::eq("hello there"));
}

#[test]
#[serial]
fn test_new_reads_stdin() {
    let temp = tempdir().unwrap();
    let output = set_up_command(temp.path())
        .args(["new", "-"])
        .write_stdin("from a pipe\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    let id = String::from_utf8(output.stdout).unwrap().trim().to_string();

    set_up_command(temp.path())
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::eq("from a pipe\n"));
}

#[test]
#[serial]
fn test_write_streams_stdin_into_entry() {
    let temp = tempdir().unwrap();
    let id = create_entry(temp.path(), "");

    set_up_command(temp.path())
        .args(["write", "--entry", &id])
        .write_stdin("line one\nline two\n")
        .assert()
        .success();

    set_up_command(temp.path())
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::eq("line one\nline two\n"));
}

#[test]
#[serial]
fn test_list_json_with_previews() {
    let temp = tempdir().unwrap();
    let id = create_entry(temp.path(), "A list of small joys");

    let output = set_up_command(temp.path())
        .args(["list", "--json", "--previews"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = entries.as_array().unwrap();
    let listed = entries
        .iter()
        .find(|entry| entry["id"] == id.as_str())
        .unwrap();
    assert_eq!(listed["preview"]["state"], "ready");
    assert_eq!(listed["preview"]["text"], "A list of small joys");
}

#[test]
#[serial]
fn test_list_text_marks_selected_entry() {
    let temp = tempdir().unwrap();
    create_entry(temp.path(), "something");

    set_up_command(temp.path())
        .args(["list", "--previews"])
        .assert()
        .success()
        .stdout(predicate::str::contains("* "))
        .stdout(predicate::str::contains("something"));
}

#[test]
#[serial]
fn test_delete_removes_entry() {
    let temp = tempdir().unwrap();
    let id = create_entry(temp.path(), "short lived");

    set_up_command(temp.path())
        .args(["delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted"));

    set_up_command(temp.path())
        .args(["show", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NotFound"));
}

#[test]
#[serial]
fn test_export_writes_pdf() {
    let temp = tempdir().unwrap();
    let out = temp.path().join("exports");
    let id = create_entry(temp.path(), "Letters to my future self");

    set_up_command(temp.path())
        .args(["export", &id, "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("letters-to-my-future.pdf"));

    let bytes = fs::read(out.join("letters-to-my-future.pdf")).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
#[serial]
fn test_invalid_entry_id_is_rejected() {
    let temp = tempdir().unwrap();
    set_up_command(temp.path())
        .args(["show", "yesterday"])
        .assert()
        .failure();
}

#[test]
#[serial]
fn test_relative_directory_is_rejected() {
    let temp = tempdir().unwrap();
    set_up_command(temp.path())
        .env("FREEWRITE_DIR", "relative/dir")
        .assert()
        .failure()
        .stderr(predicate::str::contains("absolute"));
}

#[test]
#[serial]
fn test_locked_directory_is_rejected() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("Freewrite");
    fs::create_dir_all(&root).unwrap();
    let _held = DirectoryLock::acquire(&root).unwrap();

    set_up_command(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Lock(FileBusy"));
}

#[test]
#[serial]
fn test_uncreatable_directory_is_logged_then_reported_by_lock() {
    let temp = tempdir().unwrap();
    let blocker = temp.path().join("not-a-dir");
    fs::write(&blocker, "plain file").unwrap();

    set_up_command(temp.path())
        .env("FREEWRITE_DIR", blocker.join("Freewrite"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to create entries directory"))
        .stderr(predicate::str::contains("Lock(AcquisitionFailed"));
}

#[test]
#[serial]
fn test_json_log_format() {
    let temp = tempdir().unwrap();
    set_up_command(temp.path())
        .env("RUST_LOG", "info")
        .args(["--log-format", "json", "today"])
        .assert()
        .success()
        .stderr(predicate::str::contains("\"level\":\"INFO\""));
}
