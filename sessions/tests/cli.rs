//! CLI tests for the `evc-sessions` binary.
//!
//! Spawns the binary from a directory nested inside a stub project and checks
//! output plus exit codes, which pass through from the session script.

#![cfg(unix)]

use std::path::Path;
use std::process::{Command, Output};

use serial_test::serial;
use sessions::exit_codes;
use sessions::test_support::TestProject;

fn evc(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_evc-sessions"))
        .current_dir(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run evc-sessions")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
#[serial]
fn status_without_session() {
    let project = TestProject::with_session_stub().expect("project");
    let nested = project.subdir("docs/notes").expect("subdir");

    let output = evc(&nested, &["status"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&output), "No hay sesión activa\n");
}

#[test]
#[serial]
fn start_then_status_shows_context() {
    let project = TestProject::with_session_stub().expect("project");
    let nested = project.subdir("src").expect("subdir");

    let started = evc(&nested, &["start", "Nueva función"]);
    assert_eq!(started.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&started), "Sesión iniciada: Nueva función\n");

    let status = evc(&nested, &["status"]);
    assert_eq!(status.status.code(), Some(exit_codes::OK));
    assert!(
        stdout(&status).starts_with("Sesión activa encontrada:\n\n# Sesión: sesion-1\n"),
        "stdout: {}",
        stdout(&status)
    );
}

#[test]
#[serial]
fn script_exit_code_passes_through() {
    let project = TestProject::with_session_stub().expect("project");

    let output = evc(project.root(), &["note", "sin sesión"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "No hay sesión activa\n");
}

#[test]
#[serial]
fn context_json_describes_active_session() {
    let project = TestProject::with_session_stub().expect("project");
    evc(project.root(), &["start", "json"]);

    let output = evc(project.root(), &["context", "--json"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["status"], "active");
    assert_eq!(value["name"], "sesion-1");
    assert_eq!(value["description"], "json");
}

#[test]
#[serial]
fn exec_streams_any_script_command() {
    let project = TestProject::with_session_stub().expect("project");

    let listed = evc(project.root(), &["exec", "list-issues"]);
    assert_eq!(listed.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&listed), "12|Fix login flow\n7|Add dark mode\n");

    let unknown = evc(project.root(), &["exec", "bogus", "--flag"]);
    assert_eq!(unknown.status.code(), Some(2));
    assert_eq!(stdout(&unknown), "Comando desconocido: bogus\n");
}

#[test]
#[serial]
fn validate_reports_valid_script() {
    let project = TestProject::with_session_stub().expect("project");

    let output = evc(project.root(), &["validate"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&output), "Script sessions.sh válido\n");
}

#[test]
#[serial]
fn non_executable_script_is_rejected() {
    let project = TestProject::with_session_stub().expect("project");
    project.set_mode(0o644).expect("chmod");

    let output = evc(project.root(), &["status"]);

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(
        stderr(&output).contains("no es ejecutable"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
#[serial]
fn missing_script_exits_with_hint() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = evc(temp.path(), &["status"]);

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let err = stderr(&output);
    assert!(err.contains("Error de configuración inicial"), "stderr: {err}");
    assert!(err.contains("'scripts' con 'sessions.sh'"), "stderr: {err}");
}

#[test]
#[serial]
fn commands_lists_catalog_without_a_project() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = evc(temp.path(), &["commands"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let out = stdout(&output);
    let labels: Vec<&str> = out
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(
        labels,
        vec![
            "start",
            "list-issues",
            "issue-direct",
            "issue",
            "note",
            "context",
            "end",
            "commit",
            "status"
        ]
    );
}

#[test]
#[serial]
fn menu_runs_without_subcommand() {
    use std::io::Write;
    use std::process::Stdio;

    let project = TestProject::with_session_stub().expect("project");
    let mut child = Command::new(env!("CARGO_BIN_EXE_evc-sessions"))
        .current_dir(project.root())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn menu");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"q\n")
        .expect("write");
    let output = child.wait_with_output().expect("wait");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(stdout(&output).contains("¡Hasta luego!"));
}
