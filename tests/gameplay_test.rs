//! End-to-end runs of a small prompt loop story, through the library and
//! through the grue3 binary.
//!
//! The story prints "> ", reads a line, answers "ok" and loops until the
//! first word is "quit".

mod common;

use std::io::Write;
use std::process::{Command, Stdio};

use common::prompt_loop_story;
use grue3::config::{InterpreterConfig, StackSemantics};
use grue3::error::ZError;
use grue3::interpreter::Interpreter;
use grue3::io_device::HeadlessDevice;
use grue3::server::run_session;
use test_log::test;

fn config() -> InterpreterConfig {
    InterpreterConfig {
        instruction_limit: Some(10_000),
        ..Default::default()
    }
}

#[test]
fn test_scripted_session() {
    let device = HeadlessDevice::new(["look", "open mailbox", "QUIT"]);
    let transcript = device.transcript();
    let mut zvm = Interpreter::new(prompt_loop_story(), Box::new(device), config()).unwrap();
    zvm.interpret_all().unwrap();

    assert!(zvm.quitted());
    assert_eq!(transcript.output(), "> ok\n> ok\n> bye\n");
    assert_eq!(
        transcript.status(),
        Some((String::new(), "Score: 0  Moves: 0".to_string()))
    );
}

#[test]
fn test_run_session() {
    let device = HeadlessDevice::new(["quit"]);
    let transcript = device.transcript();
    run_session(&prompt_loop_story(), Box::new(device), &config()).unwrap();
    assert_eq!(transcript.output(), "> bye\n");
}

#[test]
fn test_end_of_input_keeps_prompting() {
    // Out of script every read is an empty line; the instruction limit ends the run
    let device = HeadlessDevice::new(Vec::<String>::new());
    let transcript = device.transcript();
    let mut zvm = Interpreter::new(prompt_loop_story(), Box::new(device), config()).unwrap();
    zvm.interpret_all().unwrap();
    assert!(!zvm.quitted());
    assert!(transcript.output().starts_with("> ok\n> ok\n"));
}

#[test]
fn test_session_error_is_returned() {
    let mut story = prompt_loop_story();
    // turn the first instruction into rtrue, which has no caller to return to
    story[0x1000] = 0xB0;
    let device = HeadlessDevice::new(Vec::<String>::new());
    let err = run_session(&story, Box::new(device), &config()).unwrap_err();
    assert!(matches!(err, ZError::CallStackUnderflow), "{err}");
}

#[test]
fn test_rejects_other_versions() {
    let mut story = prompt_loop_story();
    story[0] = 5;
    let device = HeadlessDevice::new(Vec::<String>::new());
    let err = Interpreter::new(story, Box::new(device), config()).err().unwrap();
    assert!(matches!(err, ZError::UnsupportedVersion(5)), "{err}");
}

#[test]
fn test_legacy_stack_session() {
    let device = HeadlessDevice::new(["look", "quit"]);
    let transcript = device.transcript();
    let config = InterpreterConfig {
        stack_semantics: StackSemantics::Legacy,
        ..config()
    };
    let mut zvm = Interpreter::new(prompt_loop_story(), Box::new(device), config).unwrap();
    zvm.interpret_all().unwrap();
    assert_eq!(transcript.output(), "> ok\n> bye\n");
}

fn story_file(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("grue3-{}-{}.z3", name, std::process::id()));
    std::fs::write(&path, prompt_loop_story()).unwrap();
    path
}

#[test]
fn test_binary_plays_from_stdin() {
    let path = story_file("stdin");
    let mut child = Command::new(env!("CARGO_BIN_EXE_grue3"))
        .arg(&path)
        .args(["--seed", "7"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to start grue3");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"look\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    std::fs::remove_file(&path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ok"), "{stdout}");
    assert!(stdout.contains("bye"), "{stdout}");
}

#[test]
fn test_binary_prints_header() {
    let path = story_file("header");
    let output = Command::new(env!("CARGO_BIN_EXE_grue3"))
        .arg(&path)
        .arg("--header")
        .output()
        .expect("Failed to start grue3");
    std::fs::remove_file(&path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("v3 release 1 serial 261016"), "{stdout}");
    assert!(stdout.contains("pc 0x1000"), "{stdout}");
}

#[test]
fn test_binary_reports_errors() {
    let output = Command::new(env!("CARGO_BIN_EXE_grue3"))
        .arg("/nonexistent/story.z3")
        .output()
        .expect("Failed to start grue3");
    assert!(!output.status.success());

    let path = story_file("badflag");
    let output = Command::new(env!("CARGO_BIN_EXE_grue3"))
        .arg(&path)
        .arg("--bogus")
        .output()
        .expect("Failed to start grue3");
    std::fs::remove_file(&path).ok();
    assert!(!output.status.success());
}
