//! End-to-end tests for the `evs` binary, driven through stdin pipes.

use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn spawn_evs(args: &[&str]) -> Child {
    Command::new(env!("CARGO_BIN_EXE_evs"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn evs")
}

/// Run `evs` with `input` on stdin, closing stdin afterwards.
fn run_evs(args: &[&str], input: &str) -> Output {
    let mut child = spawn_evs(args);
    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(input.as_bytes()).unwrap();
    drop(stdin);
    child.wait_with_output().unwrap()
}

fn wait_with_deadline(child: &mut Child, deadline: Duration) -> Option<ExitStatus> {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if let Some(status) = child.try_wait().unwrap() {
            return Some(status);
        }
        thread::sleep(Duration::from_millis(10));
    }
    None
}

#[test]
fn timeout_exits_while_stdin_stays_open() {
    let mut child = spawn_evs(&["decode", "-", "--timeout-ms", "500"]);
    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(b"data: first\n\n").unwrap();
    stdin.flush().unwrap();

    // The writer end stays open, so the pending stdin read never completes
    let status = wait_with_deadline(&mut child, Duration::from_secs(5));
    if status.is_none() {
        let _ = child.kill();
    }
    drop(stdin);

    let status = status.expect("evs decode kept running after --timeout-ms");
    assert!(status.success(), "exit status {status}");

    let mut stdout = String::new();
    child.stdout.take().unwrap().read_to_string(&mut stdout).unwrap();
    assert_eq!(stdout, "#1 message\nfirst\n\n");
}

#[test]
fn decode_json_lines() {
    let output = run_evs(&["decode", "-", "--json"], "id: 1\ndata: a\n\nevent: x\ndata: b\n\n");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "{\"event\":\"message\",\"id\":\"1\",\"data\":\"a\"}\n\
         {\"event\":\"x\",\"id\":\"1\",\"data\":\"b\"}\n"
    );
}

#[test]
fn decode_stops_at_max_events() {
    let output = run_evs(&["decode", "-", "--max-events", "1"], "data: a\n\ndata: b\n\n");
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "#1 message\na\n\n");
}

#[test]
fn validate_reports_single_event() {
    let output = run_evs(&["validate", "-"], "data: a\n\n");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "✓ Events: 1 event decoded\n✓ Termination: end of stream reached cleanly\n"
    );
}

#[test]
fn validate_failure_exits_nonzero() {
    let output = run_evs(
        &["validate", "-", "--max-line-bytes", "8"],
        "data: ok\n\ndata: far too long\n\n",
    );
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "✗ Error: after 1 event: line exceeds 8 bytes\n"
    );
    assert!(String::from_utf8(output.stderr).unwrap().contains("error: validation failed"));
}

#[test]
fn stats_last_id_follows_id_only_records() {
    let output = run_evs(&["stats", "-"], "id: 3\ndata: a\n\nid: 9\n\n");
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap().contains("Last id: 9\n"));
}

#[test]
fn stats_last_id_cleared_by_empty_id() {
    let output = run_evs(&["stats", "-"], "id: 3\ndata: a\n\nid\ndata: b\n\n");
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap().contains("Last id: -\n"));
}
