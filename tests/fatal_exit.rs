//! The plain API terminates the process when the reservation runs out.
//!
//! The test re-runs its own binary with `PAGEARENA_FATAL_CHILD` set; the child
//! pushes past the reservation and the parent inspects how it exited.

use std::process::Command;

use pagearena::arena::region::OUT_OF_MEMORY_CODE;
use pagearena::Arena;

const CHILD_ENV: &str = "PAGEARENA_FATAL_CHILD";
const TEST_NAME: &str = "push_past_reservation_exits_with_out_of_memory_code";

#[test]
fn push_past_reservation_exits_with_out_of_memory_code() {
    if std::env::var_os(CHILD_ENV).is_some() {
        let arena = Arena::create(2);
        arena.push(arena.reserved_bytes());
        unreachable!("push past the reservation returned");
    }

    let exe = std::env::current_exe().unwrap();
    let output = Command::new(exe)
        .args(["--exact", TEST_NAME, "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, "1")
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success(), "child exited cleanly: {stderr}");
    assert_eq!(output.status.code(), Some(OUT_OF_MEMORY_CODE), "stderr: {stderr}");
    assert!(stderr.contains("pagearena: fatal"), "stderr: {stderr}");
    assert!(stderr.contains("reservation exhausted"), "stderr: {stderr}");
}
