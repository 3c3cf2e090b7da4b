//! File output of the production subscriber.
//!
//! Installs a global subscriber, so it lives in its own test binary.

use std::fs;

#[test]
fn prod_logging_writes_json_lines_to_directory() {
    let dir = tempfile::tempdir().unwrap();

    let guard = pagearena::init_prod_logging(dir.path());
    assert!(guard.is_some());

    tracing::info!(target: "pagearena::arena", pages = 3, "arena file sink check");
    tracing::debug!(target: "pagearena::arena", "filtered out at info");
    drop(guard);

    let logs: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("pagearena"))
        })
        .collect();
    assert_eq!(logs.len(), 1, "expected one daily file, found {logs:?}");

    let contents = fs::read_to_string(&logs[0]).unwrap();
    let line = contents
        .lines()
        .find(|line| line.contains("arena file sink check"))
        .unwrap_or_else(|| panic!("event missing from {contents:?}"));
    assert!(line.starts_with('{'), "not JSON: {line}");
    assert!(line.contains("\"pages\":3"), "field missing: {line}");
    assert!(!contents.contains("filtered out at info"));
}
