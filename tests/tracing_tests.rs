//! Global subscriber installation.
//!
//! A tracing subscriber can be installed once per process, so this binary
//! holds a single test that exercises the file target end to end.

use profile_config::ProfileConfigResolver;
use profile_config::logging::init_tracing;
use std::fs;
use tempfile::TempDir;

const APP: &str = "profile-config-tracing-app";

#[test]
fn test_file_target_receives_resolution_warnings() {
    let temp = TempDir::new().unwrap();
    let log_path = temp.path().join("logs.txt");
    fs::write(&log_path, "existing line\n").unwrap();

    init_tracing(log_path.to_str().unwrap(), true).unwrap();

    let config_dir = temp.path().join(APP);
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.yaml"), "defaults:\n  a: 1\n").unwrap();
    fs::write(config_dir.join("config.json"), "{ not json").unwrap();

    let config = ProfileConfigResolver::new(APP)
        .with_start_dir(temp.path())
        .with_search_home(false)
        .resolve()
        .unwrap();
    assert_eq!(config["a"], 1);

    let written = fs::read_to_string(&log_path).unwrap();
    assert!(written.starts_with("existing line\n"), "file is appended to");
    assert!(written.contains("Failed to load config from"));
    assert!(written.contains("config.json"));
    assert!(!written.contains('\u{1b}'), "no ANSI escapes in file output");

    // The global subscriber is already set.
    assert!(init_tracing("stderr", false).is_err());
    assert!(init_tracing("off", false).is_ok());
}
