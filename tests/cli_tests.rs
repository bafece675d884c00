//! Exit-code behavior of the three binaries, checked without any server:
//! usage errors must be caught before a single byte of network I/O.

use std::io::Write;
use std::process::Command;

#[test]
fn missing_record_path_exits_2() {
    for binary in [
        env!("CARGO_BIN_EXE_set-rec-path-compat"),
        env!("CARGO_BIN_EXE_set-rec-path"),
        env!("CARGO_BIN_EXE_set-rec-path-keys"),
    ] {
        let output = Command::new(binary).output().expect("run binary");
        assert_eq!(output.status.code(), Some(2), "binary: {binary}");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("RECORD_PATH"), "binary: {binary}");
    }
}

#[test]
fn missing_credentials_file_exits_1_with_hint() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("keys.json");

    let output = Command::new(env!("CARGO_BIN_EXE_set-rec-path-keys"))
        .arg("D:\\Recordings")
        .arg(format!("--keys={}", missing.display()))
        .output()
        .expect("run binary");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"));
    // remediation hint shows an example document
    assert!(stderr.contains("OBS_HOST"));
    assert!(stderr.contains("OBS_PASSWORD"));
}

#[test]
fn malformed_credentials_file_exits_1() {
    let mut keys = tempfile::NamedTempFile::new().expect("temp keys file");
    write!(keys, "not json at all [[[").expect("write keys");

    let output = Command::new(env!("CARGO_BIN_EXE_set-rec-path-keys"))
        .arg("D:\\Recordings")
        .arg(format!("--keys={}", keys.path().display()))
        .output()
        .expect("run binary");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not valid JSON"));
}

#[test]
fn incomplete_credentials_file_exits_1() {
    let mut keys = tempfile::NamedTempFile::new().expect("temp keys file");
    write!(keys, r#"{{"OBS_HOST":"127.0.0.1","OBS_PORT":"4444"}}"#).expect("write keys");

    let output = Command::new(env!("CARGO_BIN_EXE_set-rec-path-keys"))
        .arg("D:\\Recordings")
        .arg(format!("--keys={}", keys.path().display()))
        .output()
        .expect("run binary");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OBS_PASSWORD"));
}

#[test]
fn keys_flag_wins_over_environment_override() {
    // --keys names a file missing its password; the env var names a file
    // that is not JSON. Only the --keys file may be read.
    let mut flag_file = tempfile::NamedTempFile::new().expect("temp keys file");
    write!(flag_file, r#"{{"OBS_HOST":"127.0.0.1","OBS_PORT":"4444"}}"#).expect("write keys");

    let mut env_file = tempfile::NamedTempFile::new().expect("temp keys file");
    write!(env_file, "not json").expect("write keys");

    let output = Command::new(env!("CARGO_BIN_EXE_set-rec-path-keys"))
        .arg("D:\\Recordings")
        .arg(format!("--keys={}", flag_file.path().display()))
        .env("OBS_KEYS_FILE", env_file.path())
        .output()
        .expect("run binary");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OBS_PASSWORD"));
    assert!(!stderr.contains("not valid JSON"));
}

#[test]
fn environment_override_is_used_when_no_flag_given() {
    let mut env_file = tempfile::NamedTempFile::new().expect("temp keys file");
    write!(env_file, r#"{{"OBS_PORT":"4444","OBS_PASSWORD":""}}"#).expect("write keys");

    let output = Command::new(env!("CARGO_BIN_EXE_set-rec-path-keys"))
        .arg("D:\\Recordings")
        .env("OBS_KEYS_FILE", env_file.path())
        .output()
        .expect("run binary");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OBS_HOST"));
}
