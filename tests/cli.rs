use std::fs;
use std::process::{Command, Output};
use tempfile::tempdir;

const SIMULATE: &str = env!("CARGO_BIN_EXE_linear-terminal-clock-simulate-time");
const CLOCK: &str = env!("CARGO_BIN_EXE_linear-terminal-clock");

fn simulate_print(config_dir: &std::path::Path) -> Output {
    Command::new(SIMULATE)
        .args(["--print", "--once", "--width", "60", "--height", "8"])
        .args(["--start", "2022-03-12 05:00", "--end", "2022-03-12 07:00"])
        .args(["--step", "1800"])
        .arg("-c")
        .arg(config_dir)
        .env_remove("LINEAR_CLOCK_LOG")
        .output()
        .unwrap()
}

fn new_york_dir() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("linear-terminal-clock.toml"),
        "latitude = 40.7128\nlongitude = -74.0060\ntimezone = \"America/New_York\"\n",
    )
    .unwrap();
    dir
}

#[test]
fn simulator_prints_frames_and_exits_cleanly() {
    let dir = new_york_dir();
    let output = simulate_print(dir.path());
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.matches("[2022-03-12 ").count(), 5, "{stdout}");
    assert!(stdout.contains("[2022-03-12 07:00:00]"));
    assert!(stdout.contains('┣'));

    // Logs stay off stdout while frames are printed
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("linear-terminal-clock v"), "{stderr}");
    assert!(!stdout.contains("━━╸"));
}

#[test]
fn simulator_output_is_repeatable() {
    let dir = new_york_dir();
    let first = simulate_print(dir.path());
    let second = simulate_print(dir.path());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn simulator_rejects_unknown_arguments() {
    let output = Command::new(SIMULATE).arg("--sideways").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn invalid_config_fails_with_exit_code_one() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("linear-terminal-clock.toml"),
        "latitude = 123.0\nlongitude = 0.0\n",
    )
    .unwrap();

    let output = simulate_print(dir.path());
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("ERROR"), "{stderr}");
}

#[test]
fn clock_reports_version_and_help() {
    let version = Command::new(CLOCK).arg("--version").output().unwrap();
    assert!(version.status.success());
    let text = String::from_utf8(version.stdout).unwrap();
    assert!(text.contains(env!("CARGO_PKG_VERSION")));

    let help = Command::new(CLOCK).arg("--help").output().unwrap();
    assert!(help.status.success());
    assert!(String::from_utf8(help.stdout).unwrap().contains("--config"));
}
