use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn gaze_server() -> Command {
    let mut cmd = Command::cargo_bin("gaze-server").unwrap();
    cmd.env_remove("GAZE_PORT")
        .env_remove("GAZE_DEVICE")
        .env_remove("GAZE_BETA")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_help_flag() {
    gaze_server()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("replay"));
}

#[test]
fn test_version_flag() {
    gaze_server()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gaze-server"));
}

#[test]
fn test_config_prints_json() {
    let output = gaze_server()
        .arg("config")
        .env("GAZE_BETA", "0.5")
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["port"], 8000);
    assert_eq!(parsed["device"], "simulated");
    assert_eq!(parsed["filter"]["smoother"]["beta"], 0.5);
    assert_eq!(parsed["filter"]["velocity_threshold"], 2.0);
}

#[test]
fn test_invalid_env_is_rejected() {
    gaze_server()
        .arg("config")
        .env("GAZE_DEVICE", "tobii")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GAZE_DEVICE"));
}

#[test]
fn test_replay_prints_state_per_sample() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "arrival,left_x,left_y,right_x,right_y").unwrap();
    writeln!(file, "0.000,0.30,0.40,0.50,0.40").unwrap();
    writeln!(file, "0.008,0.30,0.40,0.50,0.40").unwrap();
    writeln!(file, "0.016,,,,").unwrap();

    let output = gaze_server()
        .arg("replay")
        .arg("--input")
        .arg(file.path())
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let states: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(states.len(), 3);
    assert!((states[0]["gaze_point"]["x"].as_f64().unwrap() - 0.4).abs() < 1e-12);
    assert!((states[1]["fixation_point"]["y"].as_f64().unwrap() - 0.4).abs() < 1e-12);
    assert!(states[2]["gaze_point"]["x"].is_null());
}

#[test]
fn test_replay_missing_file_fails() {
    gaze_server()
        .arg("replay")
        .arg("--input")
        .arg("/nonexistent/samples.csv")
        .assert()
        .failure();
}
