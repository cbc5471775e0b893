mod common;

use common::Workspace;
use predicates::prelude::*;

#[test]
fn help_lists_compare_and_hides_completions() {
    let ws = Workspace::new();
    let output = ws
        .command()
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&output);

    assert!(stdout.contains("compare"));
    assert!(stdout.contains("config"));
    assert!(!stdout.contains("completions"));
}

#[test]
fn help_all_shows_completions() {
    let ws = Workspace::new();
    ws.command()
        .args(["help", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn help_for_compare_lists_side_flags() {
    let ws = Workspace::new();
    ws.command()
        .args(["help", "compare"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--source-file"))
        .stdout(predicate::str::contains("--duplicate-keys"));
}

#[test]
fn unknown_help_topic_fails() {
    let ws = Workspace::new();
    ws.command()
        .args(["help", "nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown command: nope"));
}

#[test]
fn completions_generate_for_bash() {
    let ws = Workspace::new();
    ws.command()
        .args(["completions", "--shell", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rowcmp"));
}

#[test]
fn config_command_reads_env_and_masks_password() {
    let ws = Workspace::new();
    let output = ws
        .command()
        .args(["config", "--json"])
        .env("SQL_SERVER", "env-host")
        .env("SQL_DATABASE", "env-db")
        .env("SQL_USER", "env-user")
        .env("SQL_PASSWORD", "env-pass")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).expect("json");

    assert_eq!(value["connection"]["server"], "env-host");
    assert_eq!(value["connection"]["database"], "env-db");
    assert_eq!(value["connection"]["user"], "env-user");
    assert_eq!(value["connection"]["password"], "********");
    assert_eq!(value["settings"]["compare"]["maxRows"], 1000);
}

#[test]
fn config_file_profile_and_compare_settings() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.path().join(".rowcmp")).expect("config dir");
    ws.file(
        ".rowcmp/config.yaml",
        "\
defaultProfile: qa
profiles:
  qa:
    server: qa-host
    database: Sales
settings:
  compare:
    maxRows: 50
    duplicateKeys: reject
",
    );

    let value = ws.run_json(&["config"]);
    assert_eq!(value["profileName"], "qa");
    assert_eq!(value["connection"]["server"], "qa-host");
    assert_eq!(value["settings"]["compare"]["maxRows"], 50);
    assert_eq!(value["settings"]["compare"]["duplicateKeys"], "reject");
}

#[test]
fn configured_reject_policy_applies_to_compare() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.path().join(".rowcmp")).expect("config dir");
    ws.file(
        ".rowcmp/config.yaml",
        "settings:\n  compare:\n    duplicateKeys: reject\n",
    );
    ws.file("a.csv", "id,name\n1,Ann\n");
    ws.file("b.csv", "id,name\n1,Ann\n1,Anna\n");

    ws.command()
        .args([
            "compare",
            "--source-file",
            "a.csv",
            "--target-file",
            "b.csv",
            "--key",
            "id",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not unique in target"));

    ws.command()
        .args([
            "compare",
            "--source-file",
            "a.csv",
            "--target-file",
            "b.csv",
            "--key",
            "id",
            "--duplicate-keys",
            "last-wins",
            "--quiet",
        ])
        .assert()
        .success();
}
