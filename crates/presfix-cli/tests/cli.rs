use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;

#[test]
fn help_describes_the_backup_argument() {
    let assert = cargo_bin_cmd!("presfix").arg("--help").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("BACKUP_ID"), "help output: {stdout}");
    assert!(stdout.contains("PRESFIX_APP_DIR"), "help output: {stdout}");
}

#[test]
fn extra_arguments_are_rejected() {
    cargo_bin_cmd!("presfix")
        .args(["2022-03-01--14-05-09--qwerty", "extra"])
        .assert()
        .failure();
}

#[cfg(not(target_os = "macos"))]
#[test]
fn non_macos_hosts_are_refused() {
    let temp = tempfile::tempdir().expect("tempdir");
    let pres = temp.path().join("pres");
    fs::create_dir_all(&pres).expect("content dir");
    fs::write(pres.join("content.xml"), "<zuiprezi/>").expect("descriptor");

    let assert = cargo_bin_cmd!("presfix")
        .env("PRESFIX_APP_DIR", temp.path())
        .env("NO_COLOR", "1")
        .assert()
        .code(1);
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert_eq!(stdout.trim_end(), "error: only macOS is supported");
    assert_eq!(
        fs::read_dir(&pres).expect("list").count(),
        1,
        "nothing may be written"
    );
}

#[cfg(not(target_os = "macos"))]
#[test]
fn json_output_wraps_user_errors() {
    let temp = tempfile::tempdir().expect("tempdir");

    let assert = cargo_bin_cmd!("presfix")
        .env("PRESFIX_APP_DIR", temp.path())
        .env("PRESFIX_JSON", "1")
        .arg("short")
        .assert()
        .code(1);
    let payload: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("json payload");
    assert_eq!(payload["status"], "user-error");
    assert_eq!(payload["command"], "restore");
    assert_eq!(payload["message"], "only macOS is supported");
}
