//! CLI subprocess integration tests.
//!
//! These tests invoke the `reqpin` binary as a subprocess and verify
//! exit codes, stdout content, and JSON output stability.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn reqpin_bin(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_reqpin"));
    cmd.current_dir(dir);
    cmd.env_remove("REQPIN_LOG");
    cmd
}

fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

fn write_project(dir: &Path) {
    write(
        dir,
        "requirements/base.txt",
        "requests==2.25.1\npandas==1.2.3\nflake8==3.8.4\n",
    );
    write(
        dir,
        "requirements/local.txt",
        "-r base.txt\n\n# Testing\npytest==6.2.3\n\n# Linting\nflake8==3.9.0  # newer than base\n",
    );
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn cli_version_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = reqpin_bin(dir.path()).arg("--version").output().unwrap();
    assert!(output.status.success(), "reqpin --version must exit 0");
    assert!(stdout(&output).contains("reqpin"));
}

#[test]
fn cli_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    let output = reqpin_bin(dir.path()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let out = stdout(&output);
    for cmd in ["resolve", "check", "lock", "verify", "diff"] {
        assert!(out.contains(cmd), "help must list '{cmd}'");
    }
}

#[test]
fn resolve_uses_default_manifest_path() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let output = reqpin_bin(dir.path()).arg("resolve").output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "flake8==3.9.0\npandas==1.2.3\npytest==6.2.3\nrequests==2.25.1\n"
    );
}

#[test]
fn resolve_show_origin_names_winning_file() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let output = reqpin_bin(dir.path())
        .args(["resolve", "--show-origin", "requirements/local.txt"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(
        out.contains("flake8==3.9.0  # requirements/local.txt:7"),
        "{out}"
    );
    assert!(out.contains("requests==2.25.1  # requirements/base.txt:1"));
}

#[test]
fn resolve_json_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let output = reqpin_bin(dir.path())
        .args(["--json", "resolve"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["pins"]["flake8"]["version"], "3.9.0");
    assert_eq!(json["overrides"].as_array().unwrap().len(), 1);
    assert_eq!(json["overrides"][0]["previous"]["version"], "3.8.4");
    assert_eq!(json["sources"].as_array().unwrap().len(), 2);
}

#[test]
fn resolve_show_overrides_lists_replaced_pins() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let output = reqpin_bin(dir.path())
        .args(["resolve", "--show-overrides"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(
        out.contains(
            "# flake8==3.9.0 at requirements/local.txt:7 overrides flake8==3.8.4 at requirements/base.txt:3"
        ),
        "{out}"
    );
    assert!(out.starts_with("flake8==3.9.0\n"), "{out}");
}

#[test]
fn resolve_follows_long_requirement_option() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "requirements/base.txt", "requests==2.25.1\nflake8==3.8.4\n");
    write(
        dir.path(),
        "requirements/local.txt",
        "--requirement=base.txt\nflake8==3.9.0\n",
    );

    let output = reqpin_bin(dir.path()).arg("resolve").output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "flake8==3.9.0\nrequests==2.25.1\n");
}

#[test]
fn commented_backslash_does_not_swallow_next_pin() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "requirements/local.txt",
        "# Linters \\\nflake8==3.9.0\npytest==6.2.3  # runner \\\nmypy==0.812\n",
    );

    let output = reqpin_bin(dir.path()).arg("resolve").output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "flake8==3.9.0\nmypy==0.812\npytest==6.2.3\n"
    );
}

#[test]
fn literal_names_flag_keeps_spellings_apart() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "requirements/local.txt", "PyYAML==5.4.1\npyyaml==5.3\n");

    let normalized = reqpin_bin(dir.path()).arg("resolve").output().unwrap();
    assert!(normalized.status.success());
    assert_eq!(stdout(&normalized), "pyyaml==5.3\n");

    let literal = reqpin_bin(dir.path())
        .args(["--literal-names", "resolve"])
        .output()
        .unwrap();
    assert!(literal.status.success(), "stderr: {}", stderr(&literal));
    assert_eq!(stdout(&literal), "PyYAML==5.4.1\npyyaml==5.3\n");
}

#[test]
fn check_reports_counts() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let output = reqpin_bin(dir.path())
        .args(["--json", "check"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["packages"], 4);
    assert_eq!(json["files"], 2);
    assert_eq!(json["version_overrides"], 1);
}

#[test]
fn check_fails_with_manifest_exit_code_on_bad_line() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "requirements/local.txt", "pytest>=6\n");

    let output = reqpin_bin(dir.path()).arg("check").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("line 1"));
}

#[test]
fn missing_include_fails_with_manifest_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "requirements/local.txt", "-r base.txt\n");

    let output = reqpin_bin(dir.path()).arg("check").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("included from"));
}

#[test]
fn strict_flag_rejects_same_file_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "requirements/local.txt",
        "mypy==0.800\nmypy==0.812\n",
    );

    let relaxed = reqpin_bin(dir.path()).arg("check").output().unwrap();
    assert!(relaxed.status.success());

    let strict = reqpin_bin(dir.path())
        .args(["--strict", "check"])
        .output()
        .unwrap();
    assert_eq!(strict.status.code(), Some(2));
    assert!(stderr(&strict).contains("pinned twice"));
}

#[test]
fn lock_then_verify_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let lock = reqpin_bin(dir.path()).arg("lock").output().unwrap();
    assert!(lock.status.success(), "stderr: {}", stderr(&lock));
    assert!(dir.path().join("requirements.lock").is_file());

    let verify = reqpin_bin(dir.path()).arg("verify").output().unwrap();
    assert!(verify.status.success(), "stderr: {}", stderr(&verify));
    assert!(stdout(&verify).contains("matches"));
}

#[test]
fn relocking_unchanged_manifest_reports_up_to_date() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    reqpin_bin(dir.path()).arg("lock").output().unwrap();
    let again = reqpin_bin(dir.path())
        .args(["--json", "lock"])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&again.stdout).unwrap();
    assert_eq!(json["status"], "unchanged");
    assert_eq!(json["packages"], 4);
}

#[test]
fn verify_detects_drift_with_lock_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());
    reqpin_bin(dir.path()).arg("lock").output().unwrap();

    write(
        dir.path(),
        "requirements/local.txt",
        "-r base.txt\npytest==6.2.4\nflake8==3.9.0\nmypy==0.812\n",
    );

    let output = reqpin_bin(dir.path())
        .args(["--json", "verify"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "drift");
    assert_eq!(json["drift"]["added"][0]["name"], "mypy");
    assert_eq!(json["drift"]["changed"][0]["new"]["version"], "6.2.4");
}

#[test]
fn verify_reports_respelled_name_as_drift() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "requirements/local.txt", "Jinja2==2.11.3\nrequests==2.25.1\n");
    let lock = reqpin_bin(dir.path()).arg("lock").output().unwrap();
    assert!(lock.status.success(), "stderr: {}", stderr(&lock));

    write(dir.path(), "requirements/local.txt", "jinja2==2.11.3\nrequests==2.25.1\n");

    let text = reqpin_bin(dir.path()).arg("verify").output().unwrap();
    assert_eq!(text.status.code(), Some(3));
    let out = stdout(&text);
    assert!(!out.contains("matches"), "{out}");
    assert!(out.contains("Jinja2 -> jinja2 (respelled)"), "{out}");

    let json = reqpin_bin(dir.path())
        .args(["--json", "verify"])
        .output()
        .unwrap();
    assert_eq!(json.status.code(), Some(3));
    let json: serde_json::Value = serde_json::from_slice(&json.stdout).unwrap();
    assert_eq!(json["status"], "drift");
    assert_eq!(json["drift"]["renamed"][0]["old"]["name"], "Jinja2");
    assert_eq!(json["drift"]["renamed"][0]["new"]["name"], "jinja2");
}

#[test]
fn verify_detects_tampered_lock() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());
    reqpin_bin(dir.path()).arg("lock").output().unwrap();

    let lock_path = dir.path().join("requirements.lock");
    let content = std::fs::read_to_string(&lock_path).unwrap();
    std::fs::write(&lock_path, content.replace("6.2.3", "6.2.9")).unwrap();

    let output = reqpin_bin(dir.path()).arg("verify").output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("digest mismatch"));
}

#[test]
fn diff_between_two_manifests() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "old.txt", "pytest==6.2.2\nnose==1.3.7\n");
    write(dir.path(), "new.txt", "pytest==6.2.3\nmypy==0.812\n");

    let output = reqpin_bin(dir.path())
        .args(["diff", "old.txt", "new.txt"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("+ mypy==0.812"), "{out}");
    assert!(out.contains("- nose==1.3.7"), "{out}");
    assert!(out.contains("pytest==6.2.2 -> pytest==6.2.3"), "{out}");

    let same = reqpin_bin(dir.path())
        .args(["diff", "old.txt", "old.txt"])
        .output()
        .unwrap();
    assert!(same.status.success());
}

#[test]
fn init_writes_config_and_refuses_overwrite() {
    let dir = tempfile::tempdir().unwrap();

    let first = reqpin_bin(dir.path()).arg("init").output().unwrap();
    assert!(first.status.success(), "stderr: {}", stderr(&first));
    let content = std::fs::read_to_string(dir.path().join("reqpin.toml")).unwrap();
    assert!(content.contains("requirements/local.txt"));

    let second = reqpin_bin(dir.path()).arg("init").output().unwrap();
    assert_eq!(second.status.code(), Some(1));

    let forced = reqpin_bin(dir.path())
        .args(["init", "--force"])
        .output()
        .unwrap();
    assert!(forced.status.success());
}

#[test]
fn init_creates_config_at_custom_path() {
    let dir = tempfile::tempdir().unwrap();

    let first = reqpin_bin(dir.path())
        .args(["--config", "conf/custom.toml", "init"])
        .output()
        .unwrap();
    assert!(first.status.success(), "stderr: {}", stderr(&first));
    let content = std::fs::read_to_string(dir.path().join("conf/custom.toml")).unwrap();
    assert!(content.contains("requirements/local.txt"));
    assert!(!dir.path().join("reqpin.toml").exists());

    let second = reqpin_bin(dir.path())
        .args(["--config", "conf/custom.toml", "init"])
        .output()
        .unwrap();
    assert_eq!(second.status.code(), Some(1));
    assert!(stderr(&second).contains("already exists"));
}

#[test]
fn init_force_replaces_unreadable_config() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "reqpin.toml", "manifest = [not toml\n");

    let output = reqpin_bin(dir.path())
        .args(["init", "--force"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let content = std::fs::read_to_string(dir.path().join("reqpin.toml")).unwrap();
    assert!(content.contains("requirements.lock"));
}

#[test]
fn config_file_selects_manifest_and_lock() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "deps/dev.txt", "ipdb==0.13.7\n");
    write(
        dir.path(),
        "reqpin.toml",
        "manifest = \"deps/dev.txt\"\nlock = \"deps/dev.lock\"\n",
    );

    let output = reqpin_bin(dir.path()).arg("lock").output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.path().join("deps/dev.lock").is_file());
}

#[test]
fn completions_bash_generates_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = reqpin_bin(dir.path())
        .args(["completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("reqpin"));
}

#[test]
fn man_pages_written_per_subcommand() {
    let dir = tempfile::tempdir().unwrap();
    let output = reqpin_bin(dir.path())
        .args(["man-pages", "man"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(dir.path().join("man/reqpin.1").is_file());
    assert!(dir.path().join("man/reqpin-resolve.1").is_file());
}
