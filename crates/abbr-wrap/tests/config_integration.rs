//! Configuration integration tests.
//!
//! These tests verify config discovery, format parsing, and precedence
//! from an end-to-end perspective using the compiled binary. Tests use
//! `info --json` to assert actual config values, not just process success.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env_remove("ABBR_WRAP_CLASS")
        .env_remove("ABBR_WRAP_LOG_LEVEL");
    cmd
}

/// Run `info --json` from a directory and parse the JSON output.
fn info_json(dir: &Path) -> Value {
    let output = cmd()
        .args(["-C", dir.to_str().unwrap(), "info", "--json"])
        .output()
        .expect("failed to run command");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("invalid JSON output")
}

/// Run `annotate` on `input` from a directory and return stdout.
fn annotate_in(dir: &Path, input: &str) -> String {
    let output = cmd()
        .args(["-C", dir.to_str().unwrap(), "annotate"])
        .write_stdin(input)
        .output()
        .expect("failed to run command");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout should be UTF-8")
}

// =============================================================================
// Config File Discovery
// =============================================================================

#[test]
fn runs_without_config_file() {
    let tmp = TempDir::new().unwrap();
    let json = info_json(tmp.path());

    assert_eq!(json["config"]["log_level"], "info");
    assert_eq!(json["config"]["class"], "nocode");
    assert_eq!(json["config"]["abbreviations"], 0);
    assert!(
        json["config"]["config_file"].is_null(),
        "no config file should be reported"
    );
}

#[test]
fn discovers_each_config_name() {
    for name in [".abbr.toml", "abbr.toml", ".abbr-wrap.toml", "abbr-wrap.toml"] {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(name), r#"class = "glossary""#).unwrap();

        let json = info_json(tmp.path());

        assert_eq!(json["config"]["class"], "glossary", "{name} not discovered");
        let reported = json["config"]["config_file"].as_str().unwrap();
        assert!(reported.ends_with(name), "should report {name}: {reported}");
    }
}

#[test]
fn discovers_config_in_parent_directory() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("content").join("posts");
    fs::create_dir_all(&sub_dir).unwrap();

    fs::write(
        tmp.path().join(".abbr-wrap.toml"),
        r#"abbreviations = [["FYI", "For Your Information", ""]]"#,
    )
    .unwrap();

    let json = info_json(&sub_dir);
    assert_eq!(json["config"]["abbreviations"], 1);

    let out = annotate_in(&sub_dir, "FYI");
    assert_eq!(out, r#"<abbr class="nocode" title="For Your Information">FYI</abbr>"#);
}

#[test]
fn abbr_wrap_name_overrides_abbr_name() {
    let tmp = TempDir::new().unwrap();

    fs::write(tmp.path().join("abbr.toml"), r#"class = "short""#).unwrap();
    fs::write(tmp.path().join(".abbr-wrap.toml"), r#"class = "long""#).unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["class"], "long");
}

// =============================================================================
// Config Format Parsing
// =============================================================================

#[test]
fn parses_toml_tuple_abbreviations() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".abbr.toml"),
        r#"
abbreviations = [
    ["USA", "United States of America", "en"],
    ["US", "United States", "en"],
]
"#,
    )
    .unwrap();

    let out = annotate_in(tmp.path(), "The USA, or the US.");
    assert_eq!(
        out,
        r#"The <abbr class="nocode" title="United States of America" lang="en">USA</abbr>, or the <abbr class="nocode" title="United States" lang="en">US</abbr>."#
    );
}

#[test]
fn parses_yaml_table_abbreviations() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".abbr.yaml"),
        "class: ''\nabbreviations:\n  - short: RSVP\n    expansion: Répondez s'il vous plaît\n    lang: fr\n",
    )
    .unwrap();

    let out = annotate_in(tmp.path(), "Please RSVP!");
    assert_eq!(
        out,
        r#"Please <abbr title="Répondez s&#039;il vous plaît" lang="fr">RSVP</abbr>!"#
    );
}

#[test]
fn parses_yml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".abbr.yml"), "log_level: debug\n").unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["log_level"], "debug");
}

#[test]
fn parses_json_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".abbr.json"),
        r#"{"abbreviations": [["OK", "Okay", ""], ["OK", "Again", ""]], "max_input_bytes": 2048}"#,
    )
    .unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["abbreviations"], 1);
    assert_eq!(json["config"]["skipped_abbreviations"], 1);
    assert_eq!(json["config"]["max_input_bytes"], 2048);
}

#[test]
fn disable_input_limit_is_reported() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".abbr.toml"), "disable_input_limit = true\n").unwrap();

    let json = info_json(tmp.path());
    assert!(json["config"]["max_input_bytes"].is_null());
}

// =============================================================================
// Config Precedence
// =============================================================================

#[test]
fn closer_config_takes_precedence() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("project");
    fs::create_dir_all(&sub_dir).unwrap();

    fs::write(tmp.path().join(".abbr.toml"), r#"log_level = "error""#).unwrap();
    fs::write(sub_dir.join(".abbr.toml"), r#"log_level = "debug""#).unwrap();

    let json = info_json(&sub_dir);
    assert_eq!(json["config"]["log_level"], "debug", "closer config should win");
}

#[test]
fn later_extension_overrides_earlier_in_same_directory() {
    let tmp = TempDir::new().unwrap();

    fs::write(tmp.path().join(".abbr.toml"), r#"class = "from-toml""#).unwrap();
    fs::write(tmp.path().join(".abbr.yaml"), "class: from-yaml\n").unwrap();

    let json = info_json(tmp.path());
    assert_eq!(
        json["config"]["class"], "from-yaml",
        "later extension (YAML) should override earlier (TOML) in merge"
    );
}

#[test]
fn explicit_config_overrides_discovered() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".abbr.toml"), r#"class = "discovered""#).unwrap();

    let explicit = tmp.path().join("override.toml");
    fs::write(&explicit, r#"class = "explicit""#).unwrap();

    let output = cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "--config",
            explicit.to_str().unwrap(),
            "info",
            "--json",
        ])
        .output()
        .expect("failed to run command");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["config"]["class"], "explicit");
    let reported = json["config"]["config_file"].as_str().unwrap();
    assert!(
        reported.ends_with("override.toml"),
        "--config path should be reported: {reported}"
    );
}

#[test]
fn env_var_overrides_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".abbr.toml"), r#"class = "from-file""#).unwrap();

    let output = cmd()
        .env("ABBR_WRAP_CLASS", "from-env")
        .args(["-C", tmp.path().to_str().unwrap(), "info", "--json"])
        .output()
        .expect("failed to run command");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["config"]["class"], "from-env");
}

#[test]
fn class_flag_overrides_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".abbr.toml"),
        "class = \"glossary\"\nabbreviations = [[\"FYI\", \"For Your Information\"]]\n",
    )
    .unwrap();

    assert_eq!(
        annotate_in(tmp.path(), "FYI"),
        r#"<abbr class="glossary" title="For Your Information">FYI</abbr>"#
    );

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "annotate", "--class", ""])
        .write_stdin("FYI")
        .assert()
        .success()
        .stdout(predicate::str::diff(
            r#"<abbr title="For Your Information">FYI</abbr>"#,
        ));
}

#[test]
fn inline_abbr_cannot_replace_configured_entry() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".abbr.toml"),
        "abbreviations = [[\"FYI\", \"For Your Information\"]]\n",
    )
    .unwrap();

    cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "annotate",
            "--abbr",
            "FYI=Something Else",
        ])
        .write_stdin("FYI")
        .assert()
        .success()
        .stdout(predicate::str::contains("For Your Information"));
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn invalid_toml_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".abbr.toml"), "this is not valid toml [[[").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn invalid_yaml_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".abbr.yaml"),
        "invalid:\n  yaml\n content:\n[broken",
    )
    .unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure();
}

#[test]
fn malformed_abbreviation_shape_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".abbr.toml"), "abbreviations = [42]\n").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn unknown_config_field_is_ignored() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".abbr.toml"),
        "log_level = \"warn\"\nunknown_field = \"should be ignored\"\n",
    )
    .unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["log_level"], "warn");
}

// =============================================================================
// Boundary Marker Tests
// =============================================================================

#[test]
fn git_boundary_stops_config_search() {
    let tmp = TempDir::new().unwrap();

    let parent = tmp.path().join("parent");
    let repo = parent.join("repo");
    let src = repo.join("src");
    fs::create_dir_all(&src).unwrap();

    fs::write(parent.join(".abbr.toml"), r#"class = "outside""#).unwrap();
    fs::create_dir(repo.join(".git")).unwrap();

    let json = info_json(&src);

    assert_eq!(json["config"]["class"], "nocode", "boundary stops search");
    assert!(json["config"]["config_file"].is_null());
}

#[test]
fn config_in_same_dir_as_git_is_found() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join("repo");
    let src = repo.join("src");
    fs::create_dir_all(&src).unwrap();

    fs::create_dir(repo.join(".git")).unwrap();
    fs::write(repo.join(".abbr-wrap.toml"), r#"class = "inside""#).unwrap();

    let json = info_json(&src);

    assert_eq!(json["config"]["class"], "inside");
    assert!(json["config"]["config_file"].as_str().is_some());
}
