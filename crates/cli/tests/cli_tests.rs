// End-to-end tests for the `streetlink` binary over the recon fixture catalogs.
// Run with: cargo test -p streetlink-cli --test cli_tests

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const FIXTURES: [&str; 3] = [
    "tbilisi.streets.toml",
    "myhome_tbilisi_streets.csv",
    "ss_tbilisi_streets.json",
];

fn streetlink() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_streetlink"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../recon/tests/fixtures")
}

/// Copy the fixture config and catalogs into a fresh directory so runs can
/// write their artifacts next to the config.
fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in FIXTURES {
        std::fs::copy(fixtures_dir().join(name), dir.path().join(name)).unwrap();
    }
    dir
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn run_writes_configured_artifacts() {
    let dir = workspace();
    let out = streetlink()
        .arg("run")
        .arg(dir.path().join("tbilisi.streets.toml"))
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let err = stderr(&out);
    assert!(err.contains("name:   6 of 8 matched (7 rows, 1 ambiguous), 1 unmatched, 1 excluded"), "{err}");
    assert!(err.contains("coords: 4 of 8 matched (4 rows), 2 unmatched, 2 excluded (max 100 m)"), "{err}");
    // Malformed coordinates in the myhome catalog are reported, not fatal.
    assert!(err.contains("malformed coordinates"), "{err}");

    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("street_mapping.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["name"]["summary"]["match_rows"], 7);
    assert_eq!(json["coords"]["matches"][0]["distance_m"], serde_json::json!(69.38));

    let csv = std::fs::read_to_string(dir.path().join("street_mapping_by_coords.csv")).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("distance_m,a_street_id,a_display_name"));
    assert!(lines[1].starts_with("69.38,101,"));
}

#[test]
fn run_json_to_stdout_with_overrides() {
    let dir = workspace();
    let out = streetlink()
        .arg("run")
        .arg(dir.path().join("tbilisi.streets.toml"))
        .args(["--json", "--strategy", "coords", "--max-distance", "50"])
        .arg("--output")
        .arg(dir.path().join("override.json"))
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let json: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert!(json.get("name").is_none());
    assert_eq!(json["coords"]["max_distance_m"], serde_json::json!(50.0));
    assert_eq!(json["coords"]["summary"]["matched"], 3);
    assert!(dir.path().join("override.json").exists());
    assert!(!dir.path().join("street_mapping.json").exists());
}

#[test]
fn strict_fails_on_unmatched() {
    let dir = workspace();
    let out = streetlink()
        .arg("run")
        .arg(dir.path().join("tbilisi.streets.toml"))
        .arg("--strict")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(63));
    assert!(stderr(&out).contains("error: 3 unmatched record(s)"));
}

#[test]
fn missing_catalog_exit_code_and_no_artifacts() {
    let dir = workspace();
    std::fs::remove_file(dir.path().join("ss_tbilisi_streets.json")).unwrap();
    let out = streetlink()
        .arg("run")
        .arg(dir.path().join("tbilisi.streets.toml"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(62));
    let err = stderr(&out);
    assert!(err.contains("error: catalog 'b': input not found"), "{err}");
    assert!(err.contains("hint:"), "{err}");
    assert!(!dir.path().join("street_mapping.json").exists());
    assert!(!dir.path().join("street_mapping_by_coords.csv").exists());
}

#[test]
fn failed_csv_write_leaves_no_json_behind() {
    let dir = workspace();
    let out = streetlink()
        .arg("run")
        .arg(dir.path().join("tbilisi.streets.toml"))
        .arg("--coords-csv")
        .arg(dir.path().join("no_such_dir").join("by_coords.csv"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(61));
    assert!(stderr(&out).contains("cannot write"), "{}", stderr(&out));
    assert!(!dir.path().join("street_mapping.json").exists());
    assert!(!dir.path().join("street_mapping.json.partial").exists());
}

#[test]
fn coords_csv_without_coords_strategy_is_usage_error() {
    let dir = workspace();
    let out = streetlink()
        .arg("run")
        .arg(dir.path().join("tbilisi.streets.toml"))
        .args(["--strategy", "name", "--coords-csv"])
        .arg(dir.path().join("x.csv"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn validate_reports_config() {
    let dir = workspace();
    let out = streetlink()
        .arg("validate")
        .arg(dir.path().join("tbilisi.streets.toml"))
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(stderr(&out).contains("valid: 'myhome → ss (Tbilisi)' (myhome → ss), strategies: name, coords"));
}

#[test]
fn validate_rejects_bad_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let config = std::fs::read_to_string(fixtures_dir().join("tbilisi.streets.toml"))
        .unwrap()
        .replace("max_distance_m = 100.0", "max_distance_m = -5.0");
    let path = dir.path().join("bad.streets.toml");
    std::fs::write(&path, config).unwrap();

    let out = streetlink().arg("validate").arg(&path).output().unwrap();
    assert_eq!(out.status.code(), Some(60));
    assert!(stderr(&out).contains("max_distance_m"));
}

#[test]
fn validate_missing_config() {
    let out = streetlink()
        .args(["validate", "/nonexistent/streets.toml"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(60));
}

#[test]
fn canon_prints_name_and_key() {
    let out = streetlink()
        .args(["canon", "ფანასკერტელ-ციციშვილის ქ.", "Chavchavadze Ave.", "Aspindza I Street"])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(
        stdout(&out),
        "ფანასკერტელ-ციციშვილის ქ.\tფანასკერტელ ციციშვილის\n\
         Chavchavadze Ave.\tchavchavadze\n\
         Aspindza I Street\taspindza\n"
    );
}

#[test]
fn canon_uses_config_rules() {
    let dir = tempfile::tempdir().unwrap();
    let config = std::fs::read_to_string(fixtures_dir().join("tbilisi.streets.toml"))
        .unwrap()
        .replace("[coords]", "[canonical]\nsuffixes = [\"ulitsa\"]\n\n[coords]");
    let path = dir.path().join("custom.streets.toml");
    std::fs::write(&path, config).unwrap();

    let out = streetlink()
        .args(["canon", "Lenina ulitsa", "Rustaveli Ave."])
        .arg("--config")
        .arg(&path)
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "Lenina ulitsa\tlenina\nRustaveli Ave.\trustaveli ave\n");
}
