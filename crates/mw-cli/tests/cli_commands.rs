#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const LOG: &str = r#"<html><body><pre>
<span class="cyan">Corridor</span>
<span class="gray">A narrow corridor runs north and south.</span>
<span class="teal">[Exits: north south]</span>
&lt;100hp 80mv&gt; south
<span class="cyan">Clearing</span>
<span class="gray">Sunlight pours into a grassy clearing.</span>
<span class="teal">[Exits: north]</span>
<span class="olive">A rabbit nibbles the grass.</span>
&lt;100hp 80mv&gt; cast 'bind portal'
You bind the portal to this place. Its key is 'cl3ar'.
&lt;100hp 80mv&gt;
</pre></body></html>
"#;

fn session() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("session.log");
    fs::write(&log, LOG).unwrap();
    (dir, log)
}

fn mapwright() -> Command {
    let mut cmd = Command::cargo_bin("mapwright").unwrap();
    cmd.env_remove("MAPWRIGHT_API_URL").env_remove("RUST_LOG");
    cmd
}

#[test]
fn parse_only_prints_summary() {
    let (_dir, log) = session();
    mapwright()
        .arg(&log)
        .arg("--no-save")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rooms"))
        .stdout(predicate::str::contains("Fingerprinted rooms"))
        .stdout(predicate::str::contains("Not saved"));
}

#[test]
fn export_writes_snapshot() {
    let (dir, log) = session();
    let out = dir.path().join("map.json");
    mapwright()
        .arg(&log)
        .args(["--no-save", "--export"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported to"));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["rooms"].as_array().unwrap().len(), 2);
    assert_eq!(json["exits"].as_array().unwrap().len(), 2);
    assert_eq!(json["stats"]["promotions"], 1);
    let keys: Vec<&str> = json["rooms"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["key"].as_str())
        .collect();
    assert!(keys.contains(&"pk:cl3ar"));
}

#[test]
fn zone_override_is_applied() {
    let (dir, log) = session();
    let out = dir.path().join("map.json");
    mapwright()
        .arg(&log)
        .args(["--no-save", "--zone-id", "12", "--export"])
        .arg(&out)
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["default_zone"]["id"], 12);
    assert!(
        json["rooms"]
            .as_array()
            .unwrap()
            .iter()
            .all(|r| r["zone_id"] == 12)
    );
}

#[test]
fn missing_log_is_fatal() {
    mapwright()
        .arg("/nonexistent/session.log")
        .arg("--no-save")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: cannot read"));
}

#[test]
fn unreachable_store_is_not_fatal() {
    let (_dir, log) = session();
    mapwright()
        .arg(&log)
        .args(["--api-url", "http://127.0.0.1:9", "--timeout", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("failed"));
}

#[test]
fn failure_limit_flag_reaches_the_engine() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("shrine.log");
    fs::write(
        &log,
        r#"<span class="cyan">Shrine</span>
<span class="gray">A quiet shrine.</span>
<span class="teal">[Exits: east]</span>
&lt;100hp&gt; cast 'bind portal'
You lost your concentration!
&lt;100hp&gt;
"#,
    )
    .unwrap();
    let out = dir.path().join("map.json");
    mapwright()
        .arg(&log)
        .args(["--no-save", "--failure-limit", "1", "--similarity", "0.9", "--export"])
        .arg(&out)
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["rooms"][0]["no_magic"], true);
    assert_eq!(json["stats"]["no_magic_rooms"], 1);
}
