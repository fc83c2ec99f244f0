use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn tabular_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_tabular"))
}

fn run_cli(home: &Path, args: &[&str]) -> Output {
    Command::new(tabular_bin())
        .args(args)
        .env("TABULAR_HOME", home)
        .env_remove("TABULAR_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute tabular CLI")
}

fn run_cli_json(home: &Path, args: &[&str]) -> Value {
    let output = run_cli(home, args);
    assert!(
        output.status.success(),
        "command failed: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
        panic!(
            "failed to parse JSON output: {}\nstdout:\n{}",
            err,
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

fn schema_json() -> Value {
    json!([
        { "id": "1", "name": "done", "columnType": "BOOLEAN" },
        { "id": "2", "name": "title", "columnType": "STRING", "maximumSize": 10 },
        { "id": "3", "name": "attachment", "columnType": "FILEHANDLEID" }
    ])
}

#[test]
fn test_infer_csv() {
    let home = TempDir::new().unwrap();
    let csv = write(home.path(), "data.csv", "flag,count,ratio\ntrue,1,0.5\nfalse,22,3\n");

    let out = run_cli_json(home.path(), &["infer", &csv]);
    assert_eq!(out["extension"], "csv");
    assert_eq!(out["contentType"], "text/csv");
    let types: Vec<&str> = out["suggestedColumns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["columnType"].as_str().unwrap())
        .collect();
    assert_eq!(types, ["BOOLEAN", "INTEGER", "DOUBLE"]);
    assert_eq!(out["rowsScanned"], 2);
}

#[test]
fn test_validate_row_set() {
    let home = TempDir::new().unwrap();
    let schema = write(home.path(), "schema.json", &schema_json().to_string());
    let rows = write(
        home.path(),
        "rows.json",
        &json!({
            "tableId": "syn9",
            "headers": [
                { "id": "1", "name": "done" },
                null,
                { "id": "3", "name": "attachment" }
            ],
            "rows": [
                { "rowId": 1, "versionNumber": 2, "values": ["FalSE", "ignored", "55"] },
                { "rowId": 2, "versionNumber": 2, "values": [] }
            ]
        })
        .to_string(),
    );
    let out_file = home.path().join("changes.json");

    let summary = run_cli_json(
        home.path(),
        &["validate", "--schema", &schema, "--rows", &rows, "--out", out_file.to_str().unwrap()],
    );
    assert_eq!(summary["tableId"], "syn9");
    assert_eq!(summary["rowCount"], 2);
    assert_eq!(summary["deleteCount"], 1);
    assert_eq!(summary["fileHandleIds"], json!([55]));

    let dto: Value = serde_json::from_str(&fs::read_to_string(&out_file).unwrap()).unwrap();
    assert_eq!(dto["columnIds"], json!(["1", "2", "3"]));
    assert_eq!(dto["rows"][0]["values"]["1"], "false");
    assert!(dto["rows"][0]["values"].get("2").is_none());
    assert!(dto["rows"][1]["values"].is_null());
}

#[test]
fn test_validate_reports_bad_cell() {
    let home = TempDir::new().unwrap();
    let schema = write(home.path(), "schema.json", &schema_json().to_string());
    let rows = write(
        home.path(),
        "rows.json",
        &json!({
            "tableId": "syn9",
            "headers": [{ "id": "2", "name": "title" }],
            "rows": [{ "rowId": 1, "versionNumber": 1, "values": ["much too long"] }]
        })
        .to_string(),
    );

    let output = run_cli(home.path(), &["validate", "--schema", &schema, "--rows", &rows]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Value at [0,1] was not a valid STRING."), "{stderr}");
}

#[test]
fn test_validate_partial_rows() {
    let home = TempDir::new().unwrap();
    let schema = write(home.path(), "schema.json", &schema_json().to_string());
    let rows = write(
        home.path(),
        "partial.json",
        &json!({
            "tableId": "syn9",
            "rows": [
                { "rowId": 4, "values": { "2": "hi" } },
                { "rowId": 5, "values": {} },
                { "rowId": 6, "values": null }
            ]
        })
        .to_string(),
    );
    let last = write(
        home.path(),
        "last.json",
        &json!({ "tableId": "syn9", "rowVersion": 8, "etag": "abc" }).to_string(),
    );

    let dto = run_cli_json(
        home.path(),
        &["validate", "--schema", &schema, "--rows", &rows, "--partial", "--last-change", &last],
    );
    assert_eq!(dto["etag"], "abc");
    assert_eq!(dto["rows"].as_array().unwrap().len(), 2);
    assert_eq!(dto["rows"][0]["versionNumber"], 8);
    assert_eq!(dto["rows"][0]["values"]["2"], "hi");
    assert!(dto["rows"][1]["values"].is_null());
}

#[test]
fn test_config_budget_applies() {
    let home = TempDir::new().unwrap();
    write(home.path(), "config.toml", "[limits]\nmax_bytes_per_request = 10\n");
    let schema = write(home.path(), "schema.json", &schema_json().to_string());
    let rows = write(
        home.path(),
        "rows.json",
        &json!({
            "tableId": "syn9",
            "headers": [{ "id": "2", "name": "title" }],
            "rows": [{ "values": ["x"] }]
        })
        .to_string(),
    );

    let output = run_cli(home.path(), &["validate", "--schema", &schema, "--rows", &rows]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("(10 bytes)"), "{stderr}");
}

#[test]
fn test_diff() {
    let home = TempDir::new().unwrap();
    let out = run_cli_json(home.path(), &["diff", "--old", "1,2", "--new", "2,4"]);
    assert_eq!(
        out["changes"],
        json!([
            { "oldColumnId": "1", "newColumnId": null },
            { "oldColumnId": null, "newColumnId": "4" }
        ])
    );
    assert_eq!(out["temporaryTableNeeded"], false);

    let out = run_cli_json(home.path(), &["diff", "--new", "7"]);
    assert_eq!(out["changes"], json!([{ "oldColumnId": null, "newColumnId": "7" }]));
}

#[test]
fn test_pack_unpack() {
    let home = TempDir::new().unwrap();
    let change_set = json!({
        "tableId": "syn9",
        "etag": "e",
        "columnIds": ["1", "2"],
        "rows": [
            { "rowId": 1, "versionNumber": 3, "values": { "1": "true", "2": null } },
            { "rowId": 2, "versionNumber": 3, "values": null }
        ]
    });
    let input = write(home.path(), "changes.json", &change_set.to_string());
    let packed = home.path().join("changes.bin");

    let output = run_cli(home.path(), &["pack", &input, packed.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let unpacked = run_cli_json(home.path(), &["unpack", packed.to_str().unwrap()]);
    assert_eq!(unpacked["tableId"], "syn9");
    assert_eq!(unpacked["rows"][0]["values"]["1"], "true");
    assert!(unpacked["rows"][0]["values"]["2"].is_null());
    assert!(unpacked["rows"][1]["values"].is_null());

    fs::write(&packed, b"\x01\x01\x00\x00garbage").unwrap();
    let output = run_cli(home.path(), &["unpack", packed.to_str().unwrap()]);
    assert!(!output.status.success());
}
