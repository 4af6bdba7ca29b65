use std::fs;
use std::path::PathBuf;
use std::process::Output;

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("argflags_cli_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Schema with a required port, a boolean cache switch and a multi-value file list.
fn write_server_schema(dir: &TempDir) -> PathBuf {
    let json = serde_json::json!({
        "port": { "alias": "p", "type": "number", "required": true, "description": "Port" },
        "cache": { "alias": "c", "type": "boolean", "default": true },
        "file": { "alias": "f", "allowMultipleValues": true },
        "mode": { "options": ["fast", "slow"] }
    });
    let path = dir.join("schema.json");
    fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).expect("failed to write schema");
    path
}

fn run(args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_argflags"))
        .args(args)
        .output()
        .expect("failed to run argflags")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

#[test]
fn parse_line_resolves_aliases_and_defaults() {
    let dir = TempDir::new("parse_line");
    let schema = write_server_schema(&dir);

    let output = run(&[
        "--schema",
        schema.to_str().unwrap(),
        "parse",
        "--line",
        "serve -p 3000 -f a.js -f 'b c.js'",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report = stdout_json(&output);
    assert_eq!(report["valid"], true);
    assert_eq!(report["data"]["port"].as_f64(), Some(3000.0));
    assert_eq!(report["data"]["cache"], true);
    assert_eq!(report["data"]["file"], serde_json::json!(["a.js", "b c.js"]));
    assert_eq!(report["data"]["serve"], true);
    assert_eq!(report["data"]["mode"], serde_json::Value::Null);
    assert!(report["data"].get("p").is_none());
    assert_eq!(report["consumed"], 4);
}

#[test]
fn parse_trailing_args_without_schema() {
    let output = run(&["parse", "--", "-r", "-hdr", "CF-IPCountry=US", "demo.js"]);
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["data"]["r"], true);
    assert_eq!(report["data"]["hdr"], "CF-IPCountry=US");
    assert_eq!(report["data"]["demo.js"], true);
    assert_eq!(report["violations"], serde_json::json!([]));
}

#[test]
fn parse_reports_violations_without_failing() {
    let dir = TempDir::new("parse_violations");
    let schema = write_server_schema(&dir);

    let output = run(&[
        "--schema",
        schema.to_str().unwrap(),
        "parse",
        "--line",
        "--mode turbo",
    ]);
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["valid"], false);
    assert_eq!(
        report["violations"],
        serde_json::json!([
            "\"port\" is required.",
            "\"turbo\" is invalid. Expected one of: fast, slow"
        ])
    );
}

#[test]
fn parse_enforce_exits_with_violations() {
    let dir = TempDir::new("parse_enforce");
    let schema = write_server_schema(&dir);

    let output = run(&[
        "--schema",
        schema.to_str().unwrap(),
        "parse",
        "--enforce",
        "--",
        "--cache",
        "false",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("InvalidFlags: Process exited with error."));
    assert!(stderr.contains(" * \"port\" is required."));
}

#[test]
fn parse_enforce_passes_valid_input() {
    let dir = TempDir::new("parse_enforce_ok");
    let schema = write_server_schema(&dir);

    let output = run(&[
        "--schema",
        schema.to_str().unwrap(),
        "parse",
        "--enforce",
        "--",
        "--port",
        "8080",
        "--mode",
        "fast",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output)["data"]["port"].as_f64(), Some(8080.0));
}

#[test]
fn parse_strict_reports_unrecognized_flags() {
    let dir = TempDir::new("parse_strict");
    let schema = write_server_schema(&dir);

    let output = run(&[
        "--schema",
        schema.to_str().unwrap(),
        "--strict",
        "parse",
        "--line",
        "--port 80 --host example.org",
    ]);
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output)["violations"],
        serde_json::json!(["\"host\" is unrecognized."])
    );
}

#[test]
fn parse_ignore_types_accepts_mismatched_values() {
    let dir = TempDir::new("parse_ignore_types");
    let schema = write_server_schema(&dir);
    let schema = schema.to_str().unwrap();

    let output = run(&["--schema", schema, "parse", "--line", "--port http"]);
    assert_eq!(
        stdout_json(&output)["violations"],
        serde_json::json!(["\"port\" should be a number, not string."])
    );

    let output = run(&["--schema", schema, "--ignore-types", "parse", "--line", "--port http"]);
    assert_eq!(stdout_json(&output)["valid"], true);
}

#[test]
fn parse_yaml_output() {
    let output = run(&["--format", "yaml", "parse", "--line", "--name demo run"]);
    assert!(output.status.success());

    let report: serde_yaml::Value =
        serde_yaml::from_slice(&output.stdout).expect("stdout should be YAML");
    assert_eq!(report["data"]["name"], serde_yaml::Value::from("demo"));
    assert_eq!(report["data"]["run"], serde_yaml::Value::from(true));
}

// ---------------------------------------------------------------------------
// inspect / check
// ---------------------------------------------------------------------------

#[test]
fn inspect_lists_declared_flags_from_yaml() {
    let dir = TempDir::new("inspect_yaml");
    let path = dir.join("schema.yaml");
    fs::write(
        &path,
        "port:\n  alias: [p, P]\n  default: 8787\n  description: Port\nverbose:\n  type: boolean\n",
    )
    .unwrap();

    let output = run(&["--schema", path.to_str().unwrap(), "inspect"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let flags = stdout_json(&output);
    assert_eq!(flags[0]["name"], "port");
    assert_eq!(flags[0]["type"], "number");
    assert_eq!(flags[0]["aliases"], serde_json::json!(["p"]));
    assert_eq!(flags[0]["description"], "Port");
    assert_eq!(flags[0]["origin"], "declared");
    assert_eq!(flags[1]["name"], "verbose");
    assert_eq!(flags[1]["type"], "boolean");
}

#[test]
fn check_counts_declared_flags() {
    let dir = TempDir::new("check_ok");
    let schema = write_server_schema(&dir);

    let output = run(&["--schema", schema.to_str().unwrap(), "check"]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["flags"], 4);
}

#[test]
fn check_rejects_alias_conflicts() {
    let dir = TempDir::new("check_conflict");
    let path = dir.join("schema.json");
    fs::write(
        &path,
        r#"{ "port": { "alias": "p" }, "path": { "alias": "p" } }"#,
    )
    .unwrap();

    let output = run(&["--schema", path.to_str().unwrap(), "check"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("error: "));
}

#[test]
fn check_requires_schema() {
    let output = run(&["check"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--schema is required"));
}
