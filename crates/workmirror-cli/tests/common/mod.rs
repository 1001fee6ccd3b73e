use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};

/// Collection every test source mirrors into.
pub const TEST_COLLECTION: &str = "mk_feature_requests";

/// Run the CLI binary with an isolated HOME so no real settings are read.
pub fn run_cli(args: &[&str], home: &Path) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_workmirror"));
    cmd.args(args);
    cmd.env("HOME", home);
    cmd.env("XDG_CONFIG_HOME", home.join("config"));
    cmd.env("XDG_DATA_HOME", home.join("data"));
    cmd.env_remove("WORKMIRROR_CONFIG");
    cmd.env_remove("WORKMIRROR_STORE");
    cmd.env_remove("WORKMIRROR_POLL_INTERVAL");
    cmd.env_remove("RUST_LOG");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub fn run_cli_success(args: &[&str], home: &Path) -> String {
    let output = run_cli(args, home);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Write a settings file with one source pointed at `api_base`.
pub fn write_settings(dir: &Path, api_base: &str, store: &Path) -> PathBuf {
    let settings = json!({
        "api_base": api_base,
        "store_path": store,
        "sources": [{
            "name": "mk",
            "organization": "contoso",
            "project": "Fabrikam",
            "access_token": "test-pat",
            "item_type": "Feature Request",
            "states": ["New", "Active", "Under Consideration"],
            "collection": TEST_COLLECTION
        }]
    });
    write_json(dir, &settings)
}

pub fn write_json(dir: &Path, value: &Value) -> PathBuf {
    let path = dir.join("settings.json");
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}
