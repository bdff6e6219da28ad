#![cfg(feature = "cli")]

use assert_cmd::Command;
use serde_json::Value;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("image-api-smoke").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn lists_cases_as_json() {
    let output = cmd().args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());
    let listing: Value = serde_json::from_slice(&output.stdout).unwrap();
    let cases: Vec<&str> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["case"].as_str().unwrap())
        .collect();
    assert_eq!(
        cases,
        vec![
            "test_register_image",
            "test_store_image_file",
            "test_get_image_file",
            "test_create_import_task",
            "test_attempt_duplicate_import_task",
        ]
    );
}

#[test]
fn disabled_suite_is_skipped_without_contacting_endpoint() {
    let temp = tempfile::tempdir().unwrap();
    let config = temp.path().join("smoke.json");
    std::fs::write(
        &config,
        serde_json::to_vec(&serde_json::json!({
            "client": { "base_url": "http://127.0.0.1:9", "tenant_id": "tenant-a" },
            "capabilities": { "allow_post_images": false }
        }))
        .unwrap(),
    )
    .unwrap();

    let output = cmd()
        .arg("--config")
        .arg(&config)
        .args(["run", "--suite", "image-operations", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    let reports: Value = serde_json::from_slice(&output.stdout).unwrap();
    let cases = reports[0]["cases"].as_array().unwrap();
    assert_eq!(cases.len(), 3);
    for case in cases {
        assert_eq!(case["outcome"], "skipped");
        assert_eq!(
            case["reason"],
            "Functionality disabled with provided endpoint"
        );
    }
}

#[test]
fn missing_endpoint_is_a_config_error() {
    let temp = tempfile::tempdir().unwrap();
    let output = cmd()
        .current_dir(temp.path())
        .env_remove("IMAGES_ENDPOINT")
        .env_remove("IMAGES_TENANT_ID")
        .args(["run"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("IMAGES_ENDPOINT"), "{stderr}");
}

#[test]
fn import_suite_without_source_is_a_config_error() {
    let temp = tempfile::tempdir().unwrap();
    let config = temp.path().join("smoke.json");
    std::fs::write(
        &config,
        serde_json::to_vec(&serde_json::json!({
            "client": { "base_url": "http://127.0.0.1:9", "tenant_id": "tenant-a" }
        }))
        .unwrap(),
    )
    .unwrap();

    let output = cmd()
        .arg("--config")
        .arg(&config)
        .args(["run", "--suite", "import-task"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("import_from"), "{stderr}");
}
