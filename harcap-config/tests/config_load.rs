use harcap_config::{CaptureStrategy, HarcapConfigLoader};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a JSON file in a temp dir and return its path.
fn write_json(tmp: &TempDir, name: &str, json: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, json).expect("write json");
    p
}

#[test]
#[serial]
fn loads_a_full_config_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_json(
        &tmp,
        "config.json",
        r#"{
            "scenario": "visit",
            "output_har_filename": "capture.har",
            "wait_time_after_script": 2.5,
            "run_args": ["value1", "value2"],
            "headless": true
        }"#,
    );

    let config = HarcapConfigLoader::new()
        .with_file(p)
        .load()
        .expect("load capture config");

    assert_eq!(config.scenario, "visit");
    assert_eq!(config.output_har_filename, PathBuf::from("capture.har"));
    assert_eq!(config.wait_time_after_script, 2.5);
    assert_eq!(config.run_args, ["value1", "value2"]);
    assert!(config.headless);
    assert_eq!(config.strategy, CaptureStrategy::Trace);
    assert_eq!(config.webdriver_url, "http://localhost:9515");
}

#[test]
#[serial]
fn missing_file_is_a_readable_fatal_error() {
    let err = HarcapConfigLoader::new()
        .with_file("/definitely/not/here/config.json")
        .load()
        .expect_err("missing file must fail");
    let msg = err.to_string();
    assert!(msg.contains("config.json"), "unhelpful error: {msg}");
}

#[test]
#[serial]
fn invalid_json_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let p = write_json(&tmp, "config.json", "{not json");
    assert!(HarcapConfigLoader::new().with_file(p).load().is_err());
}

#[test]
#[serial]
fn missing_required_key_is_rejected() {
    let err = HarcapConfigLoader::new()
        .with_json_str(r#"{"output_har_filename": "out.har"}"#)
        .load()
        .expect_err("scenario is required");
    assert!(err.to_string().contains("scenario"));
}

#[test]
#[serial]
fn env_placeholders_expand_inside_values() {
    temp_env::with_var("CAPTURE_BASE", Some("nightly"), || {
        let config = HarcapConfigLoader::new()
            .with_json_str(
                r#"{
                    "scenario": "visit",
                    "output_har_filename": "${CAPTURE_BASE}.har"
                }"#,
            )
            .load()
            .expect("valid config");
        assert_eq!(config.output_har_filename, PathBuf::from("nightly.har"));
    });
}

#[test]
#[serial]
fn proxy_strategy_without_endpoint_is_rejected() {
    let err = HarcapConfigLoader::new()
        .with_json_str(
            r#"{
                "scenario": "visit",
                "output_har_filename": "out.har",
                "strategy": "proxy"
            }"#,
        )
        .load()
        .expect_err("proxy strategy needs proxy_url");
    assert!(err.to_string().contains("proxy_url"));
}
