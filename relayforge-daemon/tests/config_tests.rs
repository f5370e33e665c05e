//! Configuration loading and validation tests.
//!
//! Tests TOML parsing, environment variable overrides, partial configs,
//! and validation.

use relayforge_core::config::RelayforgeConfig;
use serial_test::serial;
use std::env;

#[test]
fn test_parse_full_config() {
    // Given: A complete TOML config
    let toml_str = r#"
[general]
log_level = "debug"
log_format = "json"

[formats]
audit_log = true
schema = true
findings = false

[templates]
dir = "/opt/relayforge/templates"

[queue]
source_id = "sec-events"
file_path = "/var/lib/relayforge/queue.jsonl"
batch_size = 50

[destinations]
audit_channel = "audit-main"
columnar_bucket = "lake-bucket"
columnar_prefix = "security/events"
findings_queue = "findings-main"
dead_letter_queue = "dlq-main"

[delivery]
timeout_secs = 15
findings_max_attempts = 5
audit_max_records = 50
audit_max_bytes = 131072
"#;

    // When: Parsing config
    let result = RelayforgeConfig::parse(toml_str);

    // Then: Should succeed
    assert!(result.is_ok(), "full config should parse successfully");
    let config = result.expect("config should parse");

    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.general.log_format, "json");
    assert!(config.formats.audit_log);
    assert!(!config.formats.findings);
    assert_eq!(config.templates.dir, "/opt/relayforge/templates");
    assert_eq!(config.queue.source_id, "sec-events");
    assert_eq!(config.queue.batch_size, 50);
    assert_eq!(config.destinations.audit_channel, "audit-main");
    assert_eq!(config.destinations.columnar_prefix, "security/events");
    assert_eq!(config.delivery.timeout_secs, 15);
    assert_eq!(config.delivery.findings_max_attempts, 5);
    assert_eq!(config.delivery.audit_max_bytes, 131_072);
}

#[test]
fn test_partial_config_uses_defaults() {
    // Given: Only the queue section is specified
    let toml_str = r#"
[queue]
source_id = "custom-source"
"#;

    let config = RelayforgeConfig::parse(toml_str).expect("partial config should parse");

    // Then: Unspecified sections fall back to defaults
    assert_eq!(config.queue.source_id, "custom-source");
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert!(config.formats.audit_log);
    assert!(config.formats.schema);
    assert!(config.formats.findings);
    assert_eq!(config.queue.batch_size, 100);
    assert_eq!(config.delivery.audit_max_records, 100);
}

#[test]
fn test_empty_config_is_valid() {
    let config = RelayforgeConfig::parse("").expect("empty config should parse");
    assert!(config.validate().is_ok(), "defaults should validate");
}

#[test]
#[serial]
fn test_env_overrides() {
    // SAFETY: test runs serially, no other thread reads these vars
    unsafe {
        env::set_var("RELAYFORGE_GENERAL_LOG_LEVEL", "warn");
        env::set_var("RELAYFORGE_FORMATS_FINDINGS", "false");
        env::set_var("RELAYFORGE_QUEUE_BATCH_SIZE", "25");
        env::set_var("RELAYFORGE_DELIVERY_TIMEOUT_SECS", "60");
    }

    let mut config = RelayforgeConfig::default();
    config.apply_env_overrides();

    assert_eq!(config.general.log_level, "warn");
    assert!(!config.formats.findings);
    assert_eq!(config.queue.batch_size, 25);
    assert_eq!(config.delivery.timeout_secs, 60);

    // SAFETY: same serial test, cleanup
    unsafe {
        env::remove_var("RELAYFORGE_GENERAL_LOG_LEVEL");
        env::remove_var("RELAYFORGE_FORMATS_FINDINGS");
        env::remove_var("RELAYFORGE_QUEUE_BATCH_SIZE");
        env::remove_var("RELAYFORGE_DELIVERY_TIMEOUT_SECS");
    }
}

#[test]
#[serial]
fn test_env_override_bad_value_keeps_config() {
    // SAFETY: test runs serially, no other thread reads these vars
    unsafe {
        env::set_var("RELAYFORGE_QUEUE_BATCH_SIZE", "not-a-number");
    }

    let mut config = RelayforgeConfig::default();
    config.apply_env_overrides();

    // Unparseable value is ignored with a warning
    assert_eq!(config.queue.batch_size, 100);

    // SAFETY: same serial test, cleanup
    unsafe {
        env::remove_var("RELAYFORGE_QUEUE_BATCH_SIZE");
    }
}

#[test]
fn test_validation_rejects_all_formats_disabled() {
    let mut config = RelayforgeConfig::default();
    config.formats.audit_log = false;
    config.formats.schema = false;
    config.formats.findings = false;

    let err = config.validate().expect_err("should reject");
    assert!(err.to_string().contains("at least one output format"));
}

#[test]
fn test_validation_rejects_missing_destination_for_enabled_format() {
    let mut config = RelayforgeConfig::default();
    config.destinations.findings_queue = String::new();

    let err = config.validate().expect_err("should reject");
    assert!(err.to_string().contains("findings_queue"));
}

#[test]
fn test_validation_rejects_audit_caps_above_destination_limit() {
    let mut config = RelayforgeConfig::default();
    config.delivery.audit_max_records = 500;
    assert!(config.validate().is_err());

    let mut config = RelayforgeConfig::default();
    config.delivery.audit_max_bytes = 1024 * 1024;
    assert!(config.validate().is_err());
}

#[tokio::test]
async fn test_load_from_file_applies_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relayforge.toml");
    tokio::fs::write(&path, "[general]\nlog_level = \"shouting\"\n")
        .await
        .unwrap();

    let result = RelayforgeConfig::load(&path).await;
    assert!(result.is_err(), "invalid log level should fail load");
}
