mod common;

use common::DeskTest;

// ============================================================================
// Config command tests
// ============================================================================

#[test]
fn test_config_show_empty() {
    let desk = DeskTest::new();

    let output = desk.run_success(&["config", "show"]);
    assert!(output.contains("Configuration"));
    assert!(output.contains("not configured"));
}

#[test]
fn test_config_set_and_get_url() {
    let desk = DeskTest::new();

    desk.run_success(&["config", "set", "service.url", "https://desk.example.com"]);
    let output = desk.run_success(&["config", "get", "service_url"]);
    assert_eq!(output.trim(), "https://desk.example.com");
    assert!(desk.read_config().contains("desk.example.com"));
}

#[test]
fn test_config_rejects_bad_values() {
    let desk = DeskTest::new();

    let stderr = desk.run_failure(&["config", "set", "service_url", "not a url"]);
    assert!(stderr.contains("URL error"));

    let stderr = desk.run_failure(&["config", "set", "timezone", "Mars/Olympus"]);
    assert!(stderr.contains("unknown timezone"));

    let stderr = desk.run_failure(&["config", "set", "invalid.key", "value"]);
    assert!(stderr.contains("unknown config key"));
}

#[test]
fn test_config_api_key_is_masked() {
    let desk = DeskTest::new();

    let output = desk.run_success(&["config", "set", "api_key", "abcdef123456"]);
    assert!(!output.contains("abcdef123456"));

    let output = desk.run_success(&["config", "get", "api-key"]);
    assert!(output.contains("ab...56"));
    assert!(!output.contains("abcdef123456"));

    let output = desk.run_success(&["config", "show", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["auth"]["api_key_configured"], true);
    assert!(!output.contains("abcdef123456"));
}

#[test]
fn test_config_get_not_set() {
    let desk = DeskTest::new();

    let stderr = desk.run_failure(&["config", "get", "identity_url"]);
    assert!(stderr.contains("not set"));
}

// ============================================================================
// Session command tests
// ============================================================================

#[test]
fn test_whoami_without_session() {
    let desk = DeskTest::new();

    let stderr = desk.run_failure(&["whoami"]);
    assert!(stderr.contains("not signed in"));
}

#[test]
fn test_whoami_reads_persisted_session() {
    let desk = DeskTest::new();
    desk.write_session(
        r#"{"user":{"id":"u1","name":"Sarah Chen","email":"sarah@example.com"},"token":"t"}"#,
    );

    let output = desk.run_success(&["whoami", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["user"]["name"], "Sarah Chen");
}

#[test]
fn test_logout_removes_session() {
    let desk = DeskTest::new();
    desk.write_session(r#"{"user":{"id":"u1","name":"Sarah Chen"},"token":"t"}"#);

    let output = desk.run_success(&["logout", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["was_signed_in"], true);
    assert!(!desk.session_exists());

    let output = desk.run_success(&["logout"]);
    assert!(output.contains("Not signed in"));
}

#[test]
fn test_corrupt_session_counts_as_signed_out() {
    let desk = DeskTest::new();
    desk.write_session("{ not json");

    let stderr = desk.run_failure(&["whoami"]);
    assert!(stderr.contains("not signed in"));
}

#[test]
fn test_ls_requires_sign_in() {
    let desk = DeskTest::new();
    desk.write_config(
        "identity_url: https://id.example.com\nservice_url: https://desk.example.com\n",
    );

    let stderr = desk.run_failure(&["ls"]);
    assert!(stderr.contains("not signed in"));
}

#[test]
fn test_ls_requires_hosts() {
    let desk = DeskTest::new();

    let stderr = desk.run_failure(&["ls"]);
    assert!(stderr.contains("not configured"));
}

// ============================================================================
// Argument validation
// ============================================================================

#[test]
fn test_invalid_status_rejected() {
    let desk = DeskTest::new();

    let stderr = desk.run_failure(&["ls", "--status", "pending"]);
    assert!(stderr.contains("Invalid status"));
}

#[test]
fn test_invalid_priority_rejected() {
    let desk = DeskTest::new();

    let stderr = desk.run_failure(&["create", "Broken printer", "--priority", "11"]);
    assert!(stderr.contains("invalid priority"));
}

#[test]
fn test_help_lists_commands() {
    let desk = DeskTest::new();

    let output = desk.run_success(&["--help"]);
    for command in ["login", "ls", "board", "move", "note", "project"] {
        assert!(output.contains(command), "help is missing {command}");
    }
}
