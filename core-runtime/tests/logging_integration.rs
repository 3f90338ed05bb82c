//! Integration tests for logging system

use bridge_traits::logging::LogLevel;
use core_runtime::logging::{
    init_logging, redact_if_sensitive, token_fingerprint, LogFormat, LoggingConfig,
};

#[test]
fn test_logging_initialization_only_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    // Only test in this binary that installs a global subscriber.
    init_logging(config.clone()).expect("first init succeeds");
    let second = init_logging(config);
    assert!(second.is_err());
    assert!(second
        .unwrap_err()
        .to_string()
        .contains("Failed to initialize logging"));
}

#[test]
fn test_redaction_of_push_credentials() {
    assert_eq!(
        redact_if_sensitive("registration_token", "APA91bH..."),
        "[REDACTED]"
    );
    assert_eq!(redact_if_sensitive("access_token", "eyJhbGci"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("api_key", "k-123"), "[REDACTED]");
}

#[test]
fn test_redaction_of_usernames_that_are_emails() {
    let redacted = redact_if_sensitive("registered_username", "alice@example.com");

    assert!(redacted.starts_with('a'));
    assert!(redacted.contains("[REDACTED]"));
    assert!(!redacted.contains("example.com"));
}

#[test]
fn test_normal_values_pass_through() {
    assert_eq!(redact_if_sensitive("target", "all"), "all");
    assert_eq!(redact_if_sensitive("tags", "news,sports"), "news,sports");
    assert_eq!(redact_if_sensitive("attempt", "3"), "3");
}

#[test]
fn test_token_fingerprint_never_contains_whole_token() {
    let token = "APA91bGv9xkeMYm3dd2l7wQ";
    let fingerprint = token_fingerprint(token);

    assert!(!fingerprint.contains(token));
    assert!(fingerprint.ends_with("l7wQ"));
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Json);
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_filter("core_push=debug,core_service=trace")
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert_eq!(
        config.filter.as_deref(),
        Some("core_push=debug,core_service=trace")
    );
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
