//! Integration tests for logging system

use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug)
        .with_spans(true)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Debug);
    assert!(config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}

#[test]
fn test_default_level_is_info() {
    let config = LoggingConfig::default();
    assert_eq!(config.level, LogLevel::Info);
    assert!(config.filter.is_none());
    assert!(config.filter_directive().starts_with("info,"));
}

#[test]
fn test_levels_are_ordered_by_severity() {
    assert!(LogLevel::Trace < LogLevel::Debug);
    assert!(LogLevel::Debug < LogLevel::Info);
    assert!(LogLevel::Warn < LogLevel::Error);
    assert_eq!(LogLevel::Warn.as_str(), "warn");
}

#[test]
fn test_audio_backends_are_quieted() {
    let directive = LoggingConfig::default()
        .with_level(LogLevel::Trace)
        .filter_directive();

    assert!(directive.contains("bridge_desktop=trace"));
    assert!(directive.contains("cpal=warn"));
    assert!(directive.contains("symphonia=warn"));
}

#[test]
fn test_invalid_filter_is_rejected() {
    let config = LoggingConfig::default().with_filter("core_narration=[");
    assert!(init_logging(config).is_err());
}
