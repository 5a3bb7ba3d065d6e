//! logrelay.toml 통합 설정 테스트
//!
//! - logrelay.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 파일 로딩 / 잘못된 형식 에러 테스트

use std::io::Write;

use logrelay_core::config::RelayConfig;
use logrelay_core::error::{ConfigError, RelayError};
use logrelay_core::types::{LevelColor, LogLevel};

// =============================================================================
// logrelay.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../logrelay.toml.example");
    let config = RelayConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "pretty");
    assert_eq!(config.levels.threshold, LogLevel::Trace);
    assert_eq!(config.loggers.root_name, "Root");
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../logrelay.toml.example");
    let config = RelayConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let content = include_str!("../../../logrelay.toml.example");
    let from_file = RelayConfig::parse(content).expect("should parse");
    let from_code = RelayConfig::default();

    assert_eq!(from_file.general.log_level, from_code.general.log_level);
    assert_eq!(from_file.general.log_format, from_code.general.log_format);
    assert_eq!(from_file.levels.threshold, from_code.levels.threshold);
    assert_eq!(from_file.levels.colors, from_code.levels.colors);
    assert_eq!(from_file.loggers.root_name, from_code.loggers.root_name);
    assert_eq!(from_file.loggers.disabled, from_code.loggers.disabled);
    assert_eq!(
        from_file.dispatch.max_notify_batch,
        from_code.dispatch.max_notify_batch
    );
    assert_eq!(
        from_file.highlight.logger_on_select,
        from_code.highlight.logger_on_select
    );
    assert_eq!(
        from_file.highlight.messages_on_activate,
        from_code.highlight.messages_on_activate
    );
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_only_loggers_section() {
    let toml = r#"
[loggers]
root_name = "All"
disabled = ["com.noisy", "org.chatty.sub"]
"#;
    let config = RelayConfig::parse(toml).expect("should parse");
    assert_eq!(config.loggers.root_name, "All");
    assert_eq!(config.loggers.disabled.len(), 2);
    // 다른 섹션은 기본값
    assert_eq!(config.levels.threshold, LogLevel::Trace);
    assert_eq!(config.dispatch.max_notify_batch, 512);
}

#[test]
fn partial_config_only_one_color() {
    let toml = r##"
[levels.colors]
debug = "#0000FF"
"##;
    let config = RelayConfig::parse(toml).expect("should parse");
    assert_eq!(config.levels.colors.debug, LevelColor::rgb(0, 0, 0xFF));
    assert_eq!(config.levels.colors.info, LevelColor::rgb(0, 0x80, 0));
}

#[test]
fn invalid_toml_syntax_is_parse_error() {
    let err = RelayConfig::parse("[levels\nthreshold = ").unwrap_err();
    assert!(matches!(
        err,
        RelayError::Config(ConfigError::ParseFailed { .. })
    ));
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
async fn from_file_reads_and_validates() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[levels]\nthreshold = \"error\"").expect("write");

    let config = RelayConfig::from_file(file.path())
        .await
        .expect("should load");
    assert_eq!(config.levels.threshold, LogLevel::Error);
}

#[tokio::test]
async fn from_file_rejects_invalid_values() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[dispatch]\nmax_notify_batch = 0").expect("write");

    let err = RelayConfig::from_file(file.path()).await.unwrap_err();
    assert!(matches!(
        err,
        RelayError::Config(ConfigError::InvalidValue { .. })
    ));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[levels]
threshold = "info"
"#;

    let original = std::env::var("LOGRELAY_LEVELS_THRESHOLD").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("LOGRELAY_LEVELS_THRESHOLD", "fatal");
    }

    let mut config = RelayConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.levels.threshold;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("LOGRELAY_LEVELS_THRESHOLD", val),
            None => std::env::remove_var("LOGRELAY_LEVELS_THRESHOLD"),
        }
    }

    assert_eq!(result, LogLevel::Fatal);
}

#[test]
#[serial_test::serial]
fn env_override_general_section_for_host_logging() {
    let original = std::env::var("LOGRELAY_GENERAL_LOG_FORMAT").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("LOGRELAY_GENERAL_LOG_FORMAT", "yaml");
    }

    let mut config = RelayConfig::default();
    config.apply_env_overrides();
    let format = config.general.log_format.clone();
    let validated = config.validate();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("LOGRELAY_GENERAL_LOG_FORMAT", val),
            None => std::env::remove_var("LOGRELAY_GENERAL_LOG_FORMAT"),
        }
    }

    assert_eq!(format, "yaml");
    let err = validated.unwrap_err();
    assert!(matches!(
        err,
        RelayError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "general.log_format"
    ));
}

#[test]
#[serial_test::serial]
fn env_override_disabled_loggers_csv() {
    let original = std::env::var("LOGRELAY_LOGGERS_DISABLED").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("LOGRELAY_LOGGERS_DISABLED", "com.noisy, org.chatty");
    }

    let mut config = RelayConfig::default();
    config.apply_env_overrides();
    let result = config.loggers.disabled.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("LOGRELAY_LOGGERS_DISABLED", val),
            None => std::env::remove_var("LOGRELAY_LOGGERS_DISABLED"),
        }
    }

    assert_eq!(result, vec!["com.noisy", "org.chatty"]);
}

#[tokio::test]
#[serial_test::serial]
async fn load_applies_env_then_validates() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[dispatch]\nmax_notify_batch = 64").expect("write");

    let original = std::env::var("LOGRELAY_DISPATCH_MAX_NOTIFY_BATCH").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("LOGRELAY_DISPATCH_MAX_NOTIFY_BATCH", "0");
    }

    let result = RelayConfig::load(file.path()).await;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("LOGRELAY_DISPATCH_MAX_NOTIFY_BATCH", val),
            None => std::env::remove_var("LOGRELAY_DISPATCH_MAX_NOTIFY_BATCH"),
        }
    }

    // 환경변수가 0으로 덮어쓰므로 검증에서 실패해야 함
    assert!(matches!(
        result,
        Err(RelayError::Config(ConfigError::InvalidValue { .. }))
    ));
}

#[test]
fn serialize_and_reparse_roundtrip() {
    let original = RelayConfig::default();
    let toml_str = toml::to_string_pretty(&original).expect("should serialize");
    let reparsed = RelayConfig::parse(&toml_str).expect("should reparse");
    assert_eq!(original.levels.colors, reparsed.levels.colors);
    assert_eq!(original.loggers.root_name, reparsed.loggers.root_name);
}
