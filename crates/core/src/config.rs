//! 설정 관리 — logrelay.toml 파싱 및 런타임 설정
//!
//! [`RelayConfig`]는 엔진과 호스트 프로세스가 공유하는 최상위 설정 구조체입니다.
//! 설정 저장 형식 자체는 호스트의 관심사이며, 코어는 파싱된 값만 사용합니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`LOGRELAY_LEVELS_THRESHOLD=warn` 형식)
//! 2. 설정 파일 (`logrelay.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logrelay_core::error::RelayError> {
//! use logrelay_core::config::RelayConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = RelayConfig::load("logrelay.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = RelayConfig::parse("[levels]\nthreshold = \"warn\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, RelayError};
use crate::types::{LevelColor, LogLevel};

/// logrelay 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 레벨 임계값 및 색상
    #[serde(default)]
    pub levels: LevelsConfig,
    /// 로거 트리 설정
    #[serde(default)]
    pub loggers: LoggersConfig,
    /// 디스패치 엔진 설정
    #[serde(default)]
    pub dispatch: DispatchSection,
    /// 선택 강조 설정
    #[serde(default)]
    pub highlight: HighlightConfig,
}

impl RelayConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RelayError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, RelayError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RelayError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                RelayError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, RelayError> {
        toml::from_str(toml_str).map_err(|e| {
            RelayError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGRELAY_{SECTION}_{FIELD}`
    /// 예: `LOGRELAY_LOGGERS_DISABLED=com.noisy,org.chatty`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGRELAY_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGRELAY_GENERAL_LOG_FORMAT");

        // Levels
        override_level(&mut self.levels.threshold, "LOGRELAY_LEVELS_THRESHOLD");

        // Loggers
        override_string(&mut self.loggers.root_name, "LOGRELAY_LOGGERS_ROOT_NAME");
        override_csv(&mut self.loggers.disabled, "LOGRELAY_LOGGERS_DISABLED");

        // Dispatch
        override_usize(
            &mut self.dispatch.max_notify_batch,
            "LOGRELAY_DISPATCH_MAX_NOTIFY_BATCH",
        );

        // Highlight
        override_bool(
            &mut self.highlight.logger_on_select,
            "LOGRELAY_HIGHLIGHT_LOGGER_ON_SELECT",
        );
        override_bool(
            &mut self.highlight.messages_on_activate,
            "LOGRELAY_HIGHLIGHT_MESSAGES_ON_ACTIVATE",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), RelayError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.loggers.root_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "loggers.root_name".to_owned(),
                reason: "root logger name must not be empty".to_owned(),
            }
            .into());
        }

        if let Some(name) = self.loggers.disabled.iter().find(|n| n.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "loggers.disabled".to_owned(),
                reason: format!("logger name '{name}' must not be empty"),
            }
            .into());
        }

        if self.dispatch.max_notify_batch == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dispatch.max_notify_batch".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
///
/// 엔진은 이 섹션을 읽지 않습니다. 엔진을 내장한 호스트 프로세스가
/// tracing 구독자를 설치할 때 사용하며, 코어는 값의 검증과
/// 환경변수 오버라이드만 담당합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 호스트 프로세스의 tracing 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 호스트 프로세스의 tracing 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 레벨 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelsConfig {
    /// 소비자에게 전달할 최소 레벨
    pub threshold: LogLevel,
    /// 레벨별 표시 색상
    pub colors: LevelColors,
}

/// 레벨별 표시 색상
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelColors {
    pub trace: LevelColor,
    pub debug: LevelColor,
    pub info: LevelColor,
    pub warn: LevelColor,
    pub error: LevelColor,
    pub fatal: LevelColor,
}

impl LevelColors {
    /// 레벨에 해당하는 색상을 반환합니다.
    pub fn get(&self, level: LogLevel) -> LevelColor {
        match level {
            LogLevel::Trace => self.trace,
            LogLevel::Debug => self.debug,
            LogLevel::Info => self.info,
            LogLevel::Warn => self.warn,
            LogLevel::Error => self.error,
            LogLevel::Fatal => self.fatal,
        }
    }
}

impl Default for LevelColors {
    fn default() -> Self {
        Self {
            trace: LevelColor::rgb(0x80, 0x80, 0x80),
            debug: LevelColor::rgb(0x00, 0x00, 0x00),
            info: LevelColor::rgb(0x00, 0x80, 0x00),
            warn: LevelColor::rgb(0xFF, 0xA5, 0x00),
            error: LevelColor::rgb(0xFF, 0x00, 0x00),
            fatal: LevelColor::rgb(0x80, 0x00, 0x80),
        }
    }
}

/// 로거 트리 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggersConfig {
    /// 루트 로거 표시 이름
    pub root_name: String,
    /// 시작 시 비활성화할 로거 이름 목록
    pub disabled: Vec<String>,
}

impl Default for LoggersConfig {
    fn default() -> Self {
        Self {
            root_name: "Root".to_owned(),
            disabled: Vec::new(),
        }
    }
}

/// 디스패치 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSection {
    /// `on_messages` 한 번에 전달할 최대 메시지 수
    pub max_notify_batch: usize,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            max_notify_batch: 512,
        }
    }
}

/// 선택 강조 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// 메시지를 선택하면 소속 로거를 강조
    pub logger_on_select: bool,
    /// 로거를 활성화(더블 클릭 등)하면 그 로거의 메시지를 강조
    pub messages_on_activate: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            logger_on_select: true,
            messages_on_activate: true,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_level(target: &mut LogLevel, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match LogLevel::from_str_loose(&val) {
            Some(parsed) => *target = parsed,
            None => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse log level from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = RelayConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.levels.threshold, LogLevel::Trace);
        assert_eq!(config.loggers.root_name, "Root");
        assert!(config.loggers.disabled.is_empty());
        assert_eq!(config.dispatch.max_notify_batch, 512);
        assert!(config.highlight.logger_on_select);
    }

    #[test]
    fn default_config_passes_validation() {
        RelayConfig::default().validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = RelayConfig::parse("").unwrap();
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.levels.colors, LevelColors::default());
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r##"
[levels]
threshold = "warn"

[levels.colors]
warn = "#FFFF00"

[loggers]
disabled = ["com.noisy"]
"##;
        let config = RelayConfig::parse(toml).unwrap();
        assert_eq!(config.levels.threshold, LogLevel::Warn);
        assert_eq!(config.levels.colors.warn, LevelColor::rgb(0xFF, 0xFF, 0x00));
        // 나머지 색상은 기본값 유지
        assert_eq!(config.levels.colors.error, LevelColors::default().error);
        assert_eq!(config.loggers.disabled, vec!["com.noisy"]);
        assert_eq!(config.loggers.root_name, "Root");
    }

    #[test]
    fn from_str_invalid_color_returns_error() {
        let toml = r#"
[levels.colors]
info = "green"
"#;
        let err = RelayConfig::parse(toml).unwrap_err();
        assert!(matches!(
            err,
            RelayError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn from_str_unknown_threshold_returns_error() {
        let err = RelayConfig::parse("[levels]\nthreshold = \"loud\"").unwrap_err();
        assert!(matches!(
            err,
            RelayError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = RelayConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_zero_notify_batch() {
        let mut config = RelayConfig::default();
        config.dispatch.max_notify_batch = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_notify_batch"));
    }

    #[test]
    fn validate_rejects_blank_disabled_logger() {
        let mut config = RelayConfig::default();
        config.loggers.disabled = vec!["a.b".to_owned(), "  ".to_owned()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn level_colors_lookup_by_level() {
        let colors = LevelColors::default();
        assert_eq!(colors.get(LogLevel::Error), LevelColor::rgb(0xFF, 0, 0));
        assert_eq!(colors.get(LogLevel::Fatal), colors.fatal);
    }

    #[test]
    fn env_override_level_valid() {
        let mut val = LogLevel::Trace;
        // SAFETY: 테스트는 고유한 변수명을 사용하므로 다른 테스트와 충돌하지 않습니다.
        unsafe { std::env::set_var("TEST_LOGRELAY_LEVEL", "Error") };
        override_level(&mut val, "TEST_LOGRELAY_LEVEL");
        assert_eq!(val, LogLevel::Error);
        unsafe { std::env::remove_var("TEST_LOGRELAY_LEVEL") };
    }

    #[test]
    fn env_override_level_invalid_keeps_original() {
        let mut val = LogLevel::Info;
        // SAFETY: 테스트는 고유한 변수명을 사용하므로 다른 테스트와 충돌하지 않습니다.
        unsafe { std::env::set_var("TEST_LOGRELAY_LEVEL_BAD", "loud") };
        override_level(&mut val, "TEST_LOGRELAY_LEVEL_BAD");
        assert_eq!(val, LogLevel::Info);
        unsafe { std::env::remove_var("TEST_LOGRELAY_LEVEL_BAD") };
    }

    #[test]
    fn env_override_csv_skips_blank_entries() {
        let mut val = vec!["a".to_owned()];
        // SAFETY: 테스트는 고유한 변수명을 사용하므로 다른 테스트와 충돌하지 않습니다.
        unsafe { std::env::set_var("TEST_LOGRELAY_CSV", "x.y, ,z") };
        override_csv(&mut val, "TEST_LOGRELAY_CSV");
        assert_eq!(val, vec!["x.y", "z"]);
        unsafe { std::env::remove_var("TEST_LOGRELAY_CSV") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_LOGRELAY_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let mut config = RelayConfig::default();
        config.levels.threshold = LogLevel::Error;
        config.loggers.disabled = vec!["com.noisy".to_owned()];
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = RelayConfig::parse(&toml_str).unwrap();
        assert_eq!(parsed.levels.threshold, LogLevel::Error);
        assert_eq!(parsed.levels.colors, config.levels.colors);
        assert_eq!(parsed.loggers.disabled, config.loggers.disabled);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = RelayConfig::from_file("/nonexistent/path/logrelay.toml").await;
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            RelayError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
