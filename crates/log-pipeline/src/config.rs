//! 디스패치 엔진 설정
//!
//! [`DispatchConfig`]는 core의 [`RelayConfig`](logrelay_core::config::RelayConfig)를
//! 기반으로 엔진이 실제로 사용하는 값만 평탄화한 설정입니다.
//!
//! # 사용 예시
//! ```ignore
//! use logrelay_core::config::RelayConfig;
//! use logrelay_pipeline::config::DispatchConfig;
//!
//! let core_config = RelayConfig::default();
//! let config = DispatchConfig::from_core(&core_config);
//! ```

use serde::{Deserialize, Serialize};

use logrelay_core::config::{LevelColors, RelayConfig};
use logrelay_core::types::LogLevel;

use crate::error::DispatchError;
use crate::tree::is_valid_logger_name;

/// 디스패치 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// 소비자에게 전달할 최소 레벨
    pub threshold: LogLevel,
    /// 레벨별 표시 색상
    pub colors: LevelColors,
    /// 루트 로거 표시 이름
    pub root_name: String,
    /// 엔진 생성 직후 비활성화할 로거 이름
    pub disabled_loggers: Vec<String>,
    /// `on_messages` 한 번에 전달할 최대 메시지 수
    pub max_notify_batch: usize,
    /// `select_message` 시 소속 로거를 강조할지 여부
    pub highlight_logger_on_select: bool,
    /// `activate_logger` 시 로거의 메시지를 강조할지 여부
    pub highlight_messages_on_activate: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::from_core(&RelayConfig::default())
    }
}

impl DispatchConfig {
    /// core 설정에서 디스패치 설정을 생성합니다.
    pub fn from_core(core: &RelayConfig) -> Self {
        Self {
            threshold: core.levels.threshold,
            colors: core.levels.colors.clone(),
            root_name: core.loggers.root_name.clone(),
            disabled_loggers: core.loggers.disabled.clone(),
            max_notify_batch: core.dispatch.max_notify_batch,
            highlight_logger_on_select: core.highlight.logger_on_select,
            highlight_messages_on_activate: core.highlight.messages_on_activate,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.root_name.trim().is_empty() {
            return Err(DispatchError::Config {
                field: "root_name".to_owned(),
                reason: "root logger name must not be empty".to_owned(),
            });
        }

        if self.max_notify_batch == 0 {
            return Err(DispatchError::Config {
                field: "max_notify_batch".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if let Some(name) = self
            .disabled_loggers
            .iter()
            .find(|n| !is_valid_logger_name(n))
        {
            return Err(DispatchError::Config {
                field: "disabled_loggers".to_owned(),
                reason: format!("logger name '{name}' is malformed"),
            });
        }

        Ok(())
    }
}

/// 디스패치 설정 빌더
#[derive(Default)]
pub struct DispatchConfigBuilder {
    config: DispatchConfig,
}

impl DispatchConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 레벨 임계값을 설정합니다.
    pub fn threshold(mut self, threshold: LogLevel) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// 레벨 색상 테이블을 설정합니다.
    pub fn colors(mut self, colors: LevelColors) -> Self {
        self.config.colors = colors;
        self
    }

    /// 루트 로거 이름을 설정합니다.
    pub fn root_name(mut self, name: impl Into<String>) -> Self {
        self.config.root_name = name.into();
        self
    }

    /// 시작 시 비활성화할 로거를 추가합니다.
    pub fn disable_logger(mut self, name: impl Into<String>) -> Self {
        self.config.disabled_loggers.push(name.into());
        self
    }

    /// 알림 배치 크기를 설정합니다.
    pub fn max_notify_batch(mut self, size: usize) -> Self {
        self.config.max_notify_batch = size;
        self
    }

    /// 메시지 선택 시 로거 강조 여부를 설정합니다.
    pub fn highlight_logger_on_select(mut self, enabled: bool) -> Self {
        self.config.highlight_logger_on_select = enabled;
        self
    }

    /// 로거 활성화 시 메시지 강조 여부를 설정합니다.
    pub fn highlight_messages_on_activate(mut self, enabled: bool) -> Self {
        self.config.highlight_messages_on_activate = enabled;
        self
    }

    /// 설정을 검증하고 `DispatchConfig`를 생성합니다.
    pub fn build(self) -> Result<DispatchConfig, DispatchError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logrelay_core::types::LevelColor;

    #[test]
    fn default_config_is_valid() {
        DispatchConfig::default().validate().unwrap();
    }

    #[test]
    fn from_core_preserves_values() {
        let mut core = RelayConfig::default();
        core.levels.threshold = LogLevel::Warn;
        core.loggers.root_name = "All".to_owned();
        core.loggers.disabled = vec!["com.noisy".to_owned()];
        core.dispatch.max_notify_batch = 16;
        core.highlight.logger_on_select = false;

        let config = DispatchConfig::from_core(&core);
        assert_eq!(config.threshold, LogLevel::Warn);
        assert_eq!(config.root_name, "All");
        assert_eq!(config.disabled_loggers, vec!["com.noisy"]);
        assert_eq!(config.max_notify_batch, 16);
        assert!(!config.highlight_logger_on_select);
        assert!(config.highlight_messages_on_activate);
    }

    #[test]
    fn validate_rejects_blank_root_name() {
        let config = DispatchConfig {
            root_name: "  ".to_owned(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DispatchError::Config { ref field, .. }) if field == "root_name"
        ));
    }

    #[test]
    fn builder_creates_valid_config() {
        let mut colors = LevelColors::default();
        colors.debug = LevelColor::rgb(0, 0, 0xFF);

        let config = DispatchConfigBuilder::new()
            .threshold(LogLevel::Info)
            .colors(colors)
            .disable_logger("a.b")
            .max_notify_batch(8)
            .build()
            .unwrap();
        assert_eq!(config.threshold, LogLevel::Info);
        assert_eq!(config.colors.debug, LevelColor::rgb(0, 0, 0xFF));
        assert_eq!(config.disabled_loggers, vec!["a.b"]);
        assert_eq!(config.max_notify_batch, 8);
    }

    #[test]
    fn builder_rejects_invalid_config() {
        assert!(DispatchConfigBuilder::new().max_notify_batch(0).build().is_err());
        assert!(DispatchConfigBuilder::new().disable_logger("").build().is_err());
        assert!(DispatchConfigBuilder::new().disable_logger("a..b").build().is_err());
    }
}
