//! 레벨 필터 — 임계값 판정과 레벨별 표시 색상
//!
//! 레벨의 전순서는 [`LogLevel`]의 서수가 정의합니다.
//! 임계값 변경은 이후 디스패치되는 메시지에만 적용되며,
//! 이미 저장된 히스토리는 다시 필터링하지 않습니다.

use logrelay_core::config::LevelColors;
use logrelay_core::types::{LevelColor, LogLevel};

/// 레벨 임계값 + 색상 테이블
#[derive(Debug, Clone, Default)]
pub struct LevelFilter {
    threshold: LogLevel,
    colors: LevelColors,
}

impl LevelFilter {
    /// 임계값과 색상 테이블로 필터를 생성합니다.
    pub fn new(threshold: LogLevel, colors: LevelColors) -> Self {
        Self { threshold, colors }
    }

    /// `level.ordinal >= threshold.ordinal` 이면 통과합니다.
    pub fn admits(&self, level: LogLevel) -> bool {
        level.ordinal() >= self.threshold.ordinal()
    }

    pub fn threshold(&self) -> LogLevel {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: LogLevel) {
        self.threshold = threshold;
    }

    /// 레벨의 표시 색상
    pub fn color(&self, level: LogLevel) -> LevelColor {
        self.colors.get(level)
    }

    /// 레벨의 표시 색상을 변경합니다. 임계값에는 영향을 주지 않습니다.
    pub fn set_color(&mut self, level: LogLevel, color: LevelColor) {
        let slot = match level {
            LogLevel::Trace => &mut self.colors.trace,
            LogLevel::Debug => &mut self.colors.debug,
            LogLevel::Info => &mut self.colors.info,
            LogLevel::Warn => &mut self.colors.warn,
            LogLevel::Error => &mut self.colors.error,
            LogLevel::Fatal => &mut self.colors.fatal,
        };
        *slot = color;
    }

    pub fn colors(&self) -> &LevelColors {
        &self.colors
    }
}
