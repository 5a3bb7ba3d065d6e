//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 수신기, 디스패치 엔진, 소비자가 공유하는 데이터 구조를 정의합니다.
//! [`LogMessage`]는 생성 후 변경되지 않으며, 엔진은 수락한 메시지를
//! `Arc<LogMessage>`로 보관하여 히스토리와 알림이 같은 할당을 공유합니다.

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 로그 심각도 레벨
///
/// `Ord` 구현으로 심각도 비교가 가능합니다
/// (`Trace < Debug < Info < Warn < Error < Fatal`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 가장 상세한 추적 로그
    #[default]
    Trace,
    /// 디버깅용
    Debug,
    /// 정보성
    Info,
    /// 경고
    Warn,
    /// 에러
    Error,
    /// 치명적 에러
    Fatal,
}

impl LogLevel {
    /// 심각도 오름차순으로 정렬된 전체 레벨
    pub const ALL: [LogLevel; 6] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
    ];

    /// 레벨의 서수 (Trace = 0 ... Fatal = 5)
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// 서수에서 레벨을 얻습니다.
    ///
    /// 범위를 벗어난 값은 가장 가까운 유효 레벨로 고정됩니다.
    /// 수신기가 알 수 없는 서수를 보내도 메시지가 버려지지 않습니다.
    pub fn from_ordinal(ordinal: i64) -> Self {
        let clamped = ordinal.clamp(0, (Self::ALL.len() - 1) as i64);
        Self::ALL[clamped as usize]
    }

    /// 문자열에서 레벨을 파싱합니다.
    ///
    /// 대소문자를 구분하지 않으며, 흔히 쓰이는 별칭을 허용합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" | "verbose" | "finest" => Some(Self::Trace),
            "debug" | "fine" => Some(Self::Debug),
            "info" | "information" | "informational" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" | "err" => Some(Self::Error),
            "fatal" | "critical" | "crit" => Some(Self::Fatal),
            _ => None,
        }
    }

    /// 설정 파일에서 사용하는 소문자 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace => write!(f, "TRACE"),
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Fatal => write!(f, "FATAL"),
        }
    }
}

/// 레벨 표시 색상 (`#RRGGBB`)
///
/// 코어는 색상을 해석하지 않고 소비자에게 메타데이터로만 제공합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LevelColor {
    /// 빨강
    pub r: u8,
    /// 초록
    pub g: u8,
    /// 파랑
    pub b: u8,
}

impl LevelColor {
    /// RGB 값으로 색상을 생성합니다.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for LevelColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| format!("color '{s}' must start with '#'"))?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("color '{s}' must be in #RRGGBB form"));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|e| format!("color '{s}': {e}"))
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for LevelColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LevelColor> for String {
    fn from(color: LevelColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for LevelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// 수신기 식별자
///
/// 엔진은 이 값을 해석하지 않으며, 수신기별 제출 순서 추적과
/// 진단 로그에만 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverId(Uuid);

impl ReceiverId {
    /// 새 고유 식별자를 생성합니다.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReceiverId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReceiverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 로그 메시지
///
/// 하나의 로그 이벤트를 나타냅니다. 수신기가 생성하고, 디스패치 엔진이
/// 수락하는 순간 `sequence`가 부여됩니다. 이후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    logger_name: String,
    level: LogLevel,
    timestamp: SystemTime,
    thread_name: String,
    text: String,
    exception: Option<String>,
    sequence: u64,
}

impl LogMessage {
    /// 새 메시지를 생성합니다. 타임스탬프는 현재 시각입니다.
    pub fn new(logger_name: impl Into<String>, level: LogLevel, text: impl Into<String>) -> Self {
        Self {
            logger_name: logger_name.into(),
            level,
            timestamp: SystemTime::now(),
            thread_name: String::new(),
            text: text.into(),
            exception: None,
            sequence: 0,
        }
    }

    /// 원본 이벤트의 타임스탬프를 설정합니다.
    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// 이벤트를 기록한 스레드 이름을 설정합니다.
    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    /// 예외 텍스트를 설정합니다.
    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    /// 수락 시퀀스 번호를 부여합니다.
    ///
    /// 디스패치 엔진이 직렬화 경로에 메시지를 넣는 순간 호출합니다.
    /// 수신기가 미리 설정한 값은 덮어씁니다.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// 점(`.`)으로 구분된 로거 이름
    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    /// 심각도
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// 원본 이벤트 시각
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// 스레드 이름 (없으면 빈 문자열)
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    /// 메시지 본문
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 예외 텍스트
    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }

    /// 수락 시퀀스 번호. 아직 수락되지 않았으면 0입니다.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// 엔진이 수락한 메시지인지 확인합니다.
    pub fn is_accepted(&self) -> bool {
        self.sequence != 0
    }
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} [{}] {} - {}",
            self.sequence, self.level, self.logger_name, self.text,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering_follows_severity() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Fatal);
        for pair in LogLevel::ALL.windows(2) {
            assert!(pair[0].ordinal() < pair[1].ordinal());
        }
    }

    #[test]
    fn from_ordinal_clamps_out_of_range() {
        assert_eq!(LogLevel::from_ordinal(-3), LogLevel::Trace);
        assert_eq!(LogLevel::from_ordinal(2), LogLevel::Info);
        assert_eq!(LogLevel::from_ordinal(5), LogLevel::Fatal);
        assert_eq!(LogLevel::from_ordinal(42), LogLevel::Fatal);
    }

    #[test]
    fn from_str_loose_accepts_aliases() {
        assert_eq!(LogLevel::from_str_loose("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str_loose(" crit "), Some(LogLevel::Fatal));
        assert_eq!(LogLevel::from_str_loose("Info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_str_loose("loud"), None);
    }

    #[test]
    fn level_serializes_lowercase() {
        let json = serde_json::to_string(&LogLevel::Warn).unwrap();
        assert_eq!(json, "\"warn\"");
        let parsed: LogLevel = serde_json::from_str("\"fatal\"").unwrap();
        assert_eq!(parsed, LogLevel::Fatal);
    }

    #[test]
    fn level_color_parse_and_display() {
        let color: LevelColor = "#ffa500".parse().unwrap();
        assert_eq!(color, LevelColor::rgb(0xFF, 0xA5, 0x00));
        assert_eq!(color.to_string(), "#FFA500");
    }

    #[test]
    fn level_color_rejects_malformed() {
        assert!("ffa500".parse::<LevelColor>().is_err());
        assert!("#ffa50".parse::<LevelColor>().is_err());
        assert!("#gga500".parse::<LevelColor>().is_err());
    }

    #[test]
    fn message_builder_sets_optional_fields() {
        let msg = LogMessage::new("com.foo.Bar", LogLevel::Error, "request failed")
            .with_thread_name("worker-3")
            .with_exception("java.lang.IllegalStateException");
        assert_eq!(msg.logger_name(), "com.foo.Bar");
        assert_eq!(msg.thread_name(), "worker-3");
        assert_eq!(msg.exception(), Some("java.lang.IllegalStateException"));
        assert!(!msg.is_accepted());
    }

    #[test]
    fn with_sequence_marks_message_accepted() {
        let msg = LogMessage::new("a", LogLevel::Info, "x").with_sequence(7);
        assert!(msg.is_accepted());
        assert_eq!(msg.sequence(), 7);
        assert_eq!(msg.to_string(), "#7 [INFO] a - x");
    }

    #[test]
    fn receiver_ids_are_unique() {
        assert_ne!(ReceiverId::new(), ReceiverId::new());
    }
}
