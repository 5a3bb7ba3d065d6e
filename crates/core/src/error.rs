//! 에러 타입 — 도메인별 에러 정의

/// logrelay 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 수신기 생명주기 에러
    #[error("receiver error: {0}")]
    Receiver(#[from] ReceiverError),

    /// 디스패치 엔진 에러
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 수신기 생명주기 에러
///
/// 수신기의 `initialize`/`terminate` 실패는 디스패치 경로가 아니라
/// 생명주기 호출자에게 반환됩니다.
#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    /// 초기화 실패
    #[error("receiver '{name}' failed to initialize: {reason}")]
    InitFailed { name: String, reason: String },

    /// 종료 실패
    #[error("receiver '{name}' failed to terminate: {reason}")]
    TerminateFailed { name: String, reason: String },

    /// 이미 같은 이름의 수신기가 등록됨
    #[error("receiver already registered: {name}")]
    AlreadyRegistered { name: String },

    /// 등록되지 않은 수신기
    #[error("receiver not found: {name}")]
    NotFound { name: String },

    /// 현재 상태에서 허용되지 않는 전환
    #[error("receiver '{name}' is {state}, cannot {operation}")]
    InvalidState {
        name: String,
        state: String,
        operation: String,
    },

    /// 여러 수신기의 일괄 종료 중 발생한 에러 모음
    #[error("some receivers failed to terminate: {0}")]
    TerminateAllFailed(String),
}
