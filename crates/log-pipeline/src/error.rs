//! 디스패치 엔진 에러 타입
//!
//! [`DispatchError`]는 엔진의 제어 연산(노드 조회, 설정 검증 등)에서 발생하는
//! 에러를 표현합니다. 메시지 수집 경로(`submit`)는 에러를 반환하지 않습니다.
//! 수신기 생명주기 에러는 `ReceiverSet`이 `RelayError::Receiver`로 직접 반환합니다.
//! `From<DispatchError> for RelayError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logrelay_core::error::RelayError;

use crate::tree::NodeId;

/// 디스패치 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// 트리에 존재하지 않는 노드 (reset 이전에 발급된 ID 등)
    #[error("unknown logger node: {0}")]
    UnknownNode(NodeId),

    /// 빈 세그먼트나 제어 문자가 포함된 로거 이름
    #[error("invalid logger name: {0:?}")]
    InvalidLoggerName(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<DispatchError> for RelayError {
    fn from(err: DispatchError) -> Self {
        RelayError::Dispatch(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::LoggerTree;

    #[test]
    fn config_error_display() {
        let err = DispatchError::Config {
            field: "max_notify_batch".to_owned(),
            reason: "must be greater than 0".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("max_notify_batch"));
        assert!(msg.contains("greater than 0"));
    }

    #[test]
    fn every_variant_converts_to_dispatch() {
        let errors = [
            DispatchError::UnknownNode(LoggerTree::new("Root").root()),
            DispatchError::InvalidLoggerName("a..b".to_owned()),
            DispatchError::Config {
                field: "root_name".to_owned(),
                reason: "empty".to_owned(),
            },
        ];
        for err in errors {
            let expected = err.to_string();
            let relay: RelayError = err.into();
            match relay {
                RelayError::Dispatch(msg) => assert_eq!(msg, expected),
                other => panic!("unexpected conversion: {other:?}"),
            }
        }
    }
}
