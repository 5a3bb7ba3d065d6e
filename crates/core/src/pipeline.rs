//! 파이프라인 trait — 수신기와 소비자의 확장 포인트 정의
//!
//! 코어는 구체적인 수신기(소켓, 파일 tail, named pipe)를 알지 못하며,
//! 아래 세 trait을 통해서만 양쪽 협력자와 통신합니다.
//!
//! ```text
//! Receiver --(LogSink::submit)--> DispatchEngine --(LogConsumer::on_messages)--> Consumer
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;
use crate::types::{LogMessage, ReceiverId};

/// 수신기가 메시지 배치를 제출하는 대상
///
/// 임의의 스레드에서 동시에 호출될 수 있습니다.
/// `submit`은 실패하지 않으며, 일시정지나 분리 상태에서는 배치를 조용히 버립니다.
pub trait LogSink: Send + Sync {
    /// 이 싱크에 연결된 수신기의 식별자
    fn receiver_id(&self) -> ReceiverId;

    /// 메시지 배치를 제출합니다.
    fn submit(&self, batch: Vec<LogMessage>);
}

/// 수락된 메시지를 전달받는 소비자
///
/// 엔진은 서로 다른 배치에 대해 `on_messages`를 동시에 호출하지 않습니다.
/// 호출은 생산자 스레드에서 일어날 수 있으므로, 렌더링 스레드로의
/// 전환이 필요하면 소비자가 직접 처리해야 합니다.
///
/// `on_messages`에서 패닉하면 드레인 중이던 제출 스레드로 전파됩니다.
/// 이미 트리에 반영된 배치는 다시 전달되지 않으며, 큐에 남은 메시지는
/// 다음 제출 때 전달됩니다.
pub trait LogConsumer: Send + Sync {
    /// 트리와 히스토리에 반영이 끝난 메시지 묶음을 전달받습니다.
    fn on_messages(&self, accepted: &[Arc<LogMessage>]);
}

impl<F> LogConsumer for F
where
    F: Fn(&[Arc<LogMessage>]) + Send + Sync,
{
    fn on_messages(&self, accepted: &[Arc<LogMessage>]) {
        self(accepted)
    }
}

/// 알림을 버리는 소비자 (소비자를 등록하지 않았을 때 사용)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopConsumer;

impl LogConsumer for NoopConsumer {
    fn on_messages(&self, _accepted: &[Arc<LogMessage>]) {}
}

/// 수신기 생명주기 상태
///
/// 상태 전환:
/// - `Created` → `initialize()` → `Initialized`
/// - `Initialized` → `attach()` → `Attached`
/// - `Attached` → `detach()` + `terminate()` → `Terminated`
/// - 초기화/종료 실패 시 → `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiverState {
    /// 생성됨 (initialize 전)
    Created,
    /// 초기화 완료 (attach 가능)
    Initialized,
    /// 엔진에 연결되어 메시지 제출 중
    Attached,
    /// 종료됨
    Terminated,
    /// 오류 상태
    Failed,
}

impl fmt::Display for ReceiverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Initialized => write!(f, "initialized"),
            Self::Attached => write!(f, "attached"),
            Self::Terminated => write!(f, "terminated"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// 외부 로그 수신기 trait
///
/// 각 수신기는 자체 스레드(또는 태스크)에서 로그를 생산하며,
/// `attach`로 전달받은 [`LogSink`]에 배치를 제출합니다.
/// `detach`/`terminate` 이후에는 더 이상 `submit`을 호출하지 않아야 합니다.
///
/// # 구현 예시
/// ```ignore
/// struct PipeReceiver { sink: Option<Arc<dyn LogSink>> }
///
/// impl Receiver for PipeReceiver {
///     fn name(&self) -> &str { "pipe:log2console" }
///     fn initialize(&mut self) -> Result<(), RelayError> { Ok(()) }
///     fn attach(&mut self, sink: Arc<dyn LogSink>) { self.sink = Some(sink); }
///     fn detach(&mut self) { self.sink = None; }
///     fn terminate(&mut self) -> Result<(), RelayError> { Ok(()) }
/// }
/// ```
pub trait Receiver: Send {
    /// 수신기 고유 이름 (예: `"udp:0.0.0.0:7071"`)
    fn name(&self) -> &str;

    /// 전송 계층 리소스를 준비합니다.
    fn initialize(&mut self) -> Result<(), RelayError>;

    /// 메시지를 제출할 싱크를 연결합니다.
    fn attach(&mut self, sink: Arc<dyn LogSink>);

    /// 싱크 연결을 해제합니다.
    fn detach(&mut self);

    /// 전송 계층 리소스를 정리합니다.
    fn terminate(&mut self) -> Result<(), RelayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogLevel;
    use std::sync::Mutex;

    #[test]
    fn closure_is_a_consumer() {
        let seen = Mutex::new(Vec::new());
        let consumer = |msgs: &[Arc<LogMessage>]| {
            let mut seen = seen.lock().unwrap();
            seen.extend(msgs.iter().map(|m| m.text().to_owned()));
        };
        let msg = Arc::new(LogMessage::new("a", LogLevel::Info, "hello"));
        consumer.on_messages(&[msg]);
        assert_eq!(*seen.lock().unwrap(), vec!["hello"]);
    }

    #[test]
    fn noop_consumer_accepts_anything() {
        let msg = Arc::new(LogMessage::new("a", LogLevel::Info, "hello"));
        NoopConsumer.on_messages(&[msg]);
    }

    #[test]
    fn receiver_state_display() {
        assert_eq!(ReceiverState::Created.to_string(), "created");
        assert_eq!(ReceiverState::Initialized.to_string(), "initialized");
        assert_eq!(ReceiverState::Attached.to_string(), "attached");
        assert_eq!(ReceiverState::Terminated.to_string(), "terminated");
        assert_eq!(ReceiverState::Failed.to_string(), "failed");
    }
}
