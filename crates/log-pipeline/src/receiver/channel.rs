//! tokio 채널 수신기
//!
//! 비동기 생산자가 `tokio::mpsc` 채널로 보낸 배치를 엔진 싱크로 전달합니다.
//! 전달 루프는 `initialize` 시점에 캡처한 런타임의 태스크에서 실행되며,
//! 송신 측이 모두 닫히거나 cancellation token이 발동되면 종료합니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use logrelay_core::error::{ReceiverError, RelayError};
use logrelay_core::pipeline::{LogSink, Receiver, ReceiverState};
use logrelay_core::types::LogMessage;

/// `tokio::mpsc` 채널 기반 수신기
pub struct ChannelReceiver {
    name: String,
    rx: Option<mpsc::Receiver<Vec<LogMessage>>>,
    runtime: Option<Handle>,
    cancel: CancellationToken,
    state: ReceiverState,
    forwarded: Arc<AtomicU64>,
}

impl ChannelReceiver {
    /// 기존 채널 수신 측으로 수신기를 생성합니다.
    pub fn new(name: impl Into<String>, rx: mpsc::Receiver<Vec<LogMessage>>) -> Self {
        Self {
            name: name.into(),
            rx: Some(rx),
            runtime: None,
            cancel: CancellationToken::new(),
            state: ReceiverState::Created,
            forwarded: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 새 채널을 만들고 수신기와 송신 측을 함께 반환합니다.
    pub fn channel(
        name: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Sender<Vec<LogMessage>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(name, rx), tx)
    }

    /// 전달 태스크를 실행할 런타임을 지정합니다.
    ///
    /// 지정하지 않으면 `initialize`를 호출한 컨텍스트의 런타임을 사용합니다.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// 엔진 싱크로 넘긴 메시지 수
    pub fn forwarded_count(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    fn invalid_state(&self, operation: &str) -> RelayError {
        ReceiverError::InvalidState {
            name: self.name.clone(),
            state: self.state.to_string(),
            operation: operation.to_owned(),
        }
        .into()
    }

    async fn run(
        name: String,
        mut rx: mpsc::Receiver<Vec<LogMessage>>,
        sink: Arc<dyn LogSink>,
        cancel: CancellationToken,
        forwarded: Arc<AtomicU64>,
    ) {
        tracing::info!(receiver = %name, "channel receiver started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(receiver = %name, "channel receiver received shutdown signal");
                    break;
                }
                batch = rx.recv() => {
                    match batch {
                        Some(batch) => {
                            let count = batch.len() as u64;
                            sink.submit(batch);
                            forwarded.fetch_add(count, Ordering::Relaxed);
                        }
                        None => {
                            tracing::info!(receiver = %name, "channel closed, shutting down channel receiver");
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl Receiver for ChannelReceiver {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self) -> Result<(), RelayError> {
        if self.state != ReceiverState::Created {
            return Err(self.invalid_state("initialize"));
        }
        if self.runtime.is_none() {
            match Handle::try_current() {
                Ok(handle) => self.runtime = Some(handle),
                Err(e) => {
                    self.state = ReceiverState::Failed;
                    return Err(ReceiverError::InitFailed {
                        name: self.name.clone(),
                        reason: format!("no tokio runtime available: {e}"),
                    }
                    .into());
                }
            }
        }
        self.state = ReceiverState::Initialized;
        Ok(())
    }

    fn attach(&mut self, sink: Arc<dyn LogSink>) {
        if self.state != ReceiverState::Initialized {
            tracing::warn!(receiver = %self.name, state = %self.state, "attach ignored");
            return;
        }
        let (Some(rx), Some(runtime)) = (self.rx.take(), self.runtime.as_ref()) else {
            tracing::warn!(receiver = %self.name, "attach ignored, channel already consumed");
            return;
        };
        runtime.spawn(Self::run(
            self.name.clone(),
            rx,
            sink,
            self.cancel.clone(),
            Arc::clone(&self.forwarded),
        ));
        self.state = ReceiverState::Attached;
    }

    fn detach(&mut self) {
        self.cancel.cancel();
    }

    fn terminate(&mut self) -> Result<(), RelayError> {
        self.cancel.cancel();
        if self.state != ReceiverState::Failed {
            self.state = ReceiverState::Terminated;
        }
        Ok(())
    }
}

impl Drop for ChannelReceiver {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
