//! 수신기 연결 — 엔진 싱크 핸들과 수신기 생명주기 관리
//!
//! - [`ReceiverHandle`]: 수신기 하나에 발급되는 [`LogSink`] 구현.
//!   분리(detach) 이후의 제출은 엔진에 닿기 전에 버려집니다.
//! - [`ReceiverSet`]: 이름으로 수신기를 등록하고 `initialize → attach`,
//!   `detach → terminate` 순서를 보장합니다.
//! - [`ChannelReceiver`]: `tokio::mpsc` 채널을 엔진에 연결하는 수신기
//!
//! # 아키텍처
//! 구체적인 전송 계층(UDP, 파일 tail, named pipe)은 이 크레이트 밖의 관심사입니다.
//! 수신기는 자체 스레드나 태스크에서 [`LogSink::submit`]만 호출합니다.

pub mod channel;

pub use channel::ChannelReceiver;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use logrelay_core::error::{ReceiverError, RelayError};
use logrelay_core::metrics as m;
use logrelay_core::pipeline::{LogSink, Receiver, ReceiverState};
use logrelay_core::types::{LogMessage, ReceiverId};

use crate::engine::{DiscardReason, DispatchEngine};

// ─── ReceiverHandle ──────────────────────────────────────────────────

/// 수신기별 엔진 싱크
///
/// [`DispatchEngine::register_receiver`]로 발급합니다.
pub struct ReceiverHandle {
    id: ReceiverId,
    name: String,
    engine: Arc<DispatchEngine>,
    attached: AtomicBool,
}

impl ReceiverHandle {
    pub(crate) fn new(name: String, engine: Arc<DispatchEngine>) -> Self {
        Self {
            id: ReceiverId::new(),
            name,
            engine,
            attached: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> ReceiverId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// 핸들을 분리합니다. 이후 제출은 버려집니다. 이미 진행 중인 제출은 끝까지 처리됩니다.
    pub fn detach(&self) {
        if self.attached.swap(false, Ordering::AcqRel) {
            tracing::debug!(receiver = %self.name, id = %self.id, "receiver handle detached");
        }
    }
}

impl LogSink for ReceiverHandle {
    fn receiver_id(&self) -> ReceiverId {
        self.id
    }

    fn submit(&self, batch: Vec<LogMessage>) {
        if !self.is_attached() {
            if !batch.is_empty() {
                self.engine
                    .record_discard(DiscardReason::Detached, batch.len() as u64);
            }
            return;
        }
        self.engine.submit(batch);
    }
}

impl fmt::Debug for ReceiverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiverHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("attached", &self.is_attached())
            .finish()
    }
}

// ─── ReceiverSet ─────────────────────────────────────────────────────

struct Entry {
    receiver: Box<dyn Receiver>,
    handle: Arc<ReceiverHandle>,
}

/// 수신기 세트 — 여러 수신기의 생명주기를 관리합니다.
///
/// 등록 순서가 보존되며, 이름은 세트 안에서 고유해야 합니다.
///
/// # 사용 예시
/// ```ignore
/// let mut receivers = ReceiverSet::new(Arc::clone(&engine));
/// receivers.add(Box::new(udp_receiver))?;
/// receivers.add(Box::new(file_receiver))?;
///
/// // ... 실행 중 ...
///
/// receivers.terminate_all()?;
/// ```
pub struct ReceiverSet {
    engine: Arc<DispatchEngine>,
    entries: Vec<Entry>,
}

impl ReceiverSet {
    pub fn new(engine: Arc<DispatchEngine>) -> Self {
        Self {
            engine,
            entries: Vec::new(),
        }
    }

    /// 수신기를 초기화하고 엔진에 연결합니다.
    ///
    /// 초기화에 실패하면 수신기를 최선 노력으로 종료하고 에러를 반환합니다.
    /// 실패한 수신기는 세트에 남지 않습니다.
    pub fn add(&mut self, mut receiver: Box<dyn Receiver>) -> Result<ReceiverId, RelayError> {
        let name = receiver.name().to_owned();
        if self.contains(&name) {
            return Err(ReceiverError::AlreadyRegistered { name }.into());
        }

        if let Err(e) = receiver.initialize() {
            tracing::warn!(receiver = %name, error = %e, "receiver failed to initialize");
            metrics::counter!(m::RECEIVER_LIFECYCLE_TOTAL, m::LABEL_RESULT => "failure")
                .increment(1);
            if let Err(te) = receiver.terminate() {
                tracing::debug!(receiver = %name, error = %te, "terminate after failed initialize also failed");
            }
            return Err(lifecycle_error(e, |reason| ReceiverError::InitFailed {
                name: name.clone(),
                reason,
            }));
        }

        let handle = self.engine.register_receiver(name.clone());
        receiver.attach(Arc::clone(&handle) as Arc<dyn LogSink>);
        let id = handle.id();
        self.entries.push(Entry { receiver, handle });

        metrics::counter!(m::RECEIVER_LIFECYCLE_TOTAL, m::LABEL_RESULT => "success").increment(1);
        self.update_gauge();
        tracing::info!(receiver = %name, %id, "receiver attached");
        Ok(id)
    }

    /// 수신기를 분리하고 종료한 뒤 소유권을 돌려줍니다.
    pub fn remove(&mut self, name: &str) -> Result<Box<dyn Receiver>, RelayError> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.receiver.name() == name)
            .ok_or_else(|| ReceiverError::NotFound {
                name: name.to_owned(),
            })?;
        let Entry {
            mut receiver,
            handle,
        } = self.entries.remove(idx);
        self.update_gauge();

        Self::shutdown(receiver.as_mut(), &handle)?;
        Ok(receiver)
    }

    /// 모든 수신기를 등록 순서대로 분리하고 종료합니다.
    ///
    /// 개별 실패가 있어도 나머지 수신기의 종료를 계속하며, 모든 에러를 모아 반환합니다.
    pub fn terminate_all(&mut self) -> Result<(), RelayError> {
        let mut errors = Vec::new();
        for Entry {
            mut receiver,
            handle,
        } in self.entries.drain(..)
        {
            if let Err(e) = Self::shutdown(receiver.as_mut(), &handle) {
                errors.push(format!("{}: {}", handle.name(), e));
            }
        }
        self.update_gauge();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ReceiverError::TerminateAllFailed(errors.join("; ")).into())
        }
    }

    fn shutdown(receiver: &mut dyn Receiver, handle: &ReceiverHandle) -> Result<(), RelayError> {
        // 수신기가 제출을 멈춘 뒤에 핸들을 닫습니다.
        receiver.detach();
        handle.detach();
        match receiver.terminate() {
            Ok(()) => {
                metrics::counter!(m::RECEIVER_LIFECYCLE_TOTAL, m::LABEL_RESULT => "success")
                    .increment(1);
                tracing::info!(receiver = %handle.name(), "receiver terminated");
                Ok(())
            }
            Err(e) => {
                metrics::counter!(m::RECEIVER_LIFECYCLE_TOTAL, m::LABEL_RESULT => "failure")
                    .increment(1);
                tracing::warn!(receiver = %handle.name(), error = %e, "receiver failed to terminate");
                Err(lifecycle_error(e, |reason| ReceiverError::TerminateFailed {
                    name: handle.name().to_owned(),
                    reason,
                }))
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.receiver.name() == name)
    }

    /// 이름으로 수신기의 싱크 핸들을 조회합니다.
    pub fn handle(&self, name: &str) -> Option<Arc<ReceiverHandle>> {
        self.entries
            .iter()
            .find(|e| e.receiver.name() == name)
            .map(|e| Arc::clone(&e.handle))
    }

    /// 등록 순서대로 수신기 이름과 상태를 반환합니다.
    pub fn statuses(&self) -> Vec<(String, ReceiverState)> {
        self.entries
            .iter()
            .map(|e| {
                let state = if e.handle.is_attached() {
                    ReceiverState::Attached
                } else {
                    ReceiverState::Terminated
                };
                (e.receiver.name().to_owned(), state)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn update_gauge(&self) {
        metrics::gauge!(m::RECEIVERS_ATTACHED).set(self.entries.len() as f64);
    }
}

/// 수신기가 이미 `ReceiverError`를 반환했다면 그대로, 아니면 `wrap`으로 감쌉니다.
fn lifecycle_error(err: RelayError, wrap: impl FnOnce(String) -> ReceiverError) -> RelayError {
    match err {
        e @ RelayError::Receiver(_) => e,
        other => wrap(other.to_string()).into(),
    }
}
