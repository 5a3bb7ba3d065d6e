//! 디스패치 엔진 — 동시 수신기 제출을 단일 처리 경로로 직렬화합니다.
//!
//! [`DispatchEngine`]은 로거 트리와 메시지 히스토리의 유일한 변경 주체입니다.
//!
//! # 내부 아키텍처
//! ```text
//! Receiver threads --submit--> [ingress queue] --drain (한 번에 하나)--> LoggerTree + history
//!                                                                  \--> LogConsumer::on_messages
//! ```
//!
//! `submit`은 ingress 락 안에서 시퀀스 번호를 부여하고 큐에 넣습니다.
//! 드레인 중인 스레드가 없으면 호출한 스레드가 드레인 책임을 가져가서,
//! 자신이 넣은 배치와 그 뒤에 쌓인 배치를 큐가 빌 때까지 처리합니다.
//! 드레인 소유권(`draining`)은 ingress 락 안에서만 바뀌므로
//! 두 스레드가 동시에 드레인하는 경우는 구조적으로 발생하지 않습니다.
//!
//! 락 순서는 항상 `ingress` → 해제 → `state` 입니다. 두 락을 동시에 잡지 않으며,
//! 소비자 호출 중에는 어떤 락도 잡고 있지 않습니다.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use logrelay_core::config::LevelColors;
use logrelay_core::metrics as m;
use logrelay_core::pipeline::{LogConsumer, NoopConsumer};
use logrelay_core::types::{LevelColor, LogLevel, LogMessage};

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::highlight::SearchHighlighter;
use crate::level::LevelFilter;
use crate::receiver::ReceiverHandle;
use crate::tree::{HighlightKind, LoggerNode, LoggerTree, NodeId, is_valid_logger_name};

/// 첫 번째로 수락되는 메시지의 시퀀스 번호 (0은 "미수락")
const FIRST_SEQUENCE: u64 = 1;

/// 폐기 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DiscardReason {
    /// 엔진 일시정지 중
    Paused,
    /// 수신기가 이미 분리됨
    Detached,
}

impl DiscardReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::Paused => "paused",
            Self::Detached => "detached",
        }
    }
}

/// 수집 큐 (ingress 락으로 보호)
struct Ingress {
    queue: VecDeque<Arc<LogMessage>>,
    draining: bool,
    paused: bool,
    next_sequence: u64,
}

/// 트리 + 필터 (state 락으로 보호)
struct EngineState {
    tree: LoggerTree,
    filter: LevelFilter,
}

#[derive(Default)]
struct Counters {
    accepted: AtomicU64,
    discarded_paused: AtomicU64,
    discarded_detached: AtomicU64,
    notified: AtomicU64,
    filtered: AtomicU64,
    anomalies: AtomicU64,
}

/// 엔진 통계 스냅샷
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// 시퀀스 번호를 받은 메시지 수
    pub accepted: u64,
    /// 일시정지 중 폐기된 메시지 수
    pub discarded_paused: u64,
    /// 수신기 분리 후 폐기된 메시지 수
    pub discarded_detached: u64,
    /// 소비자에게 전달된 메시지 수
    pub notified: u64,
    /// 히스토리에만 저장된 메시지 수
    pub filtered: u64,
    /// 잘못된 로거 이름으로 루트에 귀속된 메시지 수
    pub anomalies: u64,
}

/// 로그 디스패치 엔진
///
/// 명시적으로 생성해서 협력자에게 `Arc`로 넘깁니다. 전역 인스턴스는 없습니다.
///
/// # 사용 예시
/// ```ignore
/// use logrelay_pipeline::DispatchEngineBuilder;
///
/// let engine = DispatchEngineBuilder::new()
///     .config(config)
///     .consumer(|accepted: &[Arc<LogMessage>]| render(accepted))
///     .build()?;
///
/// let handle = engine.register_receiver("udp:7071");
/// receiver.attach(handle);
/// ```
pub struct DispatchEngine {
    config: DispatchConfig,
    consumer: Arc<dyn LogConsumer>,
    ingress: Mutex<Ingress>,
    state: Mutex<EngineState>,
    counters: Counters,
}

impl DispatchEngine {
    fn new(config: DispatchConfig, consumer: Arc<dyn LogConsumer>) -> Self {
        let state = EngineState {
            tree: LoggerTree::new(config.root_name.clone()),
            filter: LevelFilter::new(config.threshold, config.colors.clone()),
        };
        Self {
            config,
            consumer,
            ingress: Mutex::new(Ingress {
                queue: VecDeque::new(),
                draining: false,
                paused: false,
                next_sequence: FIRST_SEQUENCE,
            }),
            state: Mutex::new(state),
            counters: Counters::default(),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// 수신기용 싱크 핸들을 발급합니다.
    pub fn register_receiver(self: &Arc<Self>, name: impl Into<String>) -> Arc<ReceiverHandle> {
        let handle = Arc::new(ReceiverHandle::new(name.into(), Arc::clone(self)));
        tracing::debug!(receiver = %handle.name(), id = %handle.id(), "receiver handle issued");
        handle
    }

    // ─── 수집 경로 ──────────────────────────────────────────────────────

    /// 메시지 배치를 제출합니다. 어떤 스레드에서든 동시에 호출할 수 있습니다.
    ///
    /// 일시정지 중이면 배치를 버립니다. 그렇지 않으면 각 메시지에 시퀀스 번호를
    /// 부여해 큐에 넣고, 드레인 중인 스레드가 없으면 직접 드레인합니다.
    ///
    /// 드레인 중 소비자가 패닉하면 그 패닉은 이 호출로 전파됩니다.
    /// 드레인 소유권은 반납되고, 큐에 남은 메시지는 다음 `submit`이 전달합니다.
    pub fn submit(&self, batch: Vec<LogMessage>) {
        if batch.is_empty() {
            return;
        }
        let count = batch.len() as u64;

        let mut ingress = lock(&self.ingress);
        if ingress.paused {
            drop(ingress);
            self.record_discard(DiscardReason::Paused, count);
            return;
        }
        for message in batch {
            let sequence = ingress.next_sequence;
            ingress.next_sequence += 1;
            ingress
                .queue
                .push_back(Arc::new(message.with_sequence(sequence)));
        }
        let owns_drain = !ingress.draining;
        ingress.draining = true;
        drop(ingress);

        self.counters.accepted.fetch_add(count, Ordering::Relaxed);
        metrics::counter!(m::DISPATCH_MESSAGES_ACCEPTED_TOTAL).increment(count);

        if owns_drain {
            self.drain();
        }
    }

    pub(crate) fn record_discard(&self, reason: DiscardReason, count: u64) {
        let counter = match reason {
            DiscardReason::Paused => &self.counters.discarded_paused,
            DiscardReason::Detached => &self.counters.discarded_detached,
        };
        counter.fetch_add(count, Ordering::Relaxed);
        metrics::counter!(m::DISPATCH_MESSAGES_DISCARDED_TOTAL, m::LABEL_REASON => reason.as_str())
            .increment(count);
        tracing::trace!(count, reason = reason.as_str(), "batch discarded");
    }

    /// 큐가 빌 때까지 청크 단위로 처리합니다. 드레인 소유자만 호출합니다.
    fn drain(&self) {
        let mut guard = DrainGuard {
            ingress: &self.ingress,
            released: false,
        };
        loop {
            let chunk: Vec<Arc<LogMessage>> = {
                let mut ingress = lock(&self.ingress);
                debug_assert!(ingress.draining, "drain running without ownership");
                if ingress.queue.is_empty() {
                    ingress.draining = false;
                    guard.released = true;
                    return;
                }
                let take = ingress.queue.len().min(self.config.max_notify_batch);
                ingress.queue.drain(..take).collect()
            };

            let accepted = self.apply(chunk);
            if !accepted.is_empty() {
                self.notify(&accepted);
            }
        }
    }

    /// 청크를 트리와 히스토리에 반영하고, 소비자에게 전달할 메시지를 반환합니다.
    fn apply(&self, chunk: Vec<Arc<LogMessage>>) -> Vec<Arc<LogMessage>> {
        let started = Instant::now();
        let processed = chunk.len();
        let mut anomalies = 0u64;
        let mut accepted = Vec::with_capacity(processed);

        let mut guard = lock(&self.state);
        let state = &mut *guard;
        for message in chunk {
            let (node, anomaly) = state.tree.resolve_or_root(message.logger_name());
            if anomaly {
                anomalies += 1;
                tracing::debug!(
                    logger = message.logger_name(),
                    sequence = message.sequence(),
                    "malformed logger name, attributed to root"
                );
            }

            // 비활성화는 설정 시점에 하위로 전파되므로 노드 자신의 상태만 보면 됩니다.
            let enabled = state.tree.node(node).is_some_and(LoggerNode::is_enabled);
            let admitted = enabled && state.filter.admits(message.level());
            state.tree.append(node, Arc::clone(&message));
            if admitted {
                accepted.push(message);
            }
        }
        state.tree.clear_highlight(HighlightKind::Messages);
        let node_count = state.tree.len();
        drop(guard);

        let filtered = (processed - accepted.len()) as u64;
        self.counters.filtered.fetch_add(filtered, Ordering::Relaxed);
        self.counters.anomalies.fetch_add(anomalies, Ordering::Relaxed);
        metrics::counter!(m::DISPATCH_MESSAGES_FILTERED_TOTAL).increment(filtered);
        metrics::counter!(m::DISPATCH_INGESTION_ANOMALIES_TOTAL).increment(anomalies);
        metrics::gauge!(m::DISPATCH_LOGGER_NODES).set(node_count as f64);
        metrics::histogram!(m::DISPATCH_DRAIN_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        tracing::trace!(
            processed,
            accepted = accepted.len(),
            filtered,
            "applied drained chunk"
        );
        accepted
    }

    fn notify(&self, accepted: &[Arc<LogMessage>]) {
        self.consumer.on_messages(accepted);

        let mut per_level = [0u64; LogLevel::ALL.len()];
        for message in accepted {
            per_level[usize::from(message.level().ordinal())] += 1;
        }
        for level in LogLevel::ALL {
            let n = per_level[usize::from(level.ordinal())];
            if n > 0 {
                metrics::counter!(m::DISPATCH_MESSAGES_NOTIFIED_TOTAL, m::LABEL_LEVEL => level.as_str())
                    .increment(n);
            }
        }
        self.counters
            .notified
            .fetch_add(accepted.len() as u64, Ordering::Relaxed);
    }

    // ─── 제어 연산 ──────────────────────────────────────────────────────

    /// 이후 제출되는 배치를 버립니다. 이미 큐에 들어간 배치는 정상 처리됩니다.
    pub fn pause(&self) {
        lock(&self.ingress).paused = true;
        tracing::debug!("dispatch paused");
    }

    /// 이후 제출되는 배치부터 다시 수락합니다.
    pub fn resume(&self) {
        lock(&self.ingress).paused = false;
        tracing::debug!("dispatch resumed");
    }

    pub fn is_paused(&self) -> bool {
        lock(&self.ingress).paused
    }

    /// 레벨 임계값을 변경합니다. 저장된 히스토리는 다시 필터링하지 않습니다.
    pub fn set_level_threshold(&self, level: LogLevel) {
        lock(&self.state).filter.set_threshold(level);
        tracing::debug!(threshold = %level, "level threshold changed");
    }

    pub fn level_threshold(&self) -> LogLevel {
        lock(&self.state).filter.threshold()
    }

    pub fn set_level_color(&self, level: LogLevel, color: LevelColor) {
        lock(&self.state).filter.set_color(level, color);
    }

    pub fn level_color(&self, level: LogLevel) -> LevelColor {
        lock(&self.state).filter.color(level)
    }

    pub fn level_colors(&self) -> LevelColors {
        lock(&self.state).filter.colors().clone()
    }

    /// 모든 노드의 히스토리를 비웁니다. 트리 구조와 활성 상태는 유지합니다.
    pub fn clear_messages(&self) {
        let mut state = lock(&self.state);
        let removed = state.tree.message_count();
        state.tree.clear_messages();
        drop(state);
        tracing::info!(removed, "message history cleared");
    }

    /// 루트 아래의 트리 전체를 버립니다. 이전 [`NodeId`]는 모두 무효가 됩니다.
    pub fn clear_loggers(&self) {
        let mut state = lock(&self.state);
        let removed = state.tree.len() - 1;
        state.tree.reset();
        drop(state);
        metrics::gauge!(m::DISPATCH_LOGGER_NODES).set(1.0);
        tracing::info!(removed, "logger tree cleared");
    }

    /// `clear_messages` + `clear_loggers`
    pub fn clear_all(&self) {
        self.clear_messages();
        self.clear_loggers();
    }

    // ─── 트리 조회/변경 ─────────────────────────────────────────────────

    pub fn root(&self) -> NodeId {
        lock(&self.state).tree.root()
    }

    /// 이름을 노드로 해석합니다. 필요한 노드를 생성합니다.
    pub fn resolve(&self, logger_name: &str) -> NodeId {
        lock(&self.state).tree.resolve(logger_name)
    }

    /// 노드를 생성하지 않고 조회합니다.
    pub fn find_logger(&self, logger_name: &str) -> Option<NodeId> {
        lock(&self.state).tree.find(logger_name)
    }

    /// 노드와 모든 하위 노드의 활성 상태를 설정합니다.
    pub fn set_enabled(&self, node: NodeId, enabled: bool) -> Result<(), DispatchError> {
        lock(&self.state).tree.set_enabled(node, enabled)?;
        tracing::debug!(%node, enabled, "logger enabled state changed");
        Ok(())
    }

    /// 이름으로 로거의 활성 상태를 설정합니다. 아직 없는 로거는 생성합니다.
    ///
    /// 잘못된 이름은 루트로 대체되지 않고 에러가 됩니다.
    pub fn set_logger_enabled(
        &self,
        logger_name: &str,
        enabled: bool,
    ) -> Result<NodeId, DispatchError> {
        if !is_valid_logger_name(logger_name) {
            return Err(DispatchError::InvalidLoggerName(logger_name.to_owned()));
        }
        let mut state = lock(&self.state);
        let node = state.tree.resolve(logger_name);
        state.tree.set_enabled(node, enabled)?;
        drop(state);
        tracing::debug!(logger = logger_name, enabled, "logger enabled state changed");
        Ok(node)
    }

    pub fn is_enabled(&self, node: NodeId) -> Result<bool, DispatchError> {
        lock(&self.state)
            .tree
            .node(node)
            .map(LoggerNode::is_enabled)
            .ok_or(DispatchError::UnknownNode(node))
    }

    /// 노드에 귀속된 메시지 히스토리 (추가 순서)
    pub fn history(&self, node: NodeId) -> Result<Vec<Arc<LogMessage>>, DispatchError> {
        lock(&self.state)
            .tree
            .node(node)
            .map(|n| n.history().to_vec())
            .ok_or(DispatchError::UnknownNode(node))
    }

    /// 현재 활성 상태와 임계값을 통과하는 모든 히스토리 (시퀀스 순)
    ///
    /// 임계값이나 활성 상태를 바꾼 뒤 화면을 다시 그릴 때 사용합니다.
    pub fn visible_messages(&self) -> Vec<Arc<LogMessage>> {
        let state = lock(&self.state);
        let mut visible: Vec<Arc<LogMessage>> = state
            .tree
            .iter()
            .filter(|(_, node)| node.is_enabled())
            .flat_map(|(_, node)| node.history().iter())
            .filter(|message| state.filter.admits(message.level()))
            .cloned()
            .collect();
        drop(state);
        visible.sort_by_key(|message| message.sequence());
        visible
    }

    /// 전체 히스토리 메시지 수
    pub fn message_count(&self) -> usize {
        lock(&self.state).tree.message_count()
    }

    /// 루트를 제외한 로거 수
    pub fn logger_count(&self) -> usize {
        lock(&self.state).tree.len() - 1
    }

    pub fn logger_names(&self) -> Vec<String> {
        lock(&self.state).tree.logger_names()
    }

    /// 트리를 읽기 전용으로 탐색합니다.
    ///
    /// 클로저가 실행되는 동안 드레인이 대기하므로 짧게 유지해야 합니다.
    pub fn with_tree<R>(&self, f: impl FnOnce(&LoggerTree) -> R) -> R {
        f(&lock(&self.state).tree)
    }

    // ─── 선택 강조 ──────────────────────────────────────────────────────

    /// 메시지 선택: 이전 로거 강조를 해제하고, 설정에 따라 소속 로거를 강조합니다.
    pub fn select_message(&self, message: &LogMessage) -> Option<NodeId> {
        let mut state = lock(&self.state);
        state.tree.clear_highlight(HighlightKind::Logger);
        if !self.config.highlight_logger_on_select {
            return None;
        }
        let node = state.tree.owner(message)?;
        state.tree.highlight(HighlightKind::Logger, node).ok()?;
        Some(node)
    }

    /// 로거 활성화: 설정에 따라 그 로거의 메시지를 강조합니다.
    pub fn activate_logger(&self, node: NodeId) -> Result<(), DispatchError> {
        let mut state = lock(&self.state);
        state.tree.clear_highlight(HighlightKind::Messages);
        if self.config.highlight_messages_on_activate {
            state.tree.highlight(HighlightKind::Messages, node)?;
        }
        Ok(())
    }

    pub fn highlighted(&self, kind: HighlightKind) -> Option<NodeId> {
        lock(&self.state).tree.highlighted(kind)
    }

    /// 메시지 강조 대상 로거의 히스토리
    pub fn highlighted_messages(&self) -> Vec<Arc<LogMessage>> {
        let state = lock(&self.state);
        state
            .tree
            .highlighted(HighlightKind::Messages)
            .and_then(|id| state.tree.node(id))
            .map(|node| node.history().to_vec())
            .unwrap_or_default()
    }

    pub fn clear_highlight(&self, kind: HighlightKind) {
        lock(&self.state).tree.clear_highlight(kind);
    }

    /// 검색어를 바꾸고 현재 보이는 메시지로 강조 집합을 다시 계산합니다.
    ///
    /// 메시지 강조는 검색 강조와 겹치지 않도록 해제됩니다.
    pub fn apply_search(&self, highlighter: &mut SearchHighlighter, query: &str) -> usize {
        self.clear_highlight(HighlightKind::Messages);
        highlighter.set_query(query);
        highlighter.refresh(&self.visible_messages())
    }

    /// 통계 스냅샷
    pub fn stats(&self) -> EngineStats {
        let c = &self.counters;
        EngineStats {
            accepted: c.accepted.load(Ordering::Relaxed),
            discarded_paused: c.discarded_paused.load(Ordering::Relaxed),
            discarded_detached: c.discarded_detached.load(Ordering::Relaxed),
            notified: c.notified.load(Ordering::Relaxed),
            filtered: c.filtered.load(Ordering::Relaxed),
            anomalies: c.anomalies.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// 드레인 도중 패닉이 나도 드레인 소유권을 반납합니다.
struct DrainGuard<'a> {
    ingress: &'a Mutex<Ingress>,
    released: bool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            lock(self.ingress).draining = false;
        }
    }
}

/// 보호 대상 상태는 패닉하지 않는 코드로만 변경되므로 poison은 무시합니다.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 디스패치 엔진 빌더
pub struct DispatchEngineBuilder {
    config: DispatchConfig,
    consumer: Option<Arc<dyn LogConsumer>>,
}

impl DispatchEngineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: DispatchConfig::default(),
            consumer: None,
        }
    }

    /// 엔진 설정을 지정합니다.
    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// 수락된 메시지를 전달받을 소비자를 등록합니다.
    ///
    /// 등록하지 않으면 알림은 버려지고 히스토리만 쌓입니다.
    pub fn consumer(mut self, consumer: impl LogConsumer + 'static) -> Self {
        self.consumer = Some(Arc::new(consumer));
        self
    }

    /// 이미 `Arc`로 공유 중인 소비자를 등록합니다.
    pub fn shared_consumer(mut self, consumer: Arc<dyn LogConsumer>) -> Self {
        self.consumer = Some(consumer);
        self
    }

    /// 설정을 검증하고 엔진을 생성합니다.
    ///
    /// 설정의 비활성 로거 목록은 `set_enabled` 호출로 재생됩니다.
    pub fn build(self) -> Result<Arc<DispatchEngine>, DispatchError> {
        self.config.validate()?;

        let consumer = self
            .consumer
            .unwrap_or_else(|| Arc::new(NoopConsumer) as Arc<dyn LogConsumer>);
        let disabled = self.config.disabled_loggers.clone();
        let engine = Arc::new(DispatchEngine::new(self.config, consumer));

        for name in &disabled {
            engine.set_logger_enabled(name, false)?;
        }

        tracing::info!(
            threshold = %engine.level_threshold(),
            disabled = disabled.len(),
            max_notify_batch = engine.config.max_notify_batch,
            "dispatch engine built"
        );
        Ok(engine)
    }
}

impl Default for DispatchEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
