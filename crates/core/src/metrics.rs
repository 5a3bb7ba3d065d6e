//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 디스패치 엔진과 수신기 세트는 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::gauge!()`, `metrics::histogram!()` 매크로를 호출합니다.
//! 레코더 설치 여부는 호스트 프로세스가 결정합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logrelay_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logrelay_core::metrics::DISPATCH_MESSAGES_ACCEPTED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 폐기 사유 레이블 키 (paused, detached)
pub const LABEL_REASON: &str = "reason";

/// 레벨 레이블 키 (trace ... fatal)
pub const LABEL_LEVEL: &str = "level";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Dispatch 메트릭 ────────────────────────────────────────────────

/// Dispatch: 수락되어 시퀀스 번호를 받은 메시지 수 (counter)
pub const DISPATCH_MESSAGES_ACCEPTED_TOTAL: &str = "logrelay_dispatch_messages_accepted_total";

/// Dispatch: 일시정지/분리 상태에서 폐기된 메시지 수 (counter, label: reason)
pub const DISPATCH_MESSAGES_DISCARDED_TOTAL: &str = "logrelay_dispatch_messages_discarded_total";

/// Dispatch: 소비자에게 전달된 메시지 수 (counter)
pub const DISPATCH_MESSAGES_NOTIFIED_TOTAL: &str = "logrelay_dispatch_messages_notified_total";

/// Dispatch: 히스토리에만 저장되고 전달되지 않은 메시지 수 (counter)
pub const DISPATCH_MESSAGES_FILTERED_TOTAL: &str = "logrelay_dispatch_messages_filtered_total";

/// Dispatch: 잘못된 로거 이름 등 수집 이상 건수 (counter)
pub const DISPATCH_INGESTION_ANOMALIES_TOTAL: &str = "logrelay_dispatch_ingestion_anomalies_total";

/// Dispatch: 드레인 1회 소요 시간 (histogram, 초)
pub const DISPATCH_DRAIN_DURATION_SECONDS: &str = "logrelay_dispatch_drain_duration_seconds";

/// Dispatch: 트리에 존재하는 로거 노드 수 (gauge)
pub const DISPATCH_LOGGER_NODES: &str = "logrelay_dispatch_logger_nodes";

// ─── Receiver 메트릭 ────────────────────────────────────────────────

/// Receiver: 엔진에 연결된 수신기 수 (gauge)
pub const RECEIVERS_ATTACHED: &str = "logrelay_receivers_attached";

/// Receiver: 생명주기 전환 수 (counter, label: result)
pub const RECEIVER_LIFECYCLE_TOTAL: &str = "logrelay_receiver_lifecycle_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번 호출합니다. 레코더가 없으면 아무 일도 하지 않습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        DISPATCH_MESSAGES_ACCEPTED_TOTAL,
        "Messages accepted into the serialized dispatch path"
    );
    describe_counter!(
        DISPATCH_MESSAGES_DISCARDED_TOTAL,
        "Messages discarded because the engine was paused or the receiver detached"
    );
    describe_counter!(
        DISPATCH_MESSAGES_NOTIFIED_TOTAL,
        "Messages delivered to the consumer"
    );
    describe_counter!(
        DISPATCH_MESSAGES_FILTERED_TOTAL,
        "Messages stored in history but filtered out by logger state or level threshold"
    );
    describe_counter!(
        DISPATCH_INGESTION_ANOMALIES_TOTAL,
        "Messages with malformed logger names routed to the root logger"
    );
    describe_histogram!(
        DISPATCH_DRAIN_DURATION_SECONDS,
        "Time spent applying one drained chunk to the logger tree"
    );
    describe_gauge!(DISPATCH_LOGGER_NODES, "Logger nodes currently in the tree");
    describe_gauge!(RECEIVERS_ATTACHED, "Receivers currently attached to the engine");
    describe_counter!(
        RECEIVER_LIFECYCLE_TOTAL,
        "Receiver initialize/terminate transitions by result"
    );
}
