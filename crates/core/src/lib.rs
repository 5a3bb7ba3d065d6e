//! logrelay 코어 — 공통 타입, trait, 에러, 설정, 메트릭
//!
//! 여러 수신기가 동시에 생산하는 로그 이벤트를 하나의 소비 컨텍스트로 모으는
//! 디스패치 엔진(`logrelay-pipeline`)과, 그 바깥의 협력자(수신기, 화면 계층)가
//! 공유하는 계약을 정의합니다.
//!
//! # 모듈 구성
//!
//! - [`types`]: [`LogMessage`], [`LogLevel`], [`LevelColor`], [`ReceiverId`]
//! - [`pipeline`]: [`Receiver`], [`LogSink`], [`LogConsumer`] 계약
//! - [`config`]: `logrelay.toml` 설정
//! - [`error`]: 도메인 에러 타입
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, ReceiverError, RelayError};

// 설정
pub use config::RelayConfig;

// 파이프라인 trait
pub use pipeline::{LogConsumer, LogSink, NoopConsumer, Receiver, ReceiverState};

// 도메인 타입
pub use types::{LevelColor, LogLevel, LogMessage, ReceiverId};
