//! logrelay 디스패치 엔진
//!
//! 여러 수신기 스레드가 동시에 제출하는 로그 메시지를 하나의 처리 경로로 직렬화하여
//! 로거 트리와 메시지 히스토리에 반영하고, 필터를 통과한 메시지를 소비자에게 전달합니다.
//!
//! # 모듈 구성
//!
//! - [`engine`]: 수집 직렬화, 드레인, 제어 연산 ([`DispatchEngine`])
//! - [`tree`]: 점으로 구분된 로거 이름 계층 ([`LoggerTree`], [`LoggerNode`])
//! - [`level`]: 레벨 임계값과 표시 색상 ([`LevelFilter`])
//! - [`highlight`]: 검색어 강조 ([`SearchHighlighter`])
//! - [`receiver`]: 수신기 싱크 핸들, 수신기 세트, 채널 수신기
//! - [`config`]: 엔진 설정 (core 설정에서 파생)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! Receivers --submit--> DispatchEngine --resolve--> LoggerTree (history 저장)
//!  (threads)              | ingress queue     \--> LevelFilter --> LogConsumer::on_messages
//!                         | single drainer
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod highlight;
pub mod level;
pub mod receiver;
pub mod tree;

// --- 주요 타입 re-export ---

// 엔진
pub use engine::{DispatchEngine, DispatchEngineBuilder, EngineStats};

// 설정
pub use config::{DispatchConfig, DispatchConfigBuilder};

// 에러
pub use error::DispatchError;

// 트리
pub use tree::{HighlightKind, LoggerNode, LoggerTree, NodeId};

// 필터 / 강조
pub use highlight::SearchHighlighter;
pub use level::LevelFilter;

// 수신기
pub use receiver::{ChannelReceiver, ReceiverHandle, ReceiverSet};
