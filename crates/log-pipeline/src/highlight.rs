//! 검색 강조
//!
//! 검색어와 메시지 본문의 대소문자 무시 부분 문자열 일치를 판정하고,
//! 현재 화면에 보이는 메시지 중 일치하는 것의 시퀀스 번호를 표시합니다.
//! 소비 컨텍스트에서만 호출되므로 동기화가 필요 없습니다.

use std::collections::BTreeSet;
use std::sync::Arc;

use logrelay_core::types::LogMessage;

/// 검색어 + 강조된 메시지 집합
#[derive(Debug, Default, Clone)]
pub struct SearchHighlighter {
    query: String,
    /// 소문자로 정규화한 검색어
    needle: String,
    marked: BTreeSet<u64>,
}

impl SearchHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 검색어를 바꾸고 이전 강조 집합을 무효화합니다.
    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
        self.needle = self.query.to_lowercase();
        self.marked.clear();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// 메시지 본문에 검색어가 포함되면 `true`. 빈 검색어는 아무것도 일치하지 않습니다.
    pub fn matches(&self, message: &LogMessage) -> bool {
        if self.needle.is_empty() {
            return false;
        }
        message.text().to_lowercase().contains(&self.needle)
    }

    /// 보이는 메시지 집합으로 강조 집합을 다시 계산하고 일치 건수를 반환합니다.
    pub fn refresh(&mut self, visible: &[Arc<LogMessage>]) -> usize {
        self.marked = visible
            .iter()
            .filter(|m| self.matches(m))
            .map(|m| m.sequence())
            .collect();
        self.marked.len()
    }

    pub fn is_marked(&self, message: &LogMessage) -> bool {
        self.marked.contains(&message.sequence())
    }

    /// 강조된 메시지의 시퀀스 번호 (오름차순)
    pub fn marked(&self) -> impl Iterator<Item = u64> + '_ {
        self.marked.iter().copied()
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.needle.clear();
        self.marked.clear();
    }
}
