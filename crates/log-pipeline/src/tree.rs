//! 로거 트리 — 점(`.`)으로 구분된 로거 이름 계층
//!
//! 노드는 인덱스 기반 아레나(`Vec<LoggerNode>`)에 저장되고 [`NodeId`]로
//! 참조합니다. 부모 참조는 소유가 아닌 조회용 ID이므로 순환 소유가 없습니다.
//!
//! # 불변식
//! - 같은 이름의 `resolve`는 항상 같은 [`NodeId`]를 반환합니다.
//! - `set_enabled`는 하위 트리 전체를 같은 값으로 덮어씁니다.
//! - `reset` 이후에는 이전 세대의 ID가 어떤 노드도 가리키지 않습니다.
//! - 강조 종류([`HighlightKind`])마다 강조된 노드는 최대 하나입니다.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use logrelay_core::types::LogMessage;

use crate::error::DispatchError;

/// 로거 이름 구분자
pub const NAMESPACE_DELIMITER: char = '.';

/// 트리 노드 식별자
///
/// 아레나 인덱스와 트리 세대로 구성됩니다. `reset`마다 세대가 바뀌므로
/// 초기화 이전에 발급된 ID는 새 노드와 혼동되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u64,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.index, self.generation)
    }
}

/// 선택 강조 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    /// 선택된 메시지가 속한 로거
    Logger,
    /// 활성화된 로거의 메시지
    Messages,
}

/// 로거 노드
///
/// 이름 한 세그먼트에 해당하며, 자신에게 귀속된 메시지 히스토리를 소유합니다.
#[derive(Debug)]
pub struct LoggerNode {
    name: String,
    full_path: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    child_index: HashMap<String, NodeId>,
    enabled: bool,
    logger_highlight: bool,
    messages_highlight: bool,
    history: Vec<Arc<LogMessage>>,
}

impl LoggerNode {
    fn new(name: String, full_path: String, parent: Option<NodeId>, enabled: bool) -> Self {
        Self {
            name,
            full_path,
            parent,
            children: Vec::new(),
            child_index: HashMap::new(),
            enabled,
            logger_highlight: false,
            messages_highlight: false,
            history: Vec::new(),
        }
    }

    /// 마지막 세그먼트 이름 (루트는 표시 이름)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 전체 경로. 루트는 빈 문자열입니다.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// 생성 순서대로 정렬된 자식 노드
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_highlighted(&self, kind: HighlightKind) -> bool {
        match kind {
            HighlightKind::Logger => self.logger_highlight,
            HighlightKind::Messages => self.messages_highlight,
        }
    }

    /// 추가된 순서의 메시지 히스토리
    pub fn history(&self) -> &[Arc<LogMessage>] {
        &self.history
    }

    fn highlight_mut(&mut self, kind: HighlightKind) -> &mut bool {
        match kind {
            HighlightKind::Logger => &mut self.logger_highlight,
            HighlightKind::Messages => &mut self.messages_highlight,
        }
    }
}

/// 로거 트리
#[derive(Debug)]
pub struct LoggerTree {
    nodes: Vec<LoggerNode>,
    generation: u64,
    root_name: String,
    highlighted_logger: Option<NodeId>,
    highlighted_messages: Option<NodeId>,
}

impl LoggerTree {
    /// 빈 루트만 가진 트리를 생성합니다.
    pub fn new(root_name: impl Into<String>) -> Self {
        let root_name = root_name.into();
        Self {
            nodes: vec![LoggerNode::new(root_name.clone(), String::new(), None, true)],
            generation: 0,
            root_name,
            highlighted_logger: None,
            highlighted_messages: None,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId {
            index: 0,
            generation: self.generation,
        }
    }

    /// 루트를 포함한 노드 수
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// 루트만 남아 있으면 `true`
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn node(&self, id: NodeId) -> Option<&LoggerNode> {
        self.slot(id).ok().map(|index| &self.nodes[index])
    }

    /// 생성 순서대로 모든 노드를 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &LoggerNode)> {
        let generation = self.generation;
        self.nodes
            .iter()
            .enumerate()
            .map(move |(index, node)| (NodeId { index, generation }, node))
    }

    /// 이름을 노드로 해석합니다. 없는 중간 노드는 생성합니다.
    ///
    /// 잘못된 이름은 루트로 해석됩니다.
    pub fn resolve(&mut self, dotted: &str) -> NodeId {
        self.resolve_or_root(dotted).0
    }

    /// `resolve`와 같지만 잘못된 이름으로 루트에 귀속되었는지도 함께 반환합니다.
    pub(crate) fn resolve_or_root(&mut self, dotted: &str) -> (NodeId, bool) {
        let Some(segments) = split_name(dotted) else {
            return (self.root(), true);
        };

        let mut current = 0;
        for segment in segments {
            let next = match self.nodes[current].child_index.get(segment).copied() {
                Some(child) => child.index,
                None => self.create_child(current, segment),
            };
            current = next;
        }
        (self.id_at(current), false)
    }

    /// 노드를 생성하지 않고 이름을 조회합니다.
    pub fn find(&self, dotted: &str) -> Option<NodeId> {
        let segments = split_name(dotted)?;
        let mut current = 0;
        for segment in segments {
            current = self.nodes[current].child_index.get(segment)?.index;
        }
        Some(self.id_at(current))
    }

    /// 메시지가 귀속된 노드를 조회합니다.
    ///
    /// 잘못된 이름의 메시지는 루트를, 트리 초기화로 사라진 로거는 `None`을 반환합니다.
    pub fn owner(&self, message: &LogMessage) -> Option<NodeId> {
        if is_valid_logger_name(message.logger_name()) {
            self.find(message.logger_name())
        } else {
            Some(self.root())
        }
    }

    /// 노드와 모든 하위 노드의 활성 상태를 `value`로 덮어씁니다.
    pub fn set_enabled(&mut self, id: NodeId, value: bool) -> Result<(), DispatchError> {
        let start = self.slot(id)?;
        let mut stack = vec![start];
        while let Some(index) = stack.pop() {
            let node = &mut self.nodes[index];
            node.enabled = value;
            stack.extend(node.children.iter().map(|child| child.index));
        }
        Ok(())
    }

    /// 노드의 하위 노드를 전위 순회 순서로 반환합니다 (자신 포함).
    pub fn subtree(&self, id: NodeId) -> Result<Vec<NodeId>, DispatchError> {
        let start = self.slot(id)?;
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(index) = stack.pop() {
            out.push(self.id_at(index));
            stack.extend(self.nodes[index].children.iter().rev().map(|c| c.index));
        }
        Ok(out)
    }

    /// 노드 히스토리에 메시지를 추가합니다.
    pub(crate) fn append(&mut self, id: NodeId, message: Arc<LogMessage>) {
        if let Ok(index) = self.slot(id) {
            self.nodes[index].history.push(message);
        }
    }

    /// 모든 노드의 히스토리를 비웁니다. 구조와 활성 상태는 유지합니다.
    pub fn clear_messages(&mut self) {
        for node in &mut self.nodes {
            node.history.clear();
        }
        self.clear_highlight(HighlightKind::Messages);
    }

    /// 루트를 제외한 모든 노드를 버리고 새 루트로 초기화합니다.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.nodes = vec![LoggerNode::new(
            self.root_name.clone(),
            String::new(),
            None,
            true,
        )];
        self.highlighted_logger = None;
        self.highlighted_messages = None;
    }

    /// 전체 메시지 수
    pub fn message_count(&self) -> usize {
        self.nodes.iter().map(|n| n.history.len()).sum()
    }

    /// 루트를 제외한 모든 로거의 전체 경로 (생성 순서)
    pub fn logger_names(&self) -> Vec<String> {
        self.nodes
            .iter()
            .skip(1)
            .map(|n| n.full_path.clone())
            .collect()
    }

    /// 노드를 강조합니다. 같은 종류의 이전 강조는 해제됩니다.
    pub fn highlight(&mut self, kind: HighlightKind, id: NodeId) -> Result<(), DispatchError> {
        let index = self.slot(id)?;
        self.clear_highlight(kind);
        *self.nodes[index].highlight_mut(kind) = true;
        *self.highlight_slot(kind) = Some(id);
        Ok(())
    }

    /// 해당 종류의 강조를 해제합니다.
    pub fn clear_highlight(&mut self, kind: HighlightKind) {
        let Some(previous) = self.highlight_slot(kind).take() else {
            return;
        };
        if let Ok(index) = self.slot(previous) {
            *self.nodes[index].highlight_mut(kind) = false;
        }
    }

    /// 현재 강조된 노드
    pub fn highlighted(&self, kind: HighlightKind) -> Option<NodeId> {
        match kind {
            HighlightKind::Logger => self.highlighted_logger,
            HighlightKind::Messages => self.highlighted_messages,
        }
    }

    fn highlight_slot(&mut self, kind: HighlightKind) -> &mut Option<NodeId> {
        match kind {
            HighlightKind::Logger => &mut self.highlighted_logger,
            HighlightKind::Messages => &mut self.highlighted_messages,
        }
    }

    fn create_child(&mut self, parent: usize, segment: &str) -> usize {
        let parent_node = &self.nodes[parent];
        let full_path = if parent_node.is_root() {
            segment.to_owned()
        } else {
            format!("{}{NAMESPACE_DELIMITER}{segment}", parent_node.full_path)
        };
        // 비활성화된 하위 트리에 새로 생긴 노드도 비활성 상태로 시작합니다.
        let enabled = parent_node.enabled;
        let parent_id = self.id_at(parent);

        let index = self.nodes.len();
        let id = self.id_at(index);
        self.nodes.push(LoggerNode::new(
            segment.to_owned(),
            full_path,
            Some(parent_id),
            enabled,
        ));
        let parent_node = &mut self.nodes[parent];
        parent_node.children.push(id);
        parent_node.child_index.insert(segment.to_owned(), id);
        index
    }

    fn id_at(&self, index: usize) -> NodeId {
        NodeId {
            index,
            generation: self.generation,
        }
    }

    fn slot(&self, id: NodeId) -> Result<usize, DispatchError> {
        if id.generation == self.generation && id.index < self.nodes.len() {
            Ok(id.index)
        } else {
            Err(DispatchError::UnknownNode(id))
        }
    }
}

/// 루트로 대체되지 않고 트리 노드로 해석되는 이름인지 확인합니다.
pub fn is_valid_logger_name(dotted: &str) -> bool {
    split_name(dotted).is_some()
}

/// 이름을 세그먼트로 나눕니다. 잘못된 이름이면 `None`을 반환합니다.
///
/// 잘못된 이름: 공백뿐인 이름, 빈 세그먼트(`a..b`), 제어 문자가 포함된 세그먼트
fn split_name(dotted: &str) -> Option<Vec<&str>> {
    if dotted.trim().is_empty() {
        return None;
    }
    let segments: Vec<&str> = dotted.split(NAMESPACE_DELIMITER).collect();
    let malformed = segments
        .iter()
        .any(|s| s.trim().is_empty() || s.chars().any(char::is_control));
    if malformed { None } else { Some(segments) }
}
