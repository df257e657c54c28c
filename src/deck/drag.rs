//! 拖拽交互状态机
//!
//! 两个状态：`Idle` 与 `Dragging(card)`。
//!
//! | 状态 | 事件 | 结果 |
//! |------|------|------|
//! | `Idle` | `PointerDown` 命中卡片 | `Dragging(card)` |
//! | `Dragging` | `PointerMove(dx, dy)` | 平移 `current`，保持拖拽 |
//! | `Dragging` | `PointerUp` | `current` 复位为 `original`，回到 `Idle` |
//! | 其他组合 | — | 无操作 |
//!
//! 同一时刻最多拖拽一张卡；`original` 永不被修改。

use super::{Deck, Zone};
use crate::geometry::Point;

/// 卡片在卡组中的位置（区域 + 下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardRef {
    pub zone: Zone,
    pub index: usize,
}

/// 指针输入事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down(Point),
    Move { dx: i32, dy: i32 },
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(CardRef),
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn dragging(&self) -> Option<CardRef> {
        match self.state {
            DragState::Dragging(card_ref) => Some(card_ref),
            DragState::Idle => None,
        }
    }

    /// 放弃当前拖拽（例如卡组被整体替换时），不触碰任何卡片。
    pub fn reset(&mut self) {
        self.state = DragState::Idle;
    }

    /// 处理一个指针事件，返回处理后的状态。
    pub fn handle(&mut self, deck: &mut Deck, event: PointerEvent) -> DragState {
        self.state = match (self.state, event) {
            (DragState::Idle, PointerEvent::Down(point)) => match deck.hit_test(point) {
                Some(card_ref) => {
                    log::debug!("🖱️ 开始拖拽 {:?}", card_ref);
                    DragState::Dragging(card_ref)
                }
                None => DragState::Idle,
            },
            (DragState::Dragging(card_ref), PointerEvent::Move { dx, dy }) => {
                match deck.card_mut(card_ref) {
                    Some(card) => {
                        card.translate(dx, dy);
                        DragState::Dragging(card_ref)
                    }
                    None => DragState::Idle,
                }
            }
            (DragState::Dragging(card_ref), PointerEvent::Up) => {
                if let Some(card) = deck.card_mut(card_ref) {
                    card.reset_position();
                }
                DragState::Idle
            }
            (DragState::Idle, PointerEvent::Move { .. } | PointerEvent::Up) => DragState::Idle,
            (DragState::Dragging(card_ref), PointerEvent::Down(_)) => DragState::Dragging(card_ref),
        };

        self.state
    }
}
