//! 卡组会话
//!
//! 持有当前显示的卡组与拖拽控制器。新卡组只有在导入完全成功后才会替换旧卡组；
//! 导入失败时旧卡组保持原样继续显示。

use crate::config::LayoutConfig;
use crate::deck::{Deck, DragController, DragState, PointerEvent};
use crate::error::DeckError;
use crate::storage::CacheStore;

#[derive(Debug, Default)]
pub struct DeckSession {
    deck: Option<Deck>,
    drag: DragController,
    layout: LayoutConfig,
}

impl DeckSession {
    pub fn new(layout: LayoutConfig) -> Self {
        Self {
            deck: None,
            drag: DragController::new(),
            layout,
        }
    }

    pub fn deck(&self) -> Option<&Deck> {
        self.deck.as_ref()
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    /// 提交一次导入结果。
    ///
    /// 成功：按布局摆放新卡组并整体替换旧卡组，拖拽状态复位。
    /// 失败：旧卡组不变，错误原样返回。
    pub fn commit_import(&mut self, result: Result<Deck, DeckError>) -> Result<&Deck, DeckError> {
        let mut deck = match result {
            Ok(deck) => deck,
            Err(err) => {
                log::warn!("⚠️ 导入失败，保留当前卡组：{}", err);
                return Err(err);
            }
        };

        deck.apply_layout(&self.layout);
        self.drag.reset();
        Ok(self.deck.insert(deck))
    }

    /// 转发指针事件给拖拽控制器；没有卡组时保持空闲。
    pub fn handle_pointer(&mut self, event: PointerEvent) -> DragState {
        match self.deck.as_mut() {
            Some(deck) => self.drag.handle(deck, event),
            None => DragState::Idle,
        }
    }

    /// 清空卡图缓存，不影响当前已加载的卡组。
    pub fn clear_cache(&self, cache: &CacheStore) -> Result<(), DeckError> {
        cache.clear_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::tests::card;
    use crate::deck::{CardRef, Zone};
    use crate::geometry::Point;

    fn deck_with(id: &str) -> Deck {
        let mut deck = Deck::new();
        deck.push(Zone::Main, card(id, Zone::Main));
        deck
    }

    #[test]
    fn failed_import_keeps_previous_deck() {
        let mut session = DeckSession::new(LayoutConfig::default());
        session.commit_import(Ok(deck_with("1"))).expect("first import commits");

        let result = session.commit_import(Err(DeckError::Cancelled));

        assert!(matches!(result, Err(DeckError::Cancelled)));
        let deck = session.deck().expect("previous deck retained");
        assert_eq!(deck.zone(Zone::Main)[0].identifier().as_str(), "1");
    }

    #[test]
    fn committed_deck_is_laid_out_and_draggable() {
        let mut session = DeckSession::new(LayoutConfig::default());
        session.commit_import(Ok(deck_with("2"))).expect("import commits");

        let state = session.handle_pointer(PointerEvent::Down(Point::new(41, 41)));
        assert_eq!(state, DragState::Dragging(CardRef { zone: Zone::Main, index: 0 }));

        session.commit_import(Ok(deck_with("3"))).expect("replacement commits");
        assert_eq!(session.drag_state(), DragState::Idle);
    }

    #[test]
    fn pointer_without_deck_is_idle() {
        let mut session = DeckSession::default();
        assert_eq!(session.handle_pointer(PointerEvent::Down(Point::new(0, 0))), DragState::Idle);
    }
}
