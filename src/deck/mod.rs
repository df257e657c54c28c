//! # 卡组模型（deck）
//!
//! ## 设计思路
//!
//! - `DeckList`：解析结果，只有三段有序卡号，不含图片。
//! - `Deck`：导入完成后的卡组，三个区域恒定存在（可以为空），区域内顺序即导入顺序，
//!   导出时按此顺序写回。
//! - `Card`：卡号 + 所在区域查看变体的已解码图片 + 可选的摆放信息。
//!
//! 摆放信息在布局时一次性写入：`original` 此后不再改变，
//! `current` 只允许拖拽控制器（`drag`）修改。
//!
//! ```text
//! .ydk 文本 ──parser──▶ DeckList ──importer──▶ Deck ──apply_layout──▶ 已摆放的 Card
//!                                                  ▲
//!                                  drag::DragController（仅改 current）
//! ```

pub mod drag;
pub mod parser;

use std::fmt;
use std::fs;
use std::path::Path;

use image::DynamicImage;

use crate::config::LayoutConfig;
use crate::error::DeckError;
use crate::geometry::{Point, Rect};
use crate::importer::SizeVariant;

pub use drag::{CardRef, DragController, DragState, PointerEvent};
pub use parser::{parse_deck_list, parse_file};

/// 卡号：非空、仅由 ASCII 数字组成的字符串。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardIdentifier(String);

impl CardIdentifier {
    /// 校验并构造卡号；包含非数字字符或为空时返回 `None`。
    pub fn parse(raw: &str) -> Option<Self> {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 卡组区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Main,
    Extra,
    Side,
}

impl Zone {
    /// 扫描 / 导出顺序。
    pub const ALL: [Zone; 3] = [Zone::Main, Zone::Extra, Zone::Side];

    pub fn name(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Extra => "extra",
            Self::Side => "side",
        }
    }

    /// 卡组文件中切换到该区域的指令。
    pub fn directive(self) -> &'static str {
        match self {
            Self::Main => "#main",
            Self::Extra => "#extra",
            Self::Side => "!side",
        }
    }

    /// 该区域界面上实际显示的尺寸变体。
    pub fn viewer_variant(self) -> SizeVariant {
        match self {
            Self::Main => SizeVariant::ViewerNormal,
            Self::Extra | Self::Side => SizeVariant::ViewerSmall,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Main => 0,
            Self::Extra => 1,
            Self::Side => 2,
        }
    }
}

/// 网格步长：卡片边长加间距，超出坐标范围时饱和。
fn grid_step(side: u32, padding: u32) -> i32 {
    i32::try_from(side.saturating_add(padding)).unwrap_or(i32::MAX)
}

/// 解析后的卡组清单（只有卡号）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckList {
    zones: [Vec<CardIdentifier>; 3],
}

impl DeckList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zone(&self, zone: Zone) -> &[CardIdentifier] {
        &self.zones[zone.index()]
    }

    pub fn push(&mut self, zone: Zone, identifier: CardIdentifier) {
        self.zones[zone.index()].push(identifier);
    }

    pub fn len(&self) -> usize {
        self.zones.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按区域顺序、区域内顺序遍历全部卡号。
    pub fn iter(&self) -> impl Iterator<Item = (Zone, &CardIdentifier)> {
        Zone::ALL
            .into_iter()
            .flat_map(move |zone| self.zone(zone).iter().map(move |id| (zone, id)))
    }

    /// 渲染为卡组文本，可被 `parse_deck_list` 原样解析回来。
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for zone in Zone::ALL {
            out.push_str(zone.directive());
            out.push('\n');
            for id in self.zone(zone) {
                out.push_str(id.as_str());
                out.push('\n');
            }
        }
        out
    }
}

/// 卡片的屏幕摆放信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub current: Rect,
    pub original: Rect,
}

/// 卡组中的一张卡
#[derive(Debug, Clone)]
pub struct Card {
    identifier: CardIdentifier,
    variant: SizeVariant,
    image: DynamicImage,
    placement: Option<Placement>,
}

impl Card {
    /// 新建未摆放的卡片。
    pub fn new(identifier: CardIdentifier, variant: SizeVariant, image: DynamicImage) -> Self {
        Self {
            identifier,
            variant,
            image,
            placement: None,
        }
    }

    pub fn identifier(&self) -> &CardIdentifier {
        &self.identifier
    }

    pub fn variant(&self) -> SizeVariant {
        self.variant
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    pub fn current_rect(&self) -> Option<Rect> {
        self.placement.map(|p| p.current)
    }

    pub fn original_rect(&self) -> Option<Rect> {
        self.placement.map(|p| p.original)
    }

    /// 首次摆放：同时写入 `current` 与 `original`。
    ///
    /// 已摆放过的卡片保持不变并返回 `false`。
    pub fn place(&mut self, rect: Rect) -> bool {
        if self.placement.is_some() {
            return false;
        }
        self.placement = Some(Placement {
            current: rect,
            original: rect,
        });
        true
    }

    pub(in crate::deck) fn translate(&mut self, dx: i32, dy: i32) {
        if let Some(placement) = self.placement.as_mut() {
            placement.current = placement.current.translated(dx, dy);
        }
    }

    pub(in crate::deck) fn reset_position(&mut self) {
        if let Some(placement) = self.placement.as_mut() {
            placement.current = placement.original;
        }
    }
}

/// 卡组：主卡组 / 额外卡组 / 副卡组。
#[derive(Debug, Clone, Default)]
pub struct Deck {
    zones: [Vec<Card>; 3],
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zone(&self, zone: Zone) -> &[Card] {
        &self.zones[zone.index()]
    }

    pub(crate) fn push(&mut self, zone: Zone, card: Card) {
        self.zones[zone.index()].push(card);
    }

    pub fn card(&self, card_ref: CardRef) -> Option<&Card> {
        self.zones[card_ref.zone.index()].get(card_ref.index)
    }

    pub(in crate::deck) fn card_mut(&mut self, card_ref: CardRef) -> Option<&mut Card> {
        self.zones[card_ref.zone.index()].get_mut(card_ref.index)
    }

    pub fn len(&self) -> usize {
        self.zones.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 命中测试：按“区域顺序 → 区域内下标”扫描，返回第一张 `current` 包含该点的卡。
    pub fn hit_test(&self, point: Point) -> Option<CardRef> {
        Zone::ALL.into_iter().find_map(|zone| {
            self.zone(zone)
                .iter()
                .position(|card| card.current_rect().is_some_and(|rect| rect.contains(point)))
                .map(|index| CardRef { zone, index })
        })
    }

    /// 按布局配置摆放所有尚未摆放的卡片（行优先网格）。
    pub fn apply_layout(&mut self, layout: &LayoutConfig) {
        for zone in Zone::ALL {
            let zone_layout = layout.zone(zone);
            let (width, height) = zone.viewer_variant().dimensions();
            let per_row = zone_layout.cards_per_row.max(1) as usize;
            let step_x = grid_step(width, layout.padding);
            let step_y = grid_step(height, layout.padding);

            for (index, card) in self.zones[zone.index()].iter_mut().enumerate() {
                let col = i32::try_from(index % per_row).unwrap_or(i32::MAX);
                let row = i32::try_from(index / per_row).unwrap_or(i32::MAX);
                let rect = Rect::new(
                    zone_layout.origin.x.saturating_add(col.saturating_mul(step_x)),
                    zone_layout.origin.y.saturating_add(row.saturating_mul(step_y)),
                    width,
                    height,
                );
                card.place(rect);
            }
        }
    }

    /// 导出为卡号清单（保持区域与顺序）。
    pub fn deck_list(&self) -> DeckList {
        let mut list = DeckList::new();
        for zone in Zone::ALL {
            for card in self.zone(zone) {
                list.push(zone, card.identifier.clone());
            }
        }
        list
    }

    pub fn to_deck_list(&self) -> String {
        self.deck_list().to_text()
    }

    pub fn export_to_file(&self, path: &Path) -> Result<(), DeckError> {
        fs::write(path, self.to_deck_list()).map_err(|e| DeckError::io(path, e))?;
        log::info!("📤 已导出卡组 {}（{} 张）", path.display(), self.len());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn card(id: &str, zone: Zone) -> Card {
        let (w, h) = zone.viewer_variant().dimensions();
        Card::new(
            CardIdentifier::parse(id).expect("valid id"),
            zone.viewer_variant(),
            DynamicImage::new_rgba8(w, h),
        )
    }

    #[test]
    fn identifier_accepts_only_digits() {
        assert!(CardIdentifier::parse("89631139").is_some());
        assert!(CardIdentifier::parse("").is_none());
        assert!(CardIdentifier::parse("12a").is_none());
        assert!(CardIdentifier::parse("１２").is_none());
    }

    #[test]
    fn place_sets_both_rects_once() {
        let mut c = card("1", Zone::Main);
        assert!(c.current_rect().is_none());

        assert!(c.place(Rect::new(1, 2, 3, 4)));
        assert!(!c.place(Rect::new(9, 9, 9, 9)));

        assert_eq!(c.current_rect(), Some(Rect::new(1, 2, 3, 4)));
        assert_eq!(c.original_rect(), Some(Rect::new(1, 2, 3, 4)));
    }

    #[test]
    fn layout_places_cards_on_grid_per_zone() {
        let mut deck = Deck::new();
        for i in 0..12 {
            deck.push(Zone::Main, card(&format!("{}", 100 + i), Zone::Main));
        }
        deck.push(Zone::Side, card("5", Zone::Side));

        let layout = LayoutConfig::default();
        deck.apply_layout(&layout);

        let first = deck.zone(Zone::Main)[0].original_rect().expect("placed");
        let second = deck.zone(Zone::Main)[1].original_rect().expect("placed");
        let wrapped = deck.zone(Zone::Main)[10].original_rect().expect("placed");
        let side = deck.zone(Zone::Side)[0].original_rect().expect("placed");

        assert_eq!(first, Rect::new(40, 40, 84, 123));
        assert_eq!(second.x, 40 + 84 + 6);
        assert_eq!((wrapped.x, wrapped.y), (40, 40 + 123 + 6));
        assert_eq!(side, Rect::new(40, 720, 56, 82));
    }

    #[test]
    fn layout_with_extreme_padding_saturates_instead_of_overflowing() {
        let mut deck = Deck::new();
        deck.push(Zone::Main, card("1", Zone::Main));
        deck.push(Zone::Main, card("2", Zone::Main));

        let layout = LayoutConfig {
            padding: u32::MAX - 95,
            ..LayoutConfig::default()
        };
        deck.apply_layout(&layout);

        let first = deck.zone(Zone::Main)[0].original_rect().expect("placed");
        let second = deck.zone(Zone::Main)[1].original_rect().expect("placed");
        assert_eq!(first, Rect::new(40, 40, 84, 123));
        assert_eq!(second.x, i32::MAX);
    }

    #[test]
    fn hit_test_prefers_zone_then_index_order() {
        let mut deck = Deck::new();
        deck.push(Zone::Extra, card("2", Zone::Extra));
        deck.push(Zone::Main, card("1", Zone::Main));
        deck.zones[Zone::Main.index()][0].place(Rect::new(0, 0, 50, 50));
        deck.zones[Zone::Extra.index()][0].place(Rect::new(10, 10, 50, 50));

        assert_eq!(
            deck.hit_test(Point::new(20, 20)),
            Some(CardRef { zone: Zone::Main, index: 0 })
        );
        assert_eq!(
            deck.hit_test(Point::new(55, 55)),
            Some(CardRef { zone: Zone::Extra, index: 0 })
        );
        assert_eq!(deck.hit_test(Point::new(500, 500)), None);
    }

    #[test]
    fn export_round_trips_through_parser() {
        let mut deck = Deck::new();
        deck.push(Zone::Main, card("4001", Zone::Main));
        deck.push(Zone::Side, card("4002", Zone::Side));
        deck.push(Zone::Side, card("4002", Zone::Side));

        let text = deck.to_deck_list();
        assert_eq!(text, "#main\n4001\n#extra\n!side\n4002\n4002\n");

        let reparsed = parse_deck_list(&text).expect("export must re-parse");
        assert_eq!(reparsed, deck.deck_list());
    }
}
