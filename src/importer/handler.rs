//! # 导入编排模块
//!
//! ## 设计思路
//!
//! `DeckImporter` 只负责流程编排，持有目录客户端、缓存、限流器与派生器。
//! 每张卡的处理链路固定为：
//! 1. 确定区域的查看变体（main → `viewer-normal`，extra/side → `viewer-small`）
//! 2. `small` 命中缓存则读取，否则下载（经过限流器）并写入缓存
//! 3. 查看变体命中缓存则读取，否则由 `small` 派生并写入缓存（无网络，不限流）
//! 4. 构造未摆放的 `Card` 追加到对应区域
//!
//! ## 实现思路
//!
//! - 任一卡失败立即中止，错误包装为 `DeckError::Import`（卡号 + 根因），不返回残缺卡组。
//! - 导入是独立的异步阶段：通过 `on_progress` 汇报进度，通过 `is_cancelled` 协作取消。
//! - 记录 `parse/resolve/total` 阶段耗时与网络/缓存命中计数，便于诊断。

use std::path::Path;
use std::time::Instant;

use super::acquirer::ImageAcquirer;
use super::catalog::{CardMetadata, CatalogSource, HttpCatalog, LookupMode};
use super::pipeline::ImageResizer;
use super::rate_limit::RateLimiter;
use super::{SizeVariant, VariantImage};
use crate::config::AppConfig;
use crate::deck::{self, Card, CardIdentifier, Deck, DeckList, Zone};
use crate::error::DeckError;
use crate::storage::{CacheKey, CacheStore};

/// 单张卡处理完成后的进度事件。
#[derive(Debug, Clone)]
pub struct ImportProgress {
    pub done: usize,
    pub total: usize,
    pub zone: Zone,
    pub identifier: CardIdentifier,
    /// 本张卡是否发生了网络下载。
    pub fetched_from_network: bool,
}

/// 卡组导入器。
pub struct DeckImporter<C> {
    catalog: C,
    cache: CacheStore,
    limiter: RateLimiter,
    resizer: ImageResizer,
}

impl DeckImporter<HttpCatalog> {
    /// 根据配置创建使用真实目录服务的导入器。
    pub fn from_config(config: &AppConfig) -> Result<Self, DeckError> {
        config.validate()?;
        let catalog = HttpCatalog::new(config)?;
        Ok(Self::new(catalog, CacheStore::new(config.cache_root()), config))
    }
}

impl<C: CatalogSource> DeckImporter<C> {
    pub fn new(catalog: C, cache: CacheStore, config: &AppConfig) -> Self {
        Self {
            catalog,
            cache,
            limiter: RateLimiter::new(config.max_requests_per_second),
            resizer: ImageResizer::new(config.resize_quality.filter()),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// 直接查询目录（经过限流器）。
    pub async fn lookup(&self, query: &str, mode: LookupMode) -> Result<CardMetadata, DeckError> {
        self.limiter.throttle(self.catalog.lookup(query, mode)).await
    }

    /// 读取卡组文件并导入。
    pub async fn import_file(&self, path: &Path) -> Result<Deck, DeckError> {
        let list = deck::parse_file(path)?;
        log::info!("📂 读取卡组文件 {}（{} 张）", path.display(), list.len());
        self.import_list(&list).await
    }

    /// 解析卡组文本并导入。
    pub async fn import_str(&self, content: &str) -> Result<Deck, DeckError> {
        let list = deck::parse_deck_list(content)?;
        self.import_list(&list).await
    }

    pub async fn import_list(&self, list: &DeckList) -> Result<Deck, DeckError> {
        self.import_with_hooks(list, |_| {}, || false).await
    }

    /// 导入主入口：带进度回调与取消检查。
    ///
    /// 取消在两张卡之间检查，已写入的缓存保留，卡组本身不会返回。
    pub async fn import_with_hooks<P, X>(
        &self,
        list: &DeckList,
        on_progress: P,
        is_cancelled: X,
    ) -> Result<Deck, DeckError>
    where
        P: Fn(&ImportProgress),
        X: Fn() -> bool,
    {
        let total_start = Instant::now();
        let total = list.len();
        let mut deck = Deck::new();
        let mut fetched = 0usize;

        for (done, (zone, identifier)) in list.iter().enumerate() {
            if is_cancelled() {
                log::warn!("⏹️ 导入已取消（{}/{}）", done, total);
                return Err(DeckError::Cancelled);
            }

            let (card, from_network) =
                self.resolve_card(identifier, zone)
                    .await
                    .map_err(|source| DeckError::Import {
                        identifier: identifier.clone(),
                        source: Box::new(source),
                    })?;

            if from_network {
                fetched += 1;
            }
            deck.push(zone, card);

            on_progress(&ImportProgress {
                done: done + 1,
                total,
                zone,
                identifier: identifier.clone(),
                fetched_from_network: from_network,
            });
        }

        log::info!(
            "✅ 卡组导入完成 - main={} extra={} side={} 下载={} 缓存命中={} total={}ms",
            deck.zone(Zone::Main).len(),
            deck.zone(Zone::Extra).len(),
            deck.zone(Zone::Side).len(),
            fetched,
            total - fetched,
            total_start.elapsed().as_millis()
        );

        Ok(deck)
    }

    /// 处理单张卡，返回卡片与“是否发生了网络下载”。
    async fn resolve_card(
        &self,
        identifier: &CardIdentifier,
        zone: Zone,
    ) -> Result<(Card, bool), DeckError> {
        let viewer = zone.viewer_variant();

        let small_key = CacheKey::new(identifier.clone(), SizeVariant::Small);
        let (small, from_network) = if self.cache.exists(&small_key) {
            let image = self.cache.read_image(&small_key)?;
            (VariantImage::new(SizeVariant::Small, image), false)
        } else {
            let acquirer = ImageAcquirer::new(&self.catalog, &self.cache);
            let image = self.limiter.throttle(acquirer.fetch_base_image(identifier)).await?;
            (image, true)
        };

        let viewer_key = CacheKey::new(identifier.clone(), viewer);
        let image = if self.cache.exists(&viewer_key) {
            self.cache.read_image(&viewer_key)?
        } else {
            let derived = self.resizer.derive(&small, viewer)?;
            self.cache
                .write_image(&viewer_key, &derived.image)
                .map_err(|e| match e {
                    DeckError::Io { .. } => DeckError::AcquireFailure {
                        identifier: identifier.to_string(),
                        reason: format!("写入缓存失败：{}", e),
                    },
                    other => other,
                })?;
            derived.image
        };

        log::debug!(
            "🃏 {} -> {} [{}]{}",
            identifier,
            zone.name(),
            viewer,
            if from_network { " (network)" } else { "" }
        );

        Ok((Card::new(identifier.clone(), viewer, image), from_network))
    }
}
