//! 卡图获取：元数据查询 → 下载 → 解码 → 落盘。
//!
//! 获取器不检查缓存，调用方需先 `exists` 判断；是否命中缓存决定了是否经过限流器。

use super::catalog::{CatalogSource, LookupMode};
use super::pipeline::decode_image;
use super::{SizeVariant, VariantImage};
use crate::deck::CardIdentifier;
use crate::error::DeckError;
use crate::storage::{CacheKey, CacheStore};

pub struct ImageAcquirer<'a, C> {
    catalog: &'a C,
    cache: &'a CacheStore,
}

impl<'a, C: CatalogSource> ImageAcquirer<'a, C> {
    pub fn new(catalog: &'a C, cache: &'a CacheStore) -> Self {
        Self { catalog, cache }
    }

    /// 获取 `small` 原图并写入缓存。
    pub async fn fetch_base_image(
        &self,
        identifier: &CardIdentifier,
    ) -> Result<VariantImage, DeckError> {
        self.fetch_variant(identifier, SizeVariant::Small).await
    }

    /// 获取任意直接下载型变体并写入缓存。
    pub async fn fetch_variant(
        &self,
        identifier: &CardIdentifier,
        variant: SizeVariant,
    ) -> Result<VariantImage, DeckError> {
        let failure = |reason: String| DeckError::AcquireFailure {
            identifier: identifier.to_string(),
            reason,
        };

        if !variant.is_fetched() {
            return Err(failure(format!("{} 为派生变体，不能直接下载", variant)));
        }

        let metadata = self.catalog.lookup(identifier.as_str(), LookupMode::Id).await?;
        let url = metadata
            .url_for(variant)
            .ok_or_else(|| failure(format!("目录未提供 {} 卡图地址", variant)))?;

        let bytes = self
            .catalog
            .download(url)
            .await
            .map_err(|e| failure(e.to_string()))?;

        let image = decode_image(&bytes)?;

        let key = CacheKey::new(identifier.clone(), variant);
        self.cache
            .write(&key, &bytes)
            .map_err(|e| failure(format!("写入缓存失败：{}", e)))?;

        log::info!(
            "⬇️ 已下载 {} [{}] {}x{} ({} bytes)",
            identifier,
            variant,
            image.width(),
            image.height(),
            bytes.len()
        );

        Ok(VariantImage::new(variant, image))
    }
}
