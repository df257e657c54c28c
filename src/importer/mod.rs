//! # 卡组导入模块（importer）
//!
//! ## 设计思路
//!
//! 将“目录查询 → 卡图下载 → 磁盘缓存 → 尺寸派生”按职责拆分为多个子模块：
//!
//! - `variant`：尺寸变体封闭集合与来源定义
//! - `rate_limit`：网络请求限流（每秒上限）
//! - `catalog`：目录查询接缝 `CatalogSource` 与 HTTP 实现
//! - `loader`：卡图流式下载与签名校验
//! - `acquirer`：查询 + 下载 + 解码 + 落盘
//! - `pipeline`：解码与纯函数尺寸派生
//! - `handler`：整条导入流水线编排
//!
//! ## 调用链
//!
//! ```text
//! DeckImporter::import_file / import_str
//!    ↓
//! deck::parser（.ydk → DeckList）
//!    ↓ 按区域顺序逐卡
//! handler.rs resolve_card
//!    ├─ storage::CacheStore（命中即读）
//!    ├─ rate_limit ─▶ acquirer ─▶ catalog + loader（仅网络路径限流）
//!    └─ pipeline::ImageResizer（small → 查看变体）
//!    ↓
//! Deck（或 DeckError::Import）
//! ```

mod acquirer;
mod catalog;
mod handler;
mod loader;
mod pipeline;
mod rate_limit;
mod variant;

pub use acquirer::ImageAcquirer;
pub use catalog::{CardImageUrls, CardMetadata, CatalogSource, HttpCatalog, LookupMode};
pub use handler::{DeckImporter, ImportProgress};
pub use loader::DownloadError;
pub use pipeline::{decode_image, derivation_rule, CropBox, DerivationRule, ImageResizer};
pub use rate_limit::RateLimiter;
pub use variant::{SizeVariant, VariantImage, VariantOrigin};
