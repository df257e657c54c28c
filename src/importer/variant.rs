//! # 尺寸变体
//!
//! 卡图的全部目标尺寸是一个封闭集合。每个变体有固定像素尺寸、
//! 固定缓存扩展名，以及来源：要么直接从卡片目录下载，要么由另一个变体派生。

use std::fmt;

use image::DynamicImage;

/// 卡图尺寸变体。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizeVariant {
    Small,
    Normal,
    Cropped,
    ViewerNormal,
    ViewerSmall,
}

/// 变体来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantOrigin {
    /// 直接从目录服务下载（对应 `card_images[0]` 中的某个 URL 字段）。
    Fetched,
    /// 由另一个变体缩放 / 裁剪得到，不产生网络请求。
    Derived(SizeVariant),
}

impl SizeVariant {
    pub const ALL: [SizeVariant; 5] = [
        SizeVariant::Small,
        SizeVariant::Normal,
        SizeVariant::Cropped,
        SizeVariant::ViewerNormal,
        SizeVariant::ViewerSmall,
    ];

    /// 稳定名称，同时用作缓存子目录名。
    pub fn name(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Normal => "normal",
            Self::Cropped => "cropped",
            Self::ViewerNormal => "viewer-normal",
            Self::ViewerSmall => "viewer-small",
        }
    }

    /// 目标像素尺寸 `(width, height)`。
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Small => (168, 246),
            Self::Normal => (421, 614),
            Self::Cropped => (624, 624),
            Self::ViewerNormal => (84, 123),
            Self::ViewerSmall => (56, 82),
        }
    }

    pub fn origin(self) -> VariantOrigin {
        match self {
            Self::Small | Self::Normal | Self::Cropped => VariantOrigin::Fetched,
            Self::ViewerNormal | Self::ViewerSmall => VariantOrigin::Derived(Self::Small),
        }
    }

    pub fn is_fetched(self) -> bool {
        self.origin() == VariantOrigin::Fetched
    }

    /// 缓存文件扩展名：下载的原图按目录服务的 JPEG 原样保存，派生图统一编码为 PNG。
    pub fn extension(self) -> &'static str {
        if self.is_fetched() { "jpg" } else { "png" }
    }
}

impl fmt::Display for SizeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 已解码图像及其所属变体。
///
/// 派生规则按 `(来源变体, 目标变体)` 查表，因此图像必须带着变体标签流转。
#[derive(Debug, Clone)]
pub struct VariantImage {
    pub variant: SizeVariant,
    pub image: DynamicImage,
}

impl VariantImage {
    pub fn new(variant: SizeVariant, image: DynamicImage) -> Self {
        Self { variant, image }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_names_are_distinct_cache_directories() {
        let mut names: Vec<&str> = SizeVariant::ALL.iter().map(|v| v.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SizeVariant::ALL.len());
    }

    #[test]
    fn viewer_variants_are_derived_from_small() {
        assert_eq!(
            SizeVariant::ViewerNormal.origin(),
            VariantOrigin::Derived(SizeVariant::Small)
        );
        assert_eq!(
            SizeVariant::ViewerSmall.origin(),
            VariantOrigin::Derived(SizeVariant::Small)
        );
        assert!(SizeVariant::Small.is_fetched());
        assert_eq!(SizeVariant::ViewerSmall.extension(), "png");
        assert_eq!(SizeVariant::Normal.extension(), "jpg");
    }
}
