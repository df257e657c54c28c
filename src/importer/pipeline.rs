//! # 解码与尺寸派生模块
//!
//! ## 设计思路
//!
//! 尺寸派生是纯函数：输入一张带变体标签的图像与目标变体，按固定规则表
//! 先（可选）按比例裁剪，再精确缩放到目标尺寸。相同输入永远得到逐像素相同的输出。
//! 派生结果由调用方写入缓存，本模块不产生任何副作用。
//!
//! ## 规则表
//!
//! | 来源 | 目标 | 裁剪 |
//! |------|------|------|
//! | small | viewer-normal / viewer-small | 无 |
//! | normal | small / viewer-normal / viewer-small | 无 |
//! | normal | cropped | 卡图画框区域 |
//!
//! 表外组合返回 `DeckError::UnsupportedDerivation`。

use std::io::Cursor;

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgba};

use super::{SizeVariant, VariantImage};
use crate::error::DeckError;

/// 按比例描述的裁剪框（相对源图宽高）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// 一条派生规则。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivationRule {
    pub from: SizeVariant,
    pub to: SizeVariant,
    pub crop: Option<CropBox>,
}

/// 标准卡面上的画框区域。
const ARTWORK_BOX: CropBox = CropBox {
    x: 0.12,
    y: 0.18,
    width: 0.76,
    height: 0.52,
};

const fn scale(from: SizeVariant, to: SizeVariant) -> DerivationRule {
    DerivationRule {
        from,
        to,
        crop: None,
    }
}

const RULES: &[DerivationRule] = &[
    scale(SizeVariant::Small, SizeVariant::ViewerNormal),
    scale(SizeVariant::Small, SizeVariant::ViewerSmall),
    scale(SizeVariant::Normal, SizeVariant::Small),
    scale(SizeVariant::Normal, SizeVariant::ViewerNormal),
    scale(SizeVariant::Normal, SizeVariant::ViewerSmall),
    DerivationRule {
        from: SizeVariant::Normal,
        to: SizeVariant::Cropped,
        crop: Some(ARTWORK_BOX),
    },
];

pub fn derivation_rule(from: SizeVariant, to: SizeVariant) -> Option<&'static DerivationRule> {
    RULES.iter().find(|rule| rule.from == from && rule.to == to)
}

/// 将字节解码为图像。
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, DeckError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DeckError::Decode(format!("无法识别图片格式：{}", e)))?
        .decode()
        .map_err(|e| DeckError::Decode(format!("图片解码失败：{}", e)))
}

/// 尺寸派生器，只持有缩放滤镜。
#[derive(Debug, Clone, Copy)]
pub struct ImageResizer {
    filter: FilterType,
}

impl ImageResizer {
    pub fn new(filter: FilterType) -> Self {
        Self { filter }
    }

    /// 从来源变体派生目标变体。
    pub fn derive(
        &self,
        source: &VariantImage,
        target: SizeVariant,
    ) -> Result<VariantImage, DeckError> {
        let rule = derivation_rule(source.variant, target).ok_or(
            DeckError::UnsupportedDerivation {
                from: source.variant,
                to: target,
            },
        )?;

        let cropped;
        let input = match rule.crop {
            Some(crop_box) => {
                cropped = Self::crop(&source.image, crop_box)?;
                &cropped
            }
            None => &source.image,
        };

        let (target_width, target_height) = target.dimensions();
        let fast =
            Self::resize_with_fast_image_resize(input, target_width, target_height, self.filter);
        let resized = match fast {
            Ok(resized) => resized,
            Err(err) => {
                log::warn!("⚠️ fast_image_resize 缩放失败，回退 image::resize_exact：{}", err);
                input.resize_exact(target_width, target_height, self.filter)
            }
        };

        log::debug!(
            "🧩 派生 {} -> {}：{}x{} -> {}x{}",
            source.variant,
            target,
            source.image.width(),
            source.image.height(),
            target_width,
            target_height
        );

        Ok(VariantImage::new(target, resized))
    }

    fn crop(image: &DynamicImage, crop_box: CropBox) -> Result<DynamicImage, DeckError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(DeckError::Decode("源图尺寸为 0，无法裁剪".to_string()));
        }

        let x = ((width as f32 * crop_box.x).floor() as u32).min(width - 1);
        let y = ((height as f32 * crop_box.y).floor() as u32).min(height - 1);
        let w = ((width as f32 * crop_box.width).floor() as u32).clamp(1, width - x);
        let h = ((height as f32 * crop_box.height).floor() as u32).clamp(1, height - y);

        Ok(image.crop_imm(x, y, w, h))
    }

    fn resize_with_fast_image_resize(
        image: &DynamicImage,
        target_width: u32,
        target_height: u32,
        filter: FilterType,
    ) -> Result<DynamicImage, DeckError> {
        let src = image.to_rgba8();
        let (src_width, src_height) = src.dimensions();

        let pixels = src.into_raw();
        let src_image =
            fr::images::Image::from_vec_u8(src_width, src_height, pixels, fr::PixelType::U8x4)
                .map_err(|e| DeckError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image =
            fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

        let mut resizer = fr::Resizer::new();
        let algorithm = fr::ResizeAlg::Convolution(Self::to_fast_filter(filter));
        let options = fr::ResizeOptions::new().resize_alg(algorithm);

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| DeckError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

        let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(
            target_width,
            target_height,
            dst_image.into_vec(),
        )
        .ok_or_else(|| DeckError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))?;

        Ok(DynamicImage::ImageRgba8(rgba))
    }

    fn to_fast_filter(filter: FilterType) -> fr::FilterType {
        match filter {
            FilterType::Nearest => fr::FilterType::Box,
            FilterType::Triangle => fr::FilterType::Bilinear,
            FilterType::CatmullRom => fr::FilterType::CatmullRom,
            FilterType::Gaussian => fr::FilterType::Mitchell,
            FilterType::Lanczos3 => fr::FilterType::Lanczos3,
        }
    }
}
