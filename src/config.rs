//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `AppConfig`：目录服务地址、缓存目录、限流上限、
//! 下载超时与体积上限、缩放质量档位，以及卡组布局几何参数。
//! 布局参数是一个不可变值，随调用显式传递，不使用进程级全局常量。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的配置。
//! - 可选的 JSON 设置文件只需写出要覆盖的字段（`#[serde(default)]`）。
//! - `ResizeQuality` 负责档位字符串解析与反向输出，映射到具体缩放滤镜。
//! - `validate` 在加载后统一做范围检查，非法值返回 `DeckError::Config`。

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::deck::Zone;
use crate::error::DeckError;
use crate::geometry::Point;

pub const DEFAULT_CATALOG_URL: &str = "https://db.ygoprodeck.com/api/v7/cardinfo.php";

/// 应用配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 卡片目录查询接口地址。
    pub catalog_base_url: String,
    /// 缓存根目录；未设置时使用工作目录下的 `cache`。
    pub cache_dir: Option<PathBuf>,
    /// 每秒最多允许完成的网络请求数。
    pub max_requests_per_second: u32,
    /// 下载单张卡图允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 单次请求总超时（秒）。
    pub download_timeout: u64,
    /// 建立连接（TCP/TLS）超时（秒）。
    pub connect_timeout: u64,
    /// 下载首包超时（毫秒）。
    pub stream_first_byte_timeout_ms: u64,
    /// 下载分块读取超时（毫秒）。
    pub stream_chunk_timeout_ms: u64,
    /// 派生尺寸时的缩放质量档位。
    pub resize_quality: ResizeQuality,
    /// 卡组区域布局。
    pub layout: LayoutConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: DEFAULT_CATALOG_URL.to_string(),
            cache_dir: None,
            max_requests_per_second: 20,
            max_file_size: 8 * 1024 * 1024,
            download_timeout: 30,
            connect_timeout: 8,
            stream_first_byte_timeout_ms: 10_000,
            stream_chunk_timeout_ms: 15_000,
            resize_quality: ResizeQuality::Balanced,
            layout: LayoutConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 设置文件加载配置。
    ///
    /// 文件不存在时回退到默认配置；存在但无法解析或取值越界时返回错误。
    pub fn load(path: &Path) -> Result<Self, DeckError> {
        if !path.exists() {
            log::info!("⚙️ 设置文件 {} 不存在，使用默认配置", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| DeckError::io(path, e))?;
        let config = Self::from_json(&content)?;
        log::info!("⚙️ 已加载设置文件 {}", path.display());
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, DeckError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| DeckError::Config(format!("解析设置文件失败: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DeckError> {
        if self.catalog_base_url.trim().is_empty() {
            return Err(DeckError::Config("catalog_base_url 不能为空".to_string()));
        }
        if !(1..=1000).contains(&self.max_requests_per_second) {
            return Err(DeckError::Config(
                "max_requests_per_second 必须在 1~1000 之间".to_string(),
            ));
        }
        if self.max_file_size == 0 {
            return Err(DeckError::Config("max_file_size 必须大于 0".to_string()));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(DeckError::Config("connect_timeout 必须在 1~120 秒之间".to_string()));
        }
        if !(1..=600).contains(&self.download_timeout) {
            return Err(DeckError::Config("download_timeout 必须在 1~600 秒之间".to_string()));
        }
        if !(500..=120_000).contains(&self.stream_first_byte_timeout_ms) {
            return Err(DeckError::Config(
                "stream_first_byte_timeout_ms 必须在 500~120000 毫秒之间".to_string(),
            ));
        }
        if !(500..=120_000).contains(&self.stream_chunk_timeout_ms) {
            return Err(DeckError::Config(
                "stream_chunk_timeout_ms 必须在 500~120000 毫秒之间".to_string(),
            ));
        }
        self.layout.validate()
    }

    pub fn cache_root(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| PathBuf::from("cache"))
    }
}

/// 缩放质量档位。
///
/// - `Quality`：尽量保真
/// - `Balanced`：质量与速度平衡
/// - `Speed`：优先速度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeQuality {
    Quality,
    Balanced,
    Speed,
}

impl FromStr for ResizeQuality {
    type Err = DeckError;

    /// 解析命令行或外部传入的档位字符串（忽略大小写与首尾空白）。
    fn from_str(profile: &str) -> Result<Self, Self::Err> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(DeckError::Config(format!(
                "未知缩放档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }
}

impl fmt::Display for ResizeQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ResizeQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }

    pub fn filter(self) -> FilterType {
        match self {
            Self::Quality => FilterType::Lanczos3,
            Self::Balanced => FilterType::Triangle,
            Self::Speed => FilterType::Nearest,
        }
    }
}

const MAX_LAYOUT_PADDING: u32 = 1_000;
const MAX_CARDS_PER_ROW: u32 = 100;
const MAX_LAYOUT_COORDINATE: i32 = 100_000;

/// 单个区域的网格布局。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneLayout {
    /// 区域左上角。
    pub origin: Point,
    /// 每行卡片数。
    pub cards_per_row: u32,
}

/// 卡组布局配置。
///
/// 卡片尺寸取自该区域的查看变体（主卡组 `viewer-normal`，额外/副卡组 `viewer-small`），
/// 这里只描述区域位置、每行数量与卡片间距。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub main: ZoneLayout,
    pub extra: ZoneLayout,
    pub side: ZoneLayout,
    /// 相邻卡片之间的间距（像素）。
    pub padding: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            main: ZoneLayout {
                origin: Point::new(40, 40),
                cards_per_row: 10,
            },
            extra: ZoneLayout {
                origin: Point::new(40, 600),
                cards_per_row: 15,
            },
            side: ZoneLayout {
                origin: Point::new(40, 720),
                cards_per_row: 15,
            },
            padding: 6,
        }
    }
}

impl LayoutConfig {
    pub fn zone(&self, zone: Zone) -> &ZoneLayout {
        match zone {
            Zone::Main => &self.main,
            Zone::Extra => &self.extra,
            Zone::Side => &self.side,
        }
    }

    fn validate(&self) -> Result<(), DeckError> {
        if self.padding > MAX_LAYOUT_PADDING {
            return Err(DeckError::Config(format!(
                "layout.padding 不能超过 {} 像素",
                MAX_LAYOUT_PADDING
            )));
        }
        for zone in Zone::ALL {
            let layout = self.zone(zone);
            if !(1..=MAX_CARDS_PER_ROW).contains(&layout.cards_per_row) {
                return Err(DeckError::Config(format!(
                    "layout.{}.cards_per_row 必须在 1~{} 之间",
                    zone.name(),
                    MAX_CARDS_PER_ROW
                )));
            }
            let within = |v: i32| (-MAX_LAYOUT_COORDINATE..=MAX_LAYOUT_COORDINATE).contains(&v);
            if !within(layout.origin.x) || !within(layout.origin.y) {
                return Err(DeckError::Config(format!(
                    "layout.{}.origin 坐标必须在 ±{} 之内",
                    zone.name(),
                    MAX_LAYOUT_COORDINATE
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = AppConfig::from_json(r#"{ "max_requests_per_second": 5 }"#)
            .expect("partial config should parse");

        assert_eq!(config.max_requests_per_second, 5);
        assert_eq!(config.catalog_base_url, DEFAULT_CATALOG_URL);
        assert_eq!(config.layout, LayoutConfig::default());
        assert_eq!(config.resize_quality, ResizeQuality::Balanced);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let result = AppConfig::from_json(r#"{ "max_requests_per_second": 0 }"#);
        assert!(matches!(result, Err(DeckError::Config(_))));

        let result = AppConfig::from_json(
            r#"{ "layout": { "main": { "origin": { "x": 0, "y": 0 }, "cards_per_row": 0 } } }"#,
        );
        assert!(matches!(result, Err(DeckError::Config(_))));
    }

    #[test]
    fn oversized_layout_values_are_rejected() {
        let result = AppConfig::from_json(r#"{ "layout": { "padding": 4294967200 } }"#);
        assert!(matches!(result, Err(DeckError::Config(_))));

        let result = AppConfig::from_json(
            r#"{ "layout": { "side": {
                "origin": { "x": 2147483000, "y": 0 }, "cards_per_row": 15 } } }"#,
        );
        assert!(matches!(result, Err(DeckError::Config(_))));

        let result = AppConfig::from_json(r#"{ "layout": { "padding": 1000 } }"#);
        assert!(result.is_ok());
    }

    #[test]
    fn resize_quality_parses_and_prints() {
        assert_eq!(" Speed ".parse::<ResizeQuality>().ok(), Some(ResizeQuality::Speed));
        assert_eq!(ResizeQuality::Quality.to_string(), "quality");
        assert!(matches!("ultra".parse::<ResizeQuality>(), Err(DeckError::Config(_))));
    }

    #[test]
    fn missing_settings_file_yields_default() {
        let path = std::env::temp_dir().join("ydk_settings_that_does_not_exist.json");
        let config = AppConfig::load(&path).expect("missing file falls back to default");
        assert_eq!(config.cache_root(), PathBuf::from("cache"));
    }
}
