//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `DeckError` 枚举，覆盖“解析 → 查询 → 下载 → 缓存 → 派生”
//! 整条导入链路的失败来源，调用方按分支匹配区分错误种类，而不是比较消息文本。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 单卡失败统一包装为 `DeckError::Import`，携带出错的卡号与根因。
//! - 导入失败时不产出任何残缺卡组，由上层决定是否保留旧卡组。

use std::path::PathBuf;

use crate::deck::CardIdentifier;
use crate::importer::SizeVariant;
use crate::storage::CacheKey;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    /// 卡组文本中出现无法识别的行（非指令、非纯数字，或在分区指令之前出现卡号）
    #[error("卡组文件第 {line_number} 行格式错误: {line:?}")]
    MalformedDeckList { line_number: usize, line: String },

    /// 卡组文件不存在
    #[error("卡组文件不存在: {}", .0.display())]
    DeckFileNotFound(PathBuf),

    /// 卡片目录查询失败（非 200 / 响应为空 / 响应无法解析）
    #[error("卡片查询失败 ({query}): {reason}")]
    LookupFailure { query: String, reason: String },

    /// 卡图下载或落盘失败
    #[error("卡图获取失败 ({identifier}): {reason}")]
    AcquireFailure { identifier: String, reason: String },

    /// 尺寸派生规则表中不存在该组合
    #[error("不支持的尺寸派生: {from} -> {to}")]
    UnsupportedDerivation { from: SizeVariant, to: SizeVariant },

    /// 读取了不存在的缓存条目
    #[error("缓存未命中: {0}")]
    NotCached(CacheKey),

    /// 图片解码 / 编码失败
    #[error("图片解码失败: {0}")]
    Decode(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误 ({}): {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置非法
    #[error("配置错误: {0}")]
    Config(String),

    /// 导入被调用方取消
    #[error("导入已取消")]
    Cancelled,

    /// 单张卡解析失败，整个导入中止
    #[error("卡片 {identifier} 导入失败: {source}")]
    Import {
        identifier: CardIdentifier,
        #[source]
        source: Box<DeckError>,
    },
}

impl DeckError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 剥离 `Import` 包装，返回真正的失败原因。
    pub fn root_cause(&self) -> &DeckError {
        match self {
            Self::Import { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// 若错误来自某张卡，返回该卡号。
    pub fn offending_identifier(&self) -> Option<&CardIdentifier> {
        match self {
            Self::Import { identifier, .. } => Some(identifier),
            _ => None,
        }
    }
}
