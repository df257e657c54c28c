//! 卡图缓存目录管理模块
//!
//! # 设计思路
//!
//! 以 `(卡号, 尺寸变体)` 为键的磁盘缓存，布局固定为
//! `<root>/<变体名>/<卡号>.<扩展名>`。同一个键永远映射到同一路径，
//! “文件是否存在”是唯一的命中依据：没有过期时间，也没有校验和。
//!
//! # 实现思路
//!
//! - 缓存无淘汰策略，只能由用户显式 `clear_all` 清空。
//! - 写入时按需 `create_dir_all`，上层无需关心目录是否存在。
//! - 先写同目录下的临时文件再 `rename`，中断的写入不会留下被当作命中的残缺文件。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use std::fmt;
use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use crate::deck::CardIdentifier;
use crate::error::DeckError;
use crate::importer::SizeVariant;

/// 缓存键：卡号 + 尺寸变体
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub identifier: CardIdentifier,
    pub variant: SizeVariant,
}

impl CacheKey {
    pub fn new(identifier: CardIdentifier, variant: SizeVariant) -> Self {
        Self { identifier, variant }
    }

    fn file_name(&self) -> String {
        format!("{}.{}", self.identifier, self.variant.extension())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.variant, self.file_name())
    }
}

/// 缓存目录信息
#[derive(Debug, Clone)]
pub struct StorageInfo {
    pub path: String,
    pub total_size: u64,
    pub file_count: u64,
}

/// 磁盘卡图缓存
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// 以指定根目录创建缓存。目录会在首次写入时创建。
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 键对应的文件路径（纯计算，不访问磁盘）。
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.variant.name()).join(key.file_name())
    }

    pub fn exists(&self, key: &CacheKey) -> bool {
        self.path_for(key).is_file()
    }

    /// 读取缓存的原始字节。
    ///
    /// # 返回
    /// - `Err(DeckError::NotCached)` — 该键没有对应文件
    pub fn read(&self, key: &CacheKey) -> Result<Vec<u8>, DeckError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(DeckError::NotCached(key.clone())),
            Err(err) => Err(DeckError::io(path, err)),
        }
    }

    /// 读取并解码缓存图片。
    pub fn read_image(&self, key: &CacheKey) -> Result<DynamicImage, DeckError> {
        let bytes = self.read(key)?;
        image::load_from_memory(&bytes)
            .map_err(|e| DeckError::Decode(format!("缓存图片 {} 无法解码：{}", key, e)))
    }

    /// 写入原始字节，已存在则覆盖。
    pub fn write(&self, key: &CacheKey, data: &[u8]) -> Result<(), DeckError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| DeckError::io(parent, e))?;
        }

        let partial = path.with_file_name(format!(".{}.partial", key.file_name()));
        fs::write(&partial, data).map_err(|e| DeckError::io(&partial, e))?;
        if let Err(e) = fs::rename(&partial, &path) {
            let _ = fs::remove_file(&partial);
            return Err(DeckError::io(&path, e));
        }
        log::debug!("💾 写入缓存 {} ({} bytes)", key, data.len());
        Ok(())
    }

    /// 将图片编码为 PNG 后写入。
    pub fn write_image(&self, key: &CacheKey, image: &DynamicImage) -> Result<(), DeckError> {
        let mut encoded = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .map_err(|e| DeckError::Decode(format!("PNG 编码失败：{}", e)))?;
        self.write(key, &encoded)
    }

    /// 清空全部缓存。
    ///
    /// 根目录不存在或只剩部分子目录时同样返回 `Ok`。
    pub fn clear_all(&self) -> Result<(), DeckError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(DeckError::io(&self.root, err)),
        };

        let mut removed = 0usize;
        for entry in entries {
            let entry = entry.map_err(|e| DeckError::io(&self.root, e))?;
            let path = entry.path();
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };

            match result {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(DeckError::io(&path, err)),
            }
        }

        log::info!("🧹 已清空缓存目录 {}（{} 项）", self.root.display(), removed);
        Ok(())
    }

    /// 获取缓存目录信息（路径 + 占用大小 + 文件数）
    pub fn info(&self) -> StorageInfo {
        let mut total_size: u64 = 0;
        let mut file_count: u64 = 0;

        for variant in SizeVariant::ALL {
            let dir = self.root.join(variant.name());
            if let Ok(entries) = fs::read_dir(&dir) {
                for entry in entries.flatten() {
                    if let Ok(metadata) = entry.metadata() {
                        if metadata.is_file() {
                            total_size += metadata.len();
                            file_count += 1;
                        }
                    }
                }
            }
        }

        StorageInfo {
            path: self.root.to_string_lossy().to_string(),
            total_size,
            file_count,
        }
    }
}
