//! # 游戏王卡组构建工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │            界面层（窗口 / 菜单 / 绘制，不在本库）          │
//! │        读取 Deck 渲染卡片；把指针事件交给 DeckSession      │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ DeckSession（Result<_, DeckError>）
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            核心 (Rust)                           │
//! │                                                          │
//! │  ┌─ error ────── DeckError (统一错误类型)                 │
//! │  ├─ config ───── AppConfig / LayoutConfig                │
//! │  ├─ deck ─────── DeckList / Deck / Card                  │
//! │  │   ├─ parser        .ydk 文本解析                       │
//! │  │   └─ drag          拖拽状态机                          │
//! │  ├─ importer ─── 查询 · 下载 · 限流 · 派生 · 编排          │
//! │  ├─ storage ──── 卡图磁盘缓存                             │
//! │  ├─ geometry ─── Point / Rect                            │
//! │  └─ session ──── 当前卡组 + 拖拽控制器                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `DeckError`，各失败种类可按分支匹配 |
//! | [`config`] | JSON 设置文件、限流/超时/缩放档位、布局参数 |
//! | [`deck`] | 卡组模型、.ydk 解析与导出、拖拽交互 |
//! | [`importer`] | 目录查询、卡图下载、限流、尺寸派生、导入编排 |
//! | [`storage`] | `(卡号, 变体)` 为键的磁盘缓存 |
//! | [`geometry`] | 整数像素几何 |
//! | [`session`] | 导入成功才替换卡组，转发指针事件 |

pub mod config;
pub mod deck;
pub mod error;
pub mod geometry;
pub mod importer;
pub mod session;
pub mod storage;

pub use config::{AppConfig, LayoutConfig};
pub use deck::{Card, CardIdentifier, Deck, DeckList, Zone};
pub use error::DeckError;
pub use importer::{DeckImporter, SizeVariant};
pub use session::DeckSession;
pub use storage::{CacheKey, CacheStore};
