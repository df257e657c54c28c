//! # 游戏王卡组构建工具 — 命令行入口
//!
//! 本文件仅负责参数解析、日志初始化与子命令分发。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use ydk_deck_builder::config::ResizeQuality;
use ydk_deck_builder::importer::{ImportProgress, LookupMode};
use ydk_deck_builder::{AppConfig, CacheStore, DeckError, DeckImporter, DeckSession, Zone};

#[derive(Debug, Parser)]
#[command(name = "ydk-deck-builder", version, about = "导入 .ydk 卡组并缓存卡图")]
struct Cli {
    /// JSON 设置文件
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 覆盖设置中的缓存目录
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// 覆盖设置中的缩放档位（quality / balanced / speed）
    #[arg(long, global = true)]
    quality: Option<ResizeQuality>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 导入卡组文件，下载并缓存全部卡图
    Import {
        deck: PathBuf,
        /// 导入成功后重新导出到该路径
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// 查询单张卡的目录信息
    Lookup {
        query: String,
        #[arg(long, value_enum, default_value_t = LookupBy::Name)]
        by: LookupBy,
    },
    /// 清空卡图缓存
    ClearCache,
    /// 显示缓存目录占用
    CacheInfo,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LookupBy {
    Id,
    Name,
}

impl From<LookupBy> for LookupMode {
    fn from(by: LookupBy) -> Self {
        match by {
            LookupBy::Id => LookupMode::Id,
            LookupBy::Name => LookupMode::Name,
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig, DeckError> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = Some(dir.clone());
    }
    if let Some(quality) = cli.quality {
        config.resize_quality = quality;
    }
    config.validate()?;
    log::debug!(
        "⚙️ 缩放档位 {}，缓存目录 {}",
        config.resize_quality,
        config.cache_root().display()
    );
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), DeckError> {
    let config = load_config(&cli)?;

    match cli.command {
        Command::Import { deck, export } => {
            let importer = DeckImporter::from_config(&config)?;
            let mut session = DeckSession::new(config.layout);

            let list = ydk_deck_builder::deck::parse_file(&deck)?;
            let result = importer
                .import_with_hooks(
                    &list,
                    |p: &ImportProgress| {
                        log::info!(
                            "[{}/{}] {} {}{}",
                            p.done,
                            p.total,
                            p.zone.name(),
                            p.identifier,
                            if p.fetched_from_network { " ⬇️" } else { "" }
                        );
                    },
                    || false,
                )
                .await;

            let imported = session.commit_import(result)?;
            for zone in Zone::ALL {
                println!("{:<6} {} 张", zone.name(), imported.zone(zone).len());
            }
            println!("网络请求 {} 次", importer.rate_limiter().throttled_calls());

            if let Some(out) = export {
                imported.export_to_file(&out)?;
                println!("已导出到 {}", out.display());
            }
        }
        Command::Lookup { query, by } => {
            let importer = DeckImporter::from_config(&config)?;
            let metadata = importer.lookup(&query, by.into()).await?;
            let pretty = serde_json::to_string_pretty(&metadata)
                .map_err(|e| DeckError::Decode(format!("序列化元数据失败: {}", e)))?;
            println!("{}", pretty);
        }
        Command::ClearCache => {
            let cache = CacheStore::new(config.cache_root());
            DeckSession::new(config.layout).clear_cache(&cache)?;
            println!("已清空缓存 {}", cache.root().display());
        }
        Command::CacheInfo => {
            let info = CacheStore::new(config.cache_root()).info();
            println!(
                "{}: {} 个文件, {:.2} MB",
                info.path,
                info.file_count,
                info.total_size as f64 / 1024.0 / 1024.0
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("错误: {}", err);
            ExitCode::FAILURE
        }
    }
}
