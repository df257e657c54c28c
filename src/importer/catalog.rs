//! # 卡片目录查询
//!
//! ## 设计思路
//!
//! `CatalogSource` 是导入流水线与远端目录服务之间唯一的接缝：
//! 一次 `lookup` 对应一次 HTTP GET，一次 `download` 对应一次卡图下载。
//! 生产实现为 `HttpCatalog`（YGOPRODeck `cardinfo.php`），测试可注入内存实现。
//!
//! ## 响应格式
//!
//! ```text
//! GET <base>?id=89631139        GET <base>?name=Dark%20Magician
//!
//! 200 { "data": [ { "id": .., "name": .., "type": ..,
//!                   "card_images": [ { "id": .., "image_url": ..,
//!                                      "image_url_small": ..,
//!                                      "image_url_cropped": .. } ] } ] }
//! ```
//!
//! 非 200、`data` 为空或响应体无法解析时返回 `DeckError::LookupFailure`。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::loader::DownloadError;
use super::SizeVariant;
use crate::config::AppConfig;
use crate::error::DeckError;

/// 查询方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    Id,
    Name,
}

impl LookupMode {
    /// 对应的查询参数名。
    pub fn param(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
        }
    }
}

/// 单个卡图条目（同一张卡可能有多个异画）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardImageUrls {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub image_url_small: String,
    #[serde(default)]
    pub image_url_cropped: String,
}

/// 目录元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMetadata {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub card_images: Vec<CardImageUrls>,
}

impl CardMetadata {
    /// 直接下载型变体在 `card_images[0]` 中的地址；派生变体或字段为空时返回 `None`。
    pub fn url_for(&self, variant: SizeVariant) -> Option<&str> {
        let images = self.card_images.first()?;
        let url = match variant {
            SizeVariant::Small => &images.image_url_small,
            SizeVariant::Normal => &images.image_url,
            SizeVariant::Cropped => &images.image_url_cropped,
            SizeVariant::ViewerNormal | SizeVariant::ViewerSmall => return None,
        };

        if url.is_empty() { None } else { Some(url.as_str()) }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    data: Vec<CardMetadata>,
}

/// 远端卡片目录。
#[allow(async_fn_in_trait)]
pub trait CatalogSource {
    /// 查询卡片元数据（一次网络请求）。
    async fn lookup(&self, query: &str, mode: LookupMode) -> Result<CardMetadata, DeckError>;

    /// 下载卡图原始字节（一次网络请求）。
    async fn download(&self, url: &str) -> Result<Vec<u8>, DownloadError>;
}

/// 基于 reqwest 的目录客户端。
///
/// 客户端在构造时创建并复用，避免每次请求重复建立连接池。
pub struct HttpCatalog {
    pub(super) client: reqwest::Client,
    pub(super) base_url: reqwest::Url,
    pub(super) max_file_size: u64,
    pub(super) download_timeout: u64,
    pub(super) stream_first_byte_timeout: Duration,
    pub(super) stream_chunk_timeout: Duration,
}

impl HttpCatalog {
    pub fn new(config: &AppConfig) -> Result<Self, DeckError> {
        let base_url = reqwest::Url::parse(&config.catalog_base_url)
            .map_err(|e| DeckError::Config(format!("catalog_base_url 格式错误：{}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .user_agent(concat!("ydk-deck-builder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeckError::Config(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self {
            client,
            base_url,
            max_file_size: config.max_file_size,
            download_timeout: config.download_timeout,
            stream_first_byte_timeout: Duration::from_millis(config.stream_first_byte_timeout_ms),
            stream_chunk_timeout: Duration::from_millis(config.stream_chunk_timeout_ms),
        })
    }

    fn lookup_url(&self, query: &str, mode: LookupMode) -> reqwest::Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair(mode.param(), query);
        url
    }

    fn parse_response(query: &str, body: &[u8]) -> Result<CardMetadata, DeckError> {
        let parsed: CatalogResponse =
            serde_json::from_slice(body).map_err(|e| DeckError::LookupFailure {
                query: query.to_string(),
                reason: format!("响应无法解析：{}", e),
            })?;

        parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| DeckError::LookupFailure {
                query: query.to_string(),
                reason: "目录返回空结果".to_string(),
            })
    }
}

impl CatalogSource for HttpCatalog {
    async fn lookup(&self, query: &str, mode: LookupMode) -> Result<CardMetadata, DeckError> {
        let url = self.lookup_url(query, mode);
        log::debug!("🔎 查询卡片目录 {}={}", mode.param(), query);

        let failure = |reason: String| DeckError::LookupFailure {
            query: query.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    failure(format!("请求超时（{}秒）", self.download_timeout))
                } else {
                    failure(format!("请求失败：{}", Self::sanitize_reqwest_error(&e)))
                }
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(failure(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| failure(format!("读取响应失败：{}", Self::sanitize_reqwest_error(&e))))?;

        let metadata = Self::parse_response(query, &body)?;
        log::debug!("✅ 目录命中 {} - {}", metadata.id, metadata.name);
        Ok(metadata)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        self.download_with_validation(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    const SAMPLE: &str = r#"{"data":[{
        "id":89631139,
        "name":"Blue-Eyes White Dragon",
        "type":"Normal Monster",
        "card_images":[{"id":89631139,
            "image_url":"https://images.ygoprodeck.com/images/cards/89631139.jpg",
            "image_url_small":"https://images.ygoprodeck.com/images/cards_small/89631139.jpg",
            "image_url_cropped":
                "https://images.ygoprodeck.com/images/cards_cropped/89631139.jpg"}]}]}"#;

    fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (u16, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
        let port = listener.local_addr().expect("read local addr failed").port();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept failed");
            let mut req_buf = [0u8; 2048];
            let n = stream.read(&mut req_buf).unwrap_or(0);

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).expect("write response failed");
            stream.flush().expect("flush failed");

            String::from_utf8_lossy(&req_buf[..n]).to_string()
        });

        (port, server)
    }

    fn catalog_for(port: u16) -> HttpCatalog {
        let config = AppConfig {
            catalog_base_url: format!("http://127.0.0.1:{}/api/v7/cardinfo.php", port),
            ..AppConfig::default()
        };
        HttpCatalog::new(&config).expect("catalog init failed")
    }

    #[test]
    fn url_for_maps_fetched_variants_only() {
        let metadata =
            HttpCatalog::parse_response("89631139", SAMPLE.as_bytes()).expect("sample parses");

        assert_eq!(metadata.kind, "Normal Monster");
        let small = metadata.url_for(SizeVariant::Small).expect("small url");
        let cropped = metadata.url_for(SizeVariant::Cropped).expect("cropped url");
        assert!(small.contains("cards_small"));
        assert!(cropped.contains("cards_cropped"));
        assert!(metadata.url_for(SizeVariant::ViewerSmall).is_none());
    }

    #[test]
    fn empty_data_is_lookup_failure() {
        let result = HttpCatalog::parse_response("0", br#"{"data":[]}"#);
        assert!(matches!(result, Err(DeckError::LookupFailure { .. })));
    }

    #[tokio::test]
    async fn lookup_sends_mode_as_query_parameter() {
        let (port, server) = serve_once("200 OK", SAMPLE);
        let catalog = catalog_for(port);

        let metadata = catalog
            .lookup("Blue-Eyes White Dragon", LookupMode::Name)
            .await
            .expect("lookup should succeed");
        let request = server.join().expect("server thread failed");

        assert_eq!(metadata.id, 89631139);
        assert!(request.starts_with("GET /api/v7/cardinfo.php?name=Blue-Eyes+White+Dragon "));
    }

    #[tokio::test]
    async fn non_200_status_is_lookup_failure() {
        let (port, server) = serve_once(
            "400 Bad Request",
            r#"{"error":"No card matching your query was found in the database."}"#,
        );
        let catalog = catalog_for(port);

        let result = catalog.lookup("1", LookupMode::Id).await;
        server.join().expect("server thread failed");

        match result {
            Err(DeckError::LookupFailure { query, reason }) => {
                assert_eq!(query, "1");
                assert!(reason.contains("400"));
            }
            other => panic!("expected LookupFailure, got {:?}", other),
        }
    }
}
