//! # 卡图下载与校验模块
//!
//! ## 设计思路
//!
//! 卡图来自公共 CDN，单张通常只有几十 KB。下载按以下顺序尽早拒绝：
//! 状态码 → 声明的媒体类型 → 声明体积 → 累计体积 → 文件签名（magic bytes）。
//!
//! ## 实现思路
//!
//! - `Response::chunk()` 流式读取，首包与后续分块使用不同超时。
//! - `CardImageBuffer` 负责累计字节、体积上限与签名嗅探，循环本身只管读。
//! - 签名必须在前 `SIGNATURE_SNIFF_LIMIT` 字节内被 `infer` 识别为图片。
//! - CDN 偶尔以 `application/octet-stream` 返回卡图，放行后交给签名判断。
//! - 日志与错误信息里的 URL 去掉查询串与片段。

use std::time::Duration;

use reqwest::Url;

use super::catalog::HttpCatalog;

const SIGNATURE_SNIFF_LIMIT: usize = 4096;
const CARD_BUFFER_CAPACITY: usize = 64 * 1024;

/// 下载阶段错误。
///
/// 由卡图获取器统一上转为 `DeckError::AcquireFailure`。
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("网络错误：{0}")]
    Network(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),
}

/// 下载中的卡图字节。
struct CardImageBuffer {
    bytes: Vec<u8>,
    limit: u64,
    /// 已嗅探出的图片 MIME；`None` 表示字节还不够判断。
    mime: Option<&'static str>,
}

impl CardImageBuffer {
    fn new(declared_len: Option<u64>, limit: u64) -> Self {
        let capacity = declared_len
            .filter(|len| *len > 0)
            .map_or(CARD_BUFFER_CAPACITY, |len| len.min(limit) as usize);
        Self {
            bytes: Vec::with_capacity(capacity),
            limit,
            mime: None,
        }
    }

    fn push(&mut self, chunk: &[u8]) -> Result<(), DownloadError> {
        if (self.bytes.len() + chunk.len()) as u64 > self.limit {
            return Err(DownloadError::ResourceLimit(format!(
                "卡图超过 {} KB 上限",
                self.limit / 1024
            )));
        }
        self.bytes.extend_from_slice(chunk);

        if self.mime.is_none() {
            self.mime = sniff_image(&self.bytes, false)?;
        }
        Ok(())
    }

    fn finish(self) -> Result<(Vec<u8>, &'static str), DownloadError> {
        let mime = match self.mime {
            Some(mime) => mime,
            None => sniff_image(&self.bytes, true)?
                .ok_or_else(|| DownloadError::InvalidFormat("无法识别卡图格式".to_string()))?,
        };
        Ok((self.bytes, mime))
    }
}

/// 用文件签名判断是否为图片。
///
/// `complete` 为 `false` 时表示还在下载：字节不足以判断返回 `Ok(None)`，
/// 超过嗅探上限仍无法识别才报错。
fn sniff_image(bytes: &[u8], complete: bool) -> Result<Option<&'static str>, DownloadError> {
    if bytes.is_empty() {
        return if complete {
            Err(DownloadError::InvalidFormat("卡图内容为空".to_string()))
        } else {
            Ok(None)
        };
    }

    match infer::get(bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => {
            Ok(Some(kind.mime_type()))
        }
        Some(kind) => Err(DownloadError::InvalidFormat(format!(
            "下载内容不是图片：{}",
            kind.mime_type()
        ))),
        None if complete || bytes.len() >= SIGNATURE_SNIFF_LIMIT => {
            Err(DownloadError::InvalidFormat("文件签名不是已知的图片格式".to_string()))
        }
        None => Ok(None),
    }
}

/// 声明的媒体类型是否可能是卡图。
fn accepts_media_type(content_type: &str) -> bool {
    let media = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media.starts_with("image/") || media == "application/octet-stream"
}

/// 去掉查询串与片段后的 URL，用于日志。
fn loggable(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}

impl HttpCatalog {
    /// 执行带校验的流式下载。
    pub(super) async fn download_with_validation(
        &self,
        url: &str,
    ) -> Result<Vec<u8>, DownloadError> {
        let url = Url::parse(url)
            .map_err(|e| DownloadError::InvalidFormat(format!("卡图地址无效：{}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DownloadError::InvalidFormat(format!(
                "不支持的卡图地址协议：{}",
                url.scheme()
            )));
        }
        let shown = loggable(&url);
        log::debug!("🌐 下载卡图 {}", shown);

        let mut response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "image/jpeg,image/png,image/*;q=0.8")
            .send()
            .await
            .map_err(|e| self.network_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Network(format!("{} 返回 HTTP {}", shown, status)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        if let Some(content_type) = content_type.filter(|ct| !accepts_media_type(ct)) {
            return Err(DownloadError::InvalidFormat(format!(
                "{} 不是卡图（{}）",
                shown, content_type
            )));
        }

        let declared_len = response.content_length();
        if declared_len.is_some_and(|len| len > self.max_file_size) {
            return Err(DownloadError::ResourceLimit(format!(
                "卡图声明大小 {} KB 超过 {} KB 上限",
                declared_len.unwrap_or_default() / 1024,
                self.max_file_size / 1024
            )));
        }

        let mut buffer = CardImageBuffer::new(declared_len, self.max_file_size);
        let mut read_timeout: Duration = self.stream_first_byte_timeout;
        loop {
            let next = tokio::time::timeout(read_timeout, response.chunk())
                .await
                .map_err(|_| {
                    if buffer.bytes.is_empty() {
                        DownloadError::Timeout(format!("{} 首包超时", shown))
                    } else {
                        DownloadError::Timeout(format!("{} 读取卡图数据超时", shown))
                    }
                })?
                .map_err(|e| self.network_error(e))?;

            match next {
                Some(chunk) => buffer.push(&chunk)?,
                None => break,
            }
            read_timeout = self.stream_chunk_timeout;
        }

        let (bytes, mime) = buffer.finish()?;
        log::debug!("✅ 卡图下载完成 {} - {} ({} bytes)", shown, mime, bytes.len());
        Ok(bytes)
    }

    fn network_error(&self, e: reqwest::Error) -> DownloadError {
        if e.is_timeout() {
            DownloadError::Timeout(format!("请求超过 {} 秒", self.download_timeout))
        } else if e.is_connect() {
            DownloadError::Network(format!("无法连接：{}", Self::sanitize_reqwest_error(&e)))
        } else {
            DownloadError::Network(Self::sanitize_reqwest_error(&e))
        }
    }

    /// reqwest 错误信息，其中的 URL 换成去掉查询串的版本。
    pub(super) fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
        let msg = e.to_string();
        match e.url() {
            Some(url) => msg.replace(url.as_str(), &loggable(url)),
            None => msg,
        }
    }
}
