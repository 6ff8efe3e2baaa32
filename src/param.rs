// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Web 服务器协议参数与常量模块
//!
//! 该模块定义了处理器树服务器遵循的 HTTP 协议相关常量和数据结构，包括：
//! - 常见的 HTTP 状态码及其原因短语（Reason Phrase）。
//! - 静态站点常用的 MIME 类型映射表，以及基于文件名的内容类型推测。
//! - HTTP 方法、协议版本及编码格式的强类型枚举。

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

/// 服务器名称标识，用于 HTTP 响应头的 `Server` 字段
pub const SERVER_NAME: &str = "shaneyale-webtree";

/// 生成的 HTML 页面所使用的内容类型
pub const HTML_CONTENT_TYPE: &str = "text/html;charset=utf-8";

/// 无法推测内容类型时使用的通用二进制类型
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

lazy_static! {
    /// 静态内容处理器允许处理的 HTTP 方法列表。
    ///
    /// 不在该列表中的方法将触发 405 Method Not Allowed，并在 `Allow` 头中列出这些方法。
    pub static ref ALLOWED_METHODS: Vec<HttpRequestMethod> = {
        vec![
            HttpRequestMethod::Get,
            HttpRequestMethod::Head,
            HttpRequestMethod::Options,
        ]
    };
}

/// 处理器树服务器会产生的状态码及其原因短语，参考 RFC 9110
const STATUS_TABLE: &[(u16, &str)] = &[
    (200, "OK"),
    (204, "No Content"),
    (301, "Moved Permanently"),
    (302, "Found"),
    (304, "Not Modified"),
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (408, "Request Timeout"),
    (413, "Content Too Large"),
    (414, "URI Too Long"),
    (500, "Internal Server Error"),
    (501, "Not Implemented"),
    (503, "Service Unavailable"),
    (505, "HTTP Version Not Supported"),
];

/// 静态站点常见的扩展名，不区分大小写匹配
const MIME_TABLE: &[(&str, &str)] = &[
    // 文本
    ("html", HTML_CONTENT_TYPE),
    ("htm", HTML_CONTENT_TYPE),
    ("css", "text/css;charset=utf-8"),
    ("js", "text/javascript;charset=utf-8"),
    ("mjs", "text/javascript;charset=utf-8"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("xml", "text/xml"),
    ("json", "application/json"),
    ("webmanifest", "application/manifest+json"),
    // 图片
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("avif", "image/avif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    // 字体
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    // 音视频
    ("mp3", "audio/mpeg"),
    ("ogg", "audio/ogg"),
    ("wav", "audio/wav"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    // 文档与归档
    ("pdf", "application/pdf"),
    ("wasm", "application/wasm"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tar", "application/x-tar"),
    ("7z", "application/x-7z-compressed"),
];

lazy_static! {
    /// HTTP 状态码与其对应的标准原因短语映射表。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = STATUS_TABLE.iter().copied().collect();

    /// 文件后缀名到 MIME 类型（Media Type）的映射表。
    ///
    /// 用于设置响应头中的 `Content-Type` 字段；未登记的后缀由调用方回退到 [`DEFAULT_CONTENT_TYPE`]。
    pub static ref MIME_TYPES: HashMap<&'static str, &'static str> = MIME_TABLE.iter().copied().collect();
}

/// 支持的 HTTP 协议版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    /// HTTP/1.0 版本
    V1_0,
    /// HTTP/1.1 版本
    V1_1,
}

impl HttpVersion {
    /// 状态行中使用的协议标识
    pub fn protocol(&self) -> &'static str {
        match *self {
            HttpVersion::V1_0 => "HTTP/1.0",
            HttpVersion::V1_1 => "HTTP/1.1",
        }
    }
}

/// 标准 HTTP 请求方法
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpRequestMethod {
    /// 获取资源
    Get,
    /// 获取资源的元数据（不包含响应体）
    Head,
    /// 查询服务器支持的选项
    Options,
    /// 提交数据或执行操作
    Post,
}

/// 支持的内容编码（压缩）格式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpEncoding {
    /// GNU zip 压缩
    Gzip,
    /// zlib 压缩
    Deflate,
    /// Brotli 压缩
    Br,
}

impl fmt::Display for HttpVersion {
    /// 将枚举格式化为 HTTP 报文中的版本字符串
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpVersion::V1_0 => write!(f, "1.0"),
            HttpVersion::V1_1 => write!(f, "1.1"),
        }
    }
}

impl fmt::Display for HttpRequestMethod {
    /// 将枚举格式化为 HTTP 标准大写方法名
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpRequestMethod::Get => write!(f, "GET"),
            HttpRequestMethod::Head => write!(f, "HEAD"),
            HttpRequestMethod::Options => write!(f, "OPTIONS"),
            HttpRequestMethod::Post => write!(f, "POST"),
        }
    }
}

impl fmt::Display for HttpEncoding {
    /// 将枚举格式化为 `Content-Encoding` 头所使用的标识符
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpEncoding::Gzip => write!(f, "gzip"),
            HttpEncoding::Deflate => write!(f, "deflate"),
            HttpEncoding::Br => write!(f, "br"),
        }
    }
}

/// 根据资源名的扩展名推测内容类型。
///
/// 没有扩展名或扩展名未登记时返回 `None`，由调用方决定兜底类型。
pub fn guess_content_type(name: &str) -> Option<&'static str> {
    let (_, extension) = name.rsplit_once('.')?;
    MIME_TYPES
        .get(extension.to_ascii_lowercase().as_str())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("index.html"), Some("text/html;charset=utf-8"));
        assert_eq!(guess_content_type("style.CSS"), Some("text/css;charset=utf-8"));
        assert_eq!(guess_content_type("archive.tar.gz"), Some("application/gzip"));
        assert_eq!(guess_content_type("photo.jpg"), Some("image/jpeg"));
    }

    #[test]
    fn test_guess_content_type_unknown() {
        assert_eq!(guess_content_type("README"), None);
        assert_eq!(guess_content_type("data.unknown_extension"), None);
        assert_eq!(guess_content_type(""), None);
    }

    #[test]
    fn test_version_protocol() {
        assert_eq!(HttpVersion::V1_0.protocol(), "HTTP/1.0");
        assert_eq!(HttpVersion::V1_1.protocol(), "HTTP/1.1");
        assert_eq!(HttpVersion::V1_1.to_string(), "1.1");
    }

    #[test]
    fn test_status_phrases() {
        assert_eq!(STATUS_CODES.get(&404), Some(&"Not Found"));
        assert_eq!(STATUS_CODES.get(&405), Some(&"Method Not Allowed"));
        assert_eq!(STATUS_CODES.get(&401), Some(&"Unauthorized"));
    }
}
