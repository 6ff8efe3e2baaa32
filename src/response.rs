// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 响应
//!
//! 处理器以构建器的方式组装 [`Response`]：状态码、内容、附加标头。
//! 响应在写回连接之前经过 [`Response::finalize`]：回显请求的协议版本、
//! 按 `Accept-Encoding` 压缩内容，HEAD 请求只保留标头。

use brotli::enc::{self, backward_references::BrotliEncoderParams};
use bytes::Bytes;
use chrono::prelude::*;
use flate2::{
    write::{DeflateEncoder, GzEncoder},
    Compression,
};
use log::{debug, error, warn};

use std::io::{self, Write};

use crate::{param::*, request::Request, util::HtmlBuilder};

#[derive(Debug, Clone)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    information: String,
    content_type: Option<String>,
    content_length: u64,
    date: DateTime<Utc>,
    content_encoding: Option<HttpEncoding>,
    server_name: String,
    allow: Option<Vec<HttpRequestMethod>>,
    headers: Vec<(String, String)>,
    content: Option<Bytes>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            information: "OK".to_string(),
            content_type: None,
            content_length: 0,
            date: Utc::now(),
            content_encoding: None,
            server_name: SERVER_NAME.to_string(),
            allow: None,
            headers: Vec::new(),
            content: None,
        }
    }

    /// 不经过处理器树、直接由状态码生成的页面。
    ///
    /// 用于请求无法解析，或者树本身配置有误、无法再渲染错误页面的情况。
    pub fn from_status_code(code: u16, note: Option<&str>) -> Self {
        let html = HtmlBuilder::from_status_code(code, note).build();
        Self::new().status(code).html(html)
    }

    /// 永久重定向
    pub fn redirect(location: &str) -> Self {
        Self::new().status(301).header("Location", location)
    }

    pub fn status(mut self, code: u16) -> Self {
        self.status_code = code;
        self.information = match STATUS_CODES.get(&code) {
            Some(&info) => info.to_string(),
            None => {
                warn!("未登记的状态码：{}", code);
                "Unknown Status".to_string()
            }
        };
        self
    }

    pub fn content(mut self, content: impl Into<Bytes>, content_type: &str) -> Self {
        let content = content.into();
        self.content_length = content.len() as u64;
        self.content = Some(content);
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn html(self, html: String) -> Self {
        self.content(html, HTML_CONTENT_TYPE)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn allow(mut self, methods: &[HttpRequestMethod]) -> Self {
        self.allow = Some(methods.to_vec());
        self
    }

    /// 根据请求完成响应：协议版本、日期、压缩与 HEAD 处理。
    pub fn finalize(mut self, request: &Request) -> Self {
        let id = request.id();
        self.version = request.version();
        self.date = Utc::now();

        if request.method() == HttpRequestMethod::Head {
            debug!("[ID{}]请求方法为HEAD，丢弃响应体", id);
            self.content = None;
            self.content_encoding = None;
            return self;
        }

        let Some(content) = self.content.take() else {
            return self;
        };

        let skip_compression = self
            .content_type
            .as_deref()
            .map_or(true, should_skip_compression);
        self.content_encoding = if skip_compression || content.is_empty() {
            None
        } else {
            decide_encoding(request.accept_encoding())
        };

        match self.content_encoding {
            Some(HttpEncoding::Gzip) => debug!("[ID{}]使用Gzip压缩编码", id),
            Some(HttpEncoding::Br) => debug!("[ID{}]使用Brotli压缩编码", id),
            Some(HttpEncoding::Deflate) => debug!("[ID{}]使用Deflate压缩编码", id),
            None => debug!("[ID{}]不进行压缩", id),
        };

        let body = match self.content_encoding {
            None => content,
            Some(_) => match compress(content.to_vec(), self.content_encoding) {
                Ok(compressed) => Bytes::from(compressed),
                Err(e) => {
                    error!("[ID{}]压缩失败: {}，返回未压缩内容", id, e);
                    self.content_encoding = None;
                    content
                }
            },
        };

        self.content_length = body.len() as u64;
        self.content = Some(body);
        self
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let mut header = format!(
            "{} {} {}{}",
            self.version.protocol(),
            self.status_code,
            self.information,
            CRLF
        );
        if let Some(t) = &self.content_type {
            header.push_str(&["Content-Type: ", t, CRLF].concat());
        }
        if let Some(e) = self.content_encoding {
            header.push_str(&format!("Content-encoding: {}{}", e, CRLF));
        }
        header.push_str(&format!("Content-Length: {}{}", self.content_length, CRLF));
        header.push_str(&["Date: ", &format_date(&self.date), CRLF].concat());
        header.push_str(&["Server: ", &self.server_name, CRLF].concat());
        if let Some(a) = &self.allow {
            let allow_str = a
                .iter()
                .map(|method| method.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            header.push_str(&["Allow: ", &allow_str, CRLF].concat());
        }
        for (name, value) in &self.headers {
            header.push_str(&[name.as_str(), ": ", value.as_str(), CRLF].concat());
        }
        header.push_str(CRLF);

        [
            header.as_bytes(),
            match &self.content {
                Some(c) => &c[..],
                None => &[],
            },
        ]
        .concat()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }

    pub fn content_encoding(&self) -> Option<HttpEncoding> {
        self.content_encoding
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc2822()
}

fn compress(data: Vec<u8>, mode: Option<HttpEncoding>) -> io::Result<Vec<u8>> {
    let original_size = data.len();
    let result = match mode {
        Some(HttpEncoding::Gzip) => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            encoder.finish()
        }
        Some(HttpEncoding::Deflate) => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            encoder.finish()
        }
        Some(HttpEncoding::Br) => {
            let params = BrotliEncoderParams::default();
            let mut output = Vec::new();
            enc::BrotliCompress(&mut io::Cursor::new(data), &mut output, &params)?;
            Ok(output)
        }
        None => Ok(data),
    };

    if let Ok(ref compressed) = result {
        let compressed_size = compressed.len();
        let ratio = if original_size > 0 {
            ((original_size as i64 - compressed_size as i64) as f64 / original_size as f64) * 100.0
        } else {
            0.0
        };
        debug!(
            "压缩完成: {:?}, 原始大小: {} bytes, 压缩后: {} bytes, 压缩率: {:.1}%",
            mode, original_size, compressed_size, ratio
        );
    }

    result
}

fn should_skip_compression(mime_type: &str) -> bool {
    let skip_types = [
        "image/jpeg",
        "image/jpg",
        "image/png",
        "image/gif",
        "image/webp",
        "image/bmp",
        "image/x-icon",
        "video/",
        "audio/",
        "application/zip",
        "application/x-rar",
        "application/x-7z-compressed",
        "application/gzip",
        "application/x-gzip",
        "font/woff",
        "font/woff2",
        "application/vnd.ms-fontobject",
    ];

    skip_types
        .iter()
        .any(|&skip_type| mime_type.starts_with(skip_type))
}

fn decide_encoding(accept_encoding: &[HttpEncoding]) -> Option<HttpEncoding> {
    if accept_encoding.contains(&HttpEncoding::Gzip) {
        Some(HttpEncoding::Gzip)
    } else if accept_encoding.contains(&HttpEncoding::Deflate) {
        Some(HttpEncoding::Deflate)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{exception::Exception, handler::Handler};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Root;

    impl Handler for Root {
        fn parent(&self) -> Option<Arc<dyn Handler>> {
            None
        }

        fn handle(self: Arc<Self>, _request: &mut Request) -> Result<Option<Response>, Exception> {
            Ok(None)
        }
    }

    fn request(raw: &str) -> Request {
        Request::try_from(raw.as_bytes(), 1, Arc::new(Root)).unwrap()
    }

    fn text(response: &Response) -> String {
        String::from_utf8_lossy(&response.as_bytes()).into_owned()
    }

    #[test]
    fn test_format_date() {
        let formatted = format_date(&Utc::now());
        assert!(formatted.contains("+0000") || formatted.contains("GMT"));
    }

    #[test]
    fn test_compress_none() {
        let data = b"Hello, World!".to_vec();
        assert_eq!(compress(data.clone(), None).unwrap(), data);
    }

    #[test]
    fn test_compress_gzip() {
        let data = b"Hello, World! This is a test string for compression.".to_vec();
        let result = compress(data.clone(), Some(HttpEncoding::Gzip)).unwrap();

        assert_ne!(result, data);
        assert_eq!(&result[0..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_compress_large_data() {
        let data = vec![b'A'; 10000];
        for mode in [HttpEncoding::Gzip, HttpEncoding::Deflate, HttpEncoding::Br] {
            assert!(compress(data.clone(), Some(mode)).unwrap().len() < data.len());
        }
    }

    #[test]
    fn test_decide_encoding() {
        assert_eq!(
            decide_encoding(&[HttpEncoding::Br, HttpEncoding::Gzip]),
            Some(HttpEncoding::Gzip)
        );
        assert_eq!(decide_encoding(&[HttpEncoding::Deflate]), Some(HttpEncoding::Deflate));
        assert_eq!(decide_encoding(&[]), None);
    }

    #[test]
    fn test_should_skip_compression() {
        assert!(should_skip_compression("image/png"));
        assert!(should_skip_compression("video/mp4"));
        assert!(!should_skip_compression("text/html;charset=utf-8"));
    }

    #[test]
    fn test_response_as_bytes_basic() {
        let response = text(&Response::new());

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("Content-Length: 0"));
        assert!(response.contains("Server: shaneyale-webtree"));
        assert!(response.contains("Date: "));
        assert!(response.ends_with("\r\n\r\n"));
        assert!(!response.contains("Allow:"));
    }

    #[test]
    fn test_response_with_content() {
        let response = text(&Response::new().content("Hello", "text/plain"));

        assert!(response.contains("Content-Type: text/plain"));
        assert!(response.contains("Content-Length: 5"));
        assert!(response.ends_with("Hello"));
    }

    #[test]
    fn test_response_status_codes() {
        for (code, expected_info) in [
            (200, "OK"),
            (301, "Moved Permanently"),
            (401, "Unauthorized"),
            (404, "Not Found"),
            (405, "Method Not Allowed"),
            (500, "Internal Server Error"),
        ] {
            let response = Response::new().status(code);
            assert_eq!(response.status_code(), code);
            assert_eq!(response.information(), expected_info);
        }
    }

    #[test]
    fn test_unknown_status_code_does_not_panic() {
        let response = Response::new().status(599);
        assert_eq!(response.information(), "Unknown Status");
    }

    #[test]
    fn test_allow_and_extra_headers() {
        let response = Response::new()
            .allow(&ALLOWED_METHODS)
            .header("Location", "/files/");
        let bytes = text(&response);

        assert!(bytes.contains("Allow: GET, HEAD, OPTIONS"));
        assert!(bytes.contains("Location: /files/\r\n"));
        assert_eq!(response.header_value("location"), Some("/files/"));
    }

    #[test]
    fn test_finalize_compresses_text() {
        let request = request("GET / HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n");
        let response = Response::new()
            .html("<p>hello hello hello</p>".to_string())
            .finalize(&request);

        assert_eq!(response.content_encoding(), Some(HttpEncoding::Gzip));
        assert_eq!(response.content_length(), response.body().unwrap().len() as u64);
        assert!(text(&response).contains("Content-encoding: gzip"));
    }

    #[test]
    fn test_finalize_skips_images() {
        let request = request("GET /a.png HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n");
        let response = Response::new()
            .content(vec![0u8; 16], "image/png")
            .finalize(&request);

        assert_eq!(response.content_encoding(), None);
        assert_eq!(response.content_length(), 16);
    }

    #[test]
    fn test_finalize_echoes_version() {
        let request = request("GET / HTTP/1.0\r\n\r\n");
        let response = Response::new().finalize(&request);
        assert!(text(&response).starts_with("HTTP/1.0 200 OK"));
    }

    #[test]
    fn test_head_keeps_headers_drops_body() {
        let request = request("HEAD /index.html HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n");
        let response = Response::new()
            .html("<!DOCTYPE html><p>body</p>".to_string())
            .finalize(&request);
        let bytes = text(&response);

        assert!(bytes.starts_with("HTTP/1.1 200 OK"));
        assert!(bytes.contains("Content-Length: 26"));
        assert!(!bytes.contains("<!DOCTYPE html>"));
        assert!(!bytes.contains("Content-encoding"));
    }

    #[test]
    fn test_from_status_code() {
        let response = Response::from_status_code(500, None);
        assert_eq!(response.status_code(), 500);
        assert_eq!(response.content_type(), Some(HTML_CONTENT_TYPE));
        assert!(text(&response).contains("Internal Server Error"));
    }

    #[test]
    fn test_redirect() {
        let response = Response::redirect("/files/");
        assert_eq!(response.status_code(), 301);
        assert_eq!(response.header_value("Location"), Some("/files/"));
    }
}
