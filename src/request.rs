// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求处理模块
//!
//! 负责将 TCP 流中读取的原始字节解析为 `Request`，并为处理器树准备好路由所需的上下文：
//! 1. 请求行（Request-Line）的解析（方法、路径、版本）。
//! 2. 常用 HTTP 标头（Headers）的提取。
//! 3. 内容协商（Content Negotiation）相关的编码解析。
//! 4. 去掉查询字符串后，以请求路径建立 [`RoutingTarget`]。
//!
//! 请求同时携带服务器的根处理器，所有树遍历都以它为终点，不依赖任何全局状态。

use std::sync::Arc;

use log::error;

use crate::{
    exception::Exception,
    handler::Handler,
    param::*,
    path::WebPath,
    routing::RoutingTarget,
};

/// 一个完整的 HTTP 请求头，加上路由上下文。
///
/// 该结构体不包含请求体（Body），主要用于路由分发和内容协商。
#[derive(Debug, Clone)]
pub struct Request {
    /// 全局请求 ID，用于在多任务环境下追踪日志
    id: u128,
    /// HTTP 请求方法（GET, POST 等）
    method: HttpRequestMethod,
    /// 请求的资源路径（包含查询字符串）
    path: String,
    /// HTTP 协议版本
    version: HttpVersion,
    /// 客户端标识字符串
    user_agent: String,
    /// 客户端支持的压缩编码列表（按解析顺序排列）
    accept_encoding: Vec<HttpEncoding>,
    /// 客户端接受的内容类型（MIME）
    accept: Option<String>,
    /// 尚未被处理器树消费的路径段
    target: RoutingTarget,
    /// 服务器的根处理器
    root: Arc<dyn Handler>,
}

impl Request {
    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 逻辑步骤
    /// 1. 验证编码：确保请求数据是合法的 UTF-8 字符串。
    /// 2. 解析请求行：提取方法、路径和协议版本（HTTP/1.0 与 HTTP/1.1）。
    /// 3. 迭代解析标头：识别 `User-Agent`, `Accept`, `Accept-Encoding`。
    /// 4. 建立路由游标：路径中 `?` 与 `#` 之后的部分不参与路由。
    ///
    /// # 错误处理
    /// 如果请求格式不符合 HTTP 规范或使用了不支持的方法/版本，将返回相应的 `Exception`。
    pub fn try_from(buffer: &[u8], id: u128, root: Arc<dyn Handler>) -> Result<Self, Exception> {
        // 1. 将字节流转换为字符串，失败则判定为非法的 HTTP 请求
        let request_string = match std::str::from_utf8(buffer) {
            Ok(string) => string,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let request_lines: Vec<&str> = request_string.split(CRLF).collect();

        // 2. 解析请求行 (e.g., "GET /index.html HTTP/1.1")
        let first_line_parts: Vec<&str> = request_lines[0].split(' ').collect();

        if first_line_parts.len() < 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_lines[0]);
            return Err(Exception::UnSupportedRequestMethod);
        }

        // 解析方法名
        let method_str = first_line_parts[0].to_uppercase();
        let method = match method_str.as_str() {
            "GET" => HttpRequestMethod::Get,
            "HEAD" => HttpRequestMethod::Head,
            "OPTIONS" => HttpRequestMethod::Options,
            "POST" => HttpRequestMethod::Post,
            _ => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, &method_str);
                return Err(Exception::UnSupportedRequestMethod);
            }
        };

        // 解析协议版本
        let version_str = first_line_parts[first_line_parts.len() - 1].to_uppercase();
        let version = match version_str.as_str() {
            "HTTP/1.0" => HttpVersion::V1_0,
            "HTTP/1.1" => HttpVersion::V1_1,
            _ => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, &version_str);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        // 解析路径（考虑到路径中可能包含空格的情况，虽然不规范但通过 join 尝试恢复）
        let path = if first_line_parts.len() == 3 {
            first_line_parts[1].to_string()
        } else {
            first_line_parts[1..first_line_parts.len() - 1].join(" ")
        };

        // 3. 迭代各行解析 Headers
        let mut user_agent = String::new();
        let mut accept_encoding = vec![];
        let mut accept = None;
        for line in request_lines.iter().skip(1) {
            if line.is_empty() {
                break;
            }
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match name.trim().to_lowercase().as_str() {
                "user-agent" => user_agent = value.to_string(),
                "accept" => accept = Some(value.to_string()),
                // 这里的逻辑比较简单，只要包含关键词即视为支持
                "accept-encoding" => {
                    if value.contains("gzip") {
                        accept_encoding.push(HttpEncoding::Gzip);
                    }
                    if value.contains("deflate") {
                        accept_encoding.push(HttpEncoding::Deflate);
                    }
                    if value.contains("br") {
                        accept_encoding.push(HttpEncoding::Br);
                    }
                }
                _ => {}
            }
        }

        // 4. 建立路由游标
        let route = path.split(['?', '#']).next().unwrap_or_default();
        if !route.starts_with('/') && route != "*" {
            error!("[ID{}]请求路径不是绝对路径：{}", id, route);
            return Err(Exception::InvalidPath);
        }
        let target = RoutingTarget::new(WebPath::parse(route));

        Ok(Self {
            id,
            method,
            path,
            version,
            user_agent,
            accept_encoding,
            accept,
            target,
            root,
        })
    }
}

// --- Getter 访问器实现 ---

impl Request {
    pub fn id(&self) -> u128 {
        self.id
    }

    /// 获取 HTTP 协议版本
    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// 获取请求路径（含查询参数）
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 获取请求方法
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    /// 获取用户代理字符串
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// 获取客户端支持的压缩算法列表
    pub fn accept_encoding(&self) -> &[HttpEncoding] {
        &self.accept_encoding
    }

    /// 获取客户端接受的文件 MIME 类型
    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    /// 客户端是否要求 JSON 格式的内容
    pub fn wants_json(&self) -> bool {
        self.accept
            .as_deref()
            .map_or(false, |accept| accept.contains("application/json"))
    }

    pub fn target(&self) -> &RoutingTarget {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut RoutingTarget {
        &mut self.target
    }

    pub fn root(&self) -> &Arc<dyn Handler> {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;

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

    fn parse(raw: &str) -> Result<Request, Exception> {
        Request::try_from(raw.as_bytes(), 0, Arc::new(Root))
    }

    /// 验证常规 GET 请求的解析，包括 Path 和 Headers
    #[test]
    fn test_parse_get_request() {
        let request = parse("GET / HTTP/1.1\r\nHost: localhost:7878\r\nUser-Agent: Test-Browser\r\nAccept-Encoding: gzip, deflate, br\r\n\r\n").unwrap();

        assert_eq!(request.method(), HttpRequestMethod::Get);
        assert_eq!(request.path(), "/");
        assert_eq!(request.user_agent(), "Test-Browser");
        assert!(request.accept_encoding().contains(&HttpEncoding::Gzip));
        assert!(request.accept_encoding().contains(&HttpEncoding::Deflate));
        assert!(request.accept_encoding().contains(&HttpEncoding::Br));
        assert!(request.target().ended());
    }

    /// 验证 HEAD 请求的解析
    #[test]
    fn test_parse_head_request() {
        let request = parse("HEAD /index.html HTTP/1.1\r\nHost: localhost:7878\r\n\r\n").unwrap();

        assert_eq!(request.method(), HttpRequestMethod::Head);
        assert_eq!(request.path(), "/index.html");
        assert_eq!(request.target().current().map(|p| p.value()), Some("index.html"));
    }

    /// 验证 OPTIONS 请求（常用于 CORS 预检）
    #[test]
    fn test_parse_options_request() {
        let request = parse("OPTIONS * HTTP/1.1\r\nHost: localhost:7878\r\n\r\n").unwrap();

        assert_eq!(request.method(), HttpRequestMethod::Options);
        assert_eq!(request.path(), "*");
    }

    /// 验证 POST 请求的基本行解析（目前暂不处理 Body 负载）
    #[test]
    fn test_parse_post_request() {
        let request =
            parse("POST /login/ HTTP/1.1\r\nHost: localhost:7878\r\nContent-Length: 10\r\n\r\ntest=value").unwrap();

        assert_eq!(request.method(), HttpRequestMethod::Post);
        assert_eq!(request.target().path().to_string(), "/login/");
    }

    #[test]
    fn test_http_1_0_accepted() {
        let request = parse("GET /a HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(request.version(), HttpVersion::V1_0);
    }

    /// 确保不支持的 HTTP 方法（如 DELETE）会返回错误
    #[test]
    fn test_unsupported_method() {
        let result = parse("DELETE /resource HTTP/1.1\r\nHost: localhost:7878\r\n\r\n");
        assert!(matches!(result, Err(Exception::UnSupportedRequestMethod)));
    }

    /// 确保不支持的版本（如 HTTP/2.0）被正确拒绝
    #[test]
    fn test_unsupported_http_version() {
        let result = parse("GET / HTTP/2.0\r\nHost: localhost:7878\r\n\r\n");
        assert!(matches!(result, Err(Exception::UnsupportedHttpVersion)));
    }

    /// 验证 UTF-8 编码检查
    #[test]
    fn test_invalid_utf8() {
        let result = Request::try_from(&[0xFF, 0xFE, 0xFD], 0, Arc::new(Root));
        assert!(matches!(result, Err(Exception::RequestIsNotUtf8)));
    }

    #[test]
    fn test_relative_request_path_rejected() {
        let result = parse("GET index.html HTTP/1.1\r\n\r\n");
        assert!(matches!(result, Err(Exception::InvalidPath)));
    }

    /// 验证 Header 字段名是否大小写不敏感
    #[test]
    fn test_case_insensitive_headers() {
        let request = parse("GET / HTTP/1.1\r\nhost: localhost:7878\r\nuser-agent: Test\r\naccept-encoding: gzip\r\n\r\n").unwrap();

        assert_eq!(request.user_agent(), "Test");
        assert!(request.accept_encoding().contains(&HttpEncoding::Gzip));
        assert!(!request.accept_encoding().contains(&HttpEncoding::Br));
    }

    /// 测试缺失编码标头时，解析列表应为空
    #[test]
    fn test_no_encoding_header() {
        let request = parse("GET / HTTP/1.1\r\nHost: localhost:7878\r\n\r\n").unwrap();
        assert!(request.accept_encoding().is_empty());
    }

    #[test]
    fn test_accept_json() {
        let request = parse("GET /files/ HTTP/1.1\r\nAccept: application/json\r\n\r\n").unwrap();
        assert!(request.wants_json());
        assert_eq!(request.accept(), Some("application/json"));
    }

    /// 查询字符串保留在原始路径中，但不参与路由
    #[test]
    fn test_path_with_query_string() {
        let request = parse("GET /page/?id=123&name=test HTTP/1.1\r\nHost: localhost:7878\r\n\r\n").unwrap();

        assert_eq!(request.path(), "/page/?id=123&name=test");
        assert_eq!(request.target().path().to_string(), "/page/");
        assert!(request.target().path().trailing_slash());
    }

    #[test]
    fn test_percent_encoded_target() {
        let request = parse("GET /my%20files/a.txt HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(request.target().current().map(|p| p.value()), Some("my files"));
    }

    /// 验证请求方法的小写兼容性处理
    #[test]
    fn test_lowercase_method() {
        let request = parse("get / HTTP/1.1\r\nHost: localhost:7878\r\n\r\n").unwrap();
        assert_eq!(request.method(), HttpRequestMethod::Get);
    }
}
